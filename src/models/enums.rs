use std::fmt;

use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// Declaration order is pipeline order; `Ord` relies on it.
str_enum!(Stage {
    LeadProcess => "lead_process",
    ProposalProcess => "proposal_process",
    KycProcess => "kyc_process",
    ImdProcess => "imd_process",
    SalesProcess => "sales_process",
    ApprovalProcess => "approval_process",
    FiProcess => "fi_process",
    LegalProcess => "legal_process",
    TechnicalProcess => "technical_process",
    DisbursementProcess => "disbursement_process",
});

impl Stage {
    pub const ALL: [Stage; 10] = [
        Stage::LeadProcess,
        Stage::ProposalProcess,
        Stage::KycProcess,
        Stage::ImdProcess,
        Stage::SalesProcess,
        Stage::ApprovalProcess,
        Stage::FiProcess,
        Stage::LegalProcess,
        Stage::TechnicalProcess,
        Stage::DisbursementProcess,
    ];

    /// Specialist queue that owns applications parked at this stage.
    pub fn queue(self) -> Option<Queue> {
        match self {
            Stage::KycProcess => Some(Queue::Televerification),
            Stage::FiProcess => Some(Queue::FieldInvestigation),
            Stage::LegalProcess | Stage::TechnicalProcess => Some(Queue::Banking),
            Stage::DisbursementProcess => Some(Queue::Disbursement),
            _ => None,
        }
    }
}

str_enum!(Queue {
    Televerification => "televerification",
    FieldInvestigation => "field_investigation",
    Banking => "banking",
    Disbursement => "disbursement",
});

str_enum!(ClientTag {
    New => "NEW",
    Existing => "EXISTING",
});

str_enum!(AddressType {
    Permanent => "PERMANENT",
    Current => "CURRENT",
    Office => "OFFICE",
});

str_enum!(ApprovalDecision {
    Approve => "approve",
    Reject => "reject",
});
