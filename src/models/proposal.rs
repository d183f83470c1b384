use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::client::{AddressForm, ApplicantForm};
use super::enums::ClientTag;

pub const STATUS_REJECTED: i64 = -5;
pub const STATUS_PENDING_APPROVAL: i64 = 5;
pub const STATUS_APPROVED: i64 = 10;
pub const STATUS_DISBURSED: i64 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub prop_id: i64,
    pub prop_no: String,
    pub app_id: Uuid,
    pub lead_id: i64,
    pub client_id: i64,
    pub branch_id: String,
    pub product_id: Option<i64>,
    pub amount: f64,
    pub status: i64,
    pub handler_id: Option<i64>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProposal {
    pub prop_no: String,
    pub app_id: Uuid,
    pub lead_id: i64,
    pub client_id: i64,
    pub branch_id: String,
    pub product_id: Option<i64>,
    pub amount: f64,
    pub created_by: i64,
}

/// Everything the proposal form submits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalForm {
    pub branch_id: String,
    pub product_id: Option<i64>,
    pub amount: f64,
    pub applicant: ApplicantForm,
    pub address: AddressForm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalCreated {
    pub app_id: Uuid,
    pub lead_id: i64,
    pub prop_id: i64,
    pub prop_no: String,
    pub client_id: i64,
    pub client_tag: ClientTag,
}
