//! Loan booking: attaches `loan_id` and the loan account number (LAN) to
//! an approved application. Both steps are scoped to the actor's company.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::{application, proposal};
use crate::db::{in_transaction, DatabaseError};
use crate::models::enums::Stage;
use crate::models::*;
use crate::process::{self, ProcessError};

static LAN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9]{6,20}$").expect("LAN pattern"));

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Proposal {0} not found")]
    ProposalNotFound(i64),

    #[error("Proposal {prop_id} has status {status}; only approved proposals can be booked")]
    NotApproved { prop_id: i64, status: i64 },

    #[error("Application already booked as loan {0}")]
    AlreadyBooked(i64),

    #[error("Application {0} has no booked loan")]
    NotBooked(Uuid),

    #[error("'{0}' is not a valid loan account number")]
    InvalidLan(String),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for BookingError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.into())
    }
}

/// Record `loan_id` on the application of an approved proposal.
pub fn book_loan(conn: &Connection, prop_id: i64, loan_id: i64, actor: &Actor) -> Result<Application, BookingError> {
    in_transaction(conn, |tx| -> Result<Application, BookingError> {
        let proposal = proposal::get_company_proposal(tx, prop_id, actor.company_id)?
            .ok_or(BookingError::ProposalNotFound(prop_id))?;
        if proposal.status != STATUS_APPROVED {
            return Err(BookingError::NotApproved {
                prop_id,
                status: proposal.status,
            });
        }
        let app = application::get_application(tx, &proposal.app_id)?
            .ok_or_else(|| ProcessError::NotFound(ApplicationKeys::proposal(prop_id)))?;
        if let Some(existing) = app.loan_id {
            return Err(BookingError::AlreadyBooked(existing));
        }

        application::attach_loan(tx, &app.app_id, loan_id)?;
        tracing::info!(prop_id, loan_id, app_id = %app.app_id, user_id = actor.user_id, "Loan booked");
        Ok(Application {
            loan_id: Some(loan_id),
            ..app
        })
    })
}

/// Record the LAN on the addressed application, mark `disbursement_process`
/// done and move the proposal to disbursed.
///
/// The application must carry a booked loan and its proposal must still be
/// approved.
pub fn assign_lan(
    conn: &Connection,
    keys: &ApplicationKeys,
    lan: &str,
    actor: &Actor,
) -> Result<Application, BookingError> {
    let lan = lan.trim().to_ascii_uppercase();
    if !LAN_PATTERN.is_match(&lan) {
        return Err(BookingError::InvalidLan(lan));
    }

    in_transaction(conn, |tx| -> Result<Application, BookingError> {
        let app_id = process::resolve_company_application(tx, keys, actor.company_id)?;
        let app = application::get_application(tx, &app_id)?
            .ok_or_else(|| ProcessError::NotFound(keys.clone()))?;
        let prop_id = match (app.loan_id, app.prop_id) {
            (Some(_), Some(prop_id)) => prop_id,
            _ => return Err(BookingError::NotBooked(app_id)),
        };
        let proposal = proposal::get_proposal(tx, prop_id)?.ok_or(BookingError::ProposalNotFound(prop_id))?;
        if proposal.status != STATUS_APPROVED {
            return Err(BookingError::NotApproved {
                prop_id,
                status: proposal.status,
            });
        }

        application::attach_lan(tx, &app_id, &lan)?;
        process::update_process(tx, Stage::DisbursementProcess, 1, &ApplicationKeys::app(app_id), actor)?;
        if proposal::update_status(tx, prop_id, STATUS_DISBURSED, &Utc::now())? == 0 {
            return Err(BookingError::ProposalNotFound(prop_id));
        }

        tracing::info!(%app_id, lan = %lan, user_id = actor.user_id, "LAN assigned");
        Ok(Application {
            lan: Some(lan.clone()),
            ..app
        })
    })
}
