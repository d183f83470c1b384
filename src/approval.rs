//! Approval decisions.
//!
//! A decision sets the proposal status and marks the three stages an
//! approval closes (`imd_process`, `sales_process`, `approval_process`).
//! All four writes share one transaction. Only a proposal still pending
//! approval, and owned by the actor's company, can be decided.

use chrono::Utc;
use rusqlite::Connection;
use thiserror::Error;

use crate::applications;
use crate::db::repository::{client, proposal};
use crate::db::{in_transaction, DatabaseError};
use crate::models::enums::{ApprovalDecision, Stage};
use crate::models::*;
use crate::process::{self, ProcessError};

/// Stages an approval decision marks done, in write order.
pub const APPROVAL_STAGES: [Stage; 3] = [Stage::ImdProcess, Stage::SalesProcess, Stage::ApprovalProcess];

#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("Proposal {0} not found")]
    ProposalNotFound(i64),

    #[error("Proposal {prop_id} is not pending approval (status {status})")]
    AlreadyDecided { prop_id: i64, status: i64 },

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for ApprovalError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.into())
    }
}

impl ApprovalDecision {
    /// Proposal status a decision moves to.
    pub fn status(self) -> i64 {
        match self {
            Self::Approve => STATUS_APPROVED,
            Self::Reject => STATUS_REJECTED,
        }
    }
}

/// Outcome of a recorded decision.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ApprovalOutcome {
    pub prop_id: i64,
    pub decision: ApprovalDecision,
    pub status: i64,
}

pub fn list_pending_approvals(conn: &Connection, user_id: i64) -> Result<Vec<ApplicationRow>, DatabaseError> {
    applications::list_pending(conn, user_id)
}

pub fn get_approval_detail(conn: &Connection, prop_id: i64) -> Result<ApprovalDetail, ApprovalError> {
    let proposal = proposal::get_proposal(conn, prop_id)?.ok_or(ApprovalError::ProposalNotFound(prop_id))?;
    let client = client::get_client_for_proposal(conn, prop_id)?;
    let addresses = match &client {
        Some(c) => client::get_addresses(conn, c.id)?,
        None => Vec::new(),
    };
    let process_log = process::get_process_log(conn, &ApplicationKeys::app(proposal.app_id))?;
    Ok(ApprovalDetail {
        proposal,
        client,
        addresses,
        process_log,
    })
}

/// Record an approve/reject decision on `prop_id`.
pub fn process_approval(
    conn: &Connection,
    prop_id: i64,
    decision: ApprovalDecision,
    actor: &Actor,
) -> Result<ApprovalOutcome, ApprovalError> {
    let status = decision.status();

    in_transaction(conn, |tx| -> Result<(), ApprovalError> {
        let current = proposal::get_company_proposal(tx, prop_id, actor.company_id)?
            .ok_or(ApprovalError::ProposalNotFound(prop_id))?;
        if current.status != STATUS_PENDING_APPROVAL {
            return Err(ApprovalError::AlreadyDecided {
                prop_id,
                status: current.status,
            });
        }
        if proposal::update_status(tx, prop_id, status, &Utc::now())? == 0 {
            return Err(ApprovalError::ProposalNotFound(prop_id));
        }
        let keys = ApplicationKeys::proposal(prop_id);
        for stage in APPROVAL_STAGES {
            process::update_process(tx, stage, 1, &keys, actor)?;
        }
        Ok(())
    })
    .inspect_err(|e| tracing::warn!(prop_id, %decision, error = %e, "Approval not recorded"))?;

    tracing::info!(prop_id, %decision, status, user_id = actor.user_id, "Approval recorded");
    Ok(ApprovalOutcome {
        prop_id,
        decision,
        status,
    })
}
