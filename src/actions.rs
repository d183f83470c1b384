//! Inbound boundary. Every action returns an [`ActionResult`] envelope;
//! errors never escape as `Err`.
//!
//! Each action takes the acting user explicitly. Transactions have already
//! committed or rolled back by the time an error is turned into an envelope.

use std::fmt::Display;

use rusqlite::Connection;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::models::enums::{ApprovalDecision, Queue};
use crate::models::*;
use crate::{applications, approval, booking, pipeline, process};

pub const NO_CASES_FOUND: &str = "No Cases Found!";
pub const NO_PROPOSALS_FOUND: &str = "No Proposals Found!";

/// `{ success, error, result }`. `result` serializes as `{}` on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(bound(serialize = "T: Serialize"))]
pub struct ActionResult<T> {
    pub success: bool,
    pub error: String,
    #[serde(serialize_with = "result_or_empty")]
    pub result: Option<T>,
}

impl<T> ActionResult<T> {
    pub fn ok(result: T) -> Self {
        Self {
            success: true,
            error: String::new(),
            result: Some(result),
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            result: None,
        }
    }

    fn from_result<E: Display>(action: &'static str, result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::ok(value),
            Err(e) => {
                tracing::warn!(action, error = %e, "Action failed");
                Self::fail(e.to_string())
            }
        }
    }
}

impl<T> ActionResult<Vec<T>> {
    /// An empty listing is a business failure carrying `message`.
    fn non_empty<E: Display>(action: &'static str, result: Result<Vec<T>, E>, message: &str) -> Self {
        match result {
            Ok(rows) if rows.is_empty() => Self::fail(message),
            other => Self::from_result(action, other),
        }
    }
}

fn result_or_empty<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(v) => v.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

// ═══════════════════════════════════════════
// Process store
// ═══════════════════════════════════════════

pub fn initialize_process(conn: &Connection, lead_id: i64, actor: &Actor) -> ActionResult<Uuid> {
    ActionResult::from_result("initialize_process", process::initialize_process(conn, lead_id, actor))
}

/// `stage` is the stage name as submitted, e.g. `"kyc_process"`.
pub fn update_process(
    conn: &Connection,
    stage: &str,
    value: i64,
    keys: &ApplicationKeys,
    actor: &Actor,
) -> ActionResult<StageTransition> {
    let result = process::parse_stage(stage).and_then(|stage| process::update_process(conn, stage, value, keys, actor));
    ActionResult::from_result("update_process", result)
}

pub fn get_process_log(conn: &Connection, keys: &ApplicationKeys) -> ActionResult<ProcessLog> {
    ActionResult::from_result("get_process_log", process::get_process_log(conn, keys))
}

// ═══════════════════════════════════════════
// Pipeline and listings
// ═══════════════════════════════════════════

pub fn create_proposal(conn: &Connection, form: &ProposalForm, actor: &Actor) -> ActionResult<ProposalCreated> {
    ActionResult::from_result("create_proposal", pipeline::create_proposal(conn, form, actor))
}

pub fn get_applications_list(conn: &Connection, actor: &Actor) -> ActionResult<Vec<ApplicationRow>> {
    ActionResult::non_empty(
        "get_applications_list",
        applications::get_applications_list(conn, actor.user_id),
        NO_CASES_FOUND,
    )
}

/// `queue` is the queue name, e.g. `"televerification"`.
pub fn get_queue(conn: &Connection, queue: &str, actor: &Actor) -> ActionResult<Vec<ApplicationRow>> {
    let result = queue
        .parse::<Queue>()
        .and_then(|queue| applications::get_queue(conn, actor.user_id, queue));
    ActionResult::non_empty("get_queue", result, NO_CASES_FOUND)
}

// ═══════════════════════════════════════════
// Approval and booking
// ═══════════════════════════════════════════

pub fn list_pending_approvals(conn: &Connection, actor: &Actor) -> ActionResult<Vec<ApplicationRow>> {
    ActionResult::non_empty(
        "list_pending_approvals",
        approval::list_pending_approvals(conn, actor.user_id),
        NO_PROPOSALS_FOUND,
    )
}

pub fn get_approval_detail(conn: &Connection, prop_id: i64) -> ActionResult<ApprovalDetail> {
    ActionResult::from_result("get_approval_detail", approval::get_approval_detail(conn, prop_id))
}

/// `decision` is `"approve"` or `"reject"`.
pub fn process_approval(
    conn: &Connection,
    prop_id: i64,
    decision: &str,
    actor: &Actor,
) -> ActionResult<approval::ApprovalOutcome> {
    let decision = match decision.trim().parse::<ApprovalDecision>() {
        Ok(decision) => decision,
        Err(e) => return ActionResult::from_result("process_approval", Err(e)),
    };
    ActionResult::from_result(
        "process_approval",
        approval::process_approval(conn, prop_id, decision, actor),
    )
}

pub fn book_loan(conn: &Connection, prop_id: i64, loan_id: i64, actor: &Actor) -> ActionResult<Application> {
    ActionResult::from_result("book_loan", booking::book_loan(conn, prop_id, loan_id, actor))
}

pub fn assign_lan(conn: &Connection, keys: &ApplicationKeys, lan: &str, actor: &Actor) -> ActionResult<Application> {
    ActionResult::from_result("assign_lan", booking::assign_lan(conn, keys, lan, actor))
}
