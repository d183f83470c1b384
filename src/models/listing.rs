use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::client::{Client, ClientAddress};
use super::process::{CurrentStage, ProcessLog};
use super::proposal::Proposal;

/// One row of an operator queue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicationRow {
    pub prop_id: i64,
    pub prop_no: String,
    pub app_id: Uuid,
    pub lead_id: i64,
    pub client_name: Option<String>,
    pub branch_id: String,
    pub branch_name: Option<String>,
    pub product_name: Option<String>,
    pub amount: f64,
    pub status: i64,
    pub status_label: Option<String>,
    pub handler_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub current_process: CurrentStage,
}

/// Everything an approver sees before deciding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApprovalDetail {
    pub proposal: Proposal,
    pub client: Option<Client>,
    pub addresses: Vec<ClientAddress>,
    pub process_log: ProcessLog,
}
