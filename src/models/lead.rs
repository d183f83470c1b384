use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub lead_id: i64,
    pub company_id: i64,
    pub branch_id: String,
    pub product_id: Option<i64>,
    pub name: String,
    pub mobile: String,
    pub pan: String,
    pub amount: f64,
    pub term: i64,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

/// Applicant fields captured for a new lead. Term starts at 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLead {
    pub branch_id: String,
    pub product_id: Option<i64>,
    pub name: String,
    pub mobile: String,
    pub pan: String,
    pub amount: f64,
}

/// Outcome of lead capture: the lead row and its application aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadCreated {
    pub lead_id: i64,
    pub app_id: Uuid,
}
