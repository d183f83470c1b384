use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{AddressType, ClientTag};

/// One client row. Rows of the same person share `client_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub client_id: i64,
    pub company_id: i64,
    pub lead_id: i64,
    pub prop_id: Option<i64>,
    pub name: String,
    pub mobile: String,
    pub pan: String,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub tag: ClientTag,
    pub active: bool,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantForm {
    pub name: String,
    pub mobile: String,
    pub pan: String,
    pub email: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressForm {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientAddress {
    pub id: i64,
    pub client_row_id: i64,
    pub client_id: i64,
    pub address_type: AddressType,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

/// Outcome of client creation with PAN deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCreated {
    pub row_id: i64,
    pub client_id: i64,
    pub tag: ClientTag,
}
