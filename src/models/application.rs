use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The acting user, threaded explicitly into every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: i64,
    pub company_id: i64,
    pub company_abbr: String,
}

impl Actor {
    pub fn new(user_id: i64, company_id: i64, company_abbr: impl Into<String>) -> Self {
        Self {
            user_id,
            company_id,
            company_abbr: company_abbr.into(),
        }
    }
}

/// One loan application. `app_id` is fixed at lead capture; the business
/// identifiers are filled in as the application advances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub app_id: Uuid,
    pub company_id: i64,
    pub lead_id: i64,
    pub prop_id: Option<i64>,
    pub loan_id: Option<i64>,
    pub lan: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Application {
    pub fn keys(&self) -> ApplicationKeys {
        ApplicationKeys {
            app_id: Some(self.app_id),
            lead_id: Some(self.lead_id),
            prop_id: self.prop_id,
            loan_id: self.loan_id,
            lan: self.lan.clone(),
        }
    }
}

/// Any combination of identifiers addressing an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationKeys {
    pub app_id: Option<Uuid>,
    pub lead_id: Option<i64>,
    pub prop_id: Option<i64>,
    pub loan_id: Option<i64>,
    pub lan: Option<String>,
}

impl ApplicationKeys {
    pub fn app(app_id: Uuid) -> Self {
        Self {
            app_id: Some(app_id),
            ..Self::default()
        }
    }

    pub fn lead(lead_id: i64) -> Self {
        Self {
            lead_id: Some(lead_id),
            ..Self::default()
        }
    }

    pub fn proposal(prop_id: i64) -> Self {
        Self {
            prop_id: Some(prop_id),
            ..Self::default()
        }
    }

    pub fn with_prop(mut self, prop_id: i64) -> Self {
        self.prop_id = Some(prop_id);
        self
    }

    pub fn with_loan(mut self, loan_id: i64) -> Self {
        self.loan_id = Some(loan_id);
        self
    }

    pub fn with_lan(mut self, lan: impl Into<String>) -> Self {
        self.lan = Some(lan.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.app_id.is_none()
            && self.lead_id.is_none()
            && self.prop_id.is_none()
            && self.loan_id.is_none()
            && self.lan.is_none()
    }
}

impl fmt::Display for ApplicationKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(id) = self.app_id {
            parts.push(format!("app_id={id}"));
        }
        if let Some(id) = self.lead_id {
            parts.push(format!("lead_id={id}"));
        }
        if let Some(id) = self.prop_id {
            parts.push(format!("prop_id={id}"));
        }
        if let Some(id) = self.loan_id {
            parts.push(format!("loan_id={id}"));
        }
        if let Some(lan) = &self.lan {
            parts.push(format!("lan={lan}"));
        }
        if parts.is_empty() {
            f.write_str("<no identifiers>")
        } else {
            f.write_str(&parts.join(", "))
        }
    }
}
