//! Shared fixtures for unit tests: an in-memory database seeded with one
//! company, branch, user (mapped to the branch) and product.

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::db::repository::{branch, lead};
use crate::db::sqlite::open_memory_database;
use crate::models::*;

pub struct Fixture {
    pub conn: Connection,
    pub company_id: i64,
    pub company_abbr: String,
    pub branch_id: String,
    pub user_id: i64,
    pub product_id: i64,
}

impl Fixture {
    pub fn new() -> Self {
        let conn = open_memory_database().expect("in-memory DB");
        conn.execute(
            "INSERT INTO companies (name, abbreviation) VALUES ('Acme Credit', 'ABC')",
            [],
        )
        .expect("seed company");
        let company_id = conn.last_insert_rowid();
        let branch_id =
            branch::create_branch(&conn, company_id, "ABC", "Head Office").expect("seed branch");

        let mut fx = Self {
            conn,
            company_id,
            company_abbr: "ABC".into(),
            branch_id,
            user_id: 0,
            product_id: 0,
        };
        fx.user_id = fx.seed_user("Ravi Kumar");
        fx.conn
            .execute(
                "INSERT INTO products (company_id, name) VALUES (?1, 'Two Wheeler Loan')",
                params![company_id],
            )
            .expect("seed product");
        fx.product_id = fx.conn.last_insert_rowid();
        fx
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.company_id, self.company_abbr.clone())
    }

    /// A user mapped to the fixture branch.
    pub fn seed_user(&self, name: &str) -> i64 {
        self.conn
            .execute(
                "INSERT INTO users (company_id, name) VALUES (?1, ?2)",
                params![self.company_id, name],
            )
            .expect("seed user");
        let user_id = self.conn.last_insert_rowid();
        branch::assign_user_branch(&self.conn, user_id, &self.branch_id).expect("map user");
        user_id
    }

    pub fn seed_company(&self, name: &str, abbr: &str) -> i64 {
        self.conn
            .execute(
                "INSERT INTO companies (name, abbreviation) VALUES (?1, ?2)",
                params![name, abbr],
            )
            .expect("seed company");
        self.conn.last_insert_rowid()
    }

    /// A user of a second company, for tenancy checks.
    pub fn outsider(&self) -> Actor {
        let company_id = self.seed_company("Other Finance", "OTF");
        self.conn
            .execute(
                "INSERT INTO users (company_id, name) VALUES (?1, 'Ravi Menon')",
                params![company_id],
            )
            .expect("seed outsider");
        Actor::new(self.conn.last_insert_rowid(), company_id, "OTF")
    }

    pub fn count(&self, table: &str) -> i64 {
        self.conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .expect("count rows")
    }

    pub fn proposal_form(&self, pan: &str) -> ProposalForm {
        ProposalForm {
            branch_id: self.branch_id.clone(),
            product_id: Some(self.product_id),
            amount: 150_000.0,
            applicant: applicant(pan),
            address: address(),
        }
    }
}

/// Insert a bare lead row (no process record).
pub fn seed_lead(fx: &Fixture, pan: &str) -> i64 {
    let new_lead = NewLead {
        branch_id: fx.branch_id.clone(),
        product_id: Some(fx.product_id),
        name: "Asha Rao".into(),
        mobile: "9876543210".into(),
        pan: pan.into(),
        amount: 150_000.0,
    };
    lead::insert_lead(&fx.conn, &new_lead, fx.company_id, fx.user_id, &Utc::now()).expect("seed lead")
}

pub fn applicant(pan: &str) -> ApplicantForm {
    ApplicantForm {
        name: "Asha Rao".into(),
        mobile: "9876543210".into(),
        pan: pan.into(),
        email: Some("asha@example.com".into()),
        date_of_birth: chrono::NaiveDate::from_ymd_opt(1990, 4, 12),
    }
}

pub fn address() -> AddressForm {
    AddressForm {
        line1: "14 MG Road".into(),
        line2: None,
        city: "Bengaluru".into(),
        state: "Karnataka".into(),
        pincode: "560001".into(),
    }
}

/// Make every write to `table` fail with `RAISE(ABORT)`.
pub fn fail_on(conn: &Connection, event: &str, table: &str) {
    conn.execute_batch(&format!(
        "CREATE TRIGGER fail_{event}_{table} BEFORE {event} ON {table}
         BEGIN SELECT RAISE(ABORT, 'injected failure'); END;"
    ))
    .expect("create failure trigger");
}
