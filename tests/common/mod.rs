//! On-disk desk shared by the integration tests: one company with a branch,
//! a user mapped to it and a product.

#![allow(dead_code)]

use std::time::Duration;

use rusqlite::{params, Connection};
use tempfile::TempDir;

use loandesk_lib::db::repository::branch;
use loandesk_lib::db::Database;
use loandesk_lib::models::*;

pub struct Desk {
    _dir: TempDir,
    pub db: Database,
    pub actor: Actor,
    pub branch_id: String,
    pub product_id: i64,
}

pub fn desk() -> Desk {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path().join("desk.db"), Duration::from_millis(500)).unwrap();
    let conn = db.connect().unwrap();

    conn.execute(
        "INSERT INTO companies (name, abbreviation) VALUES ('Northwind Finance', 'NWF')",
        [],
    )
    .unwrap();
    let company_id = conn.last_insert_rowid();
    let branch_id = branch::create_branch(&conn, company_id, "NWF", "Pune Central").unwrap();
    conn.execute(
        "INSERT INTO users (company_id, name) VALUES (?1, 'Priya Desai')",
        params![company_id],
    )
    .unwrap();
    let user_id = conn.last_insert_rowid();
    branch::assign_user_branch(&conn, user_id, &branch_id).unwrap();
    conn.execute(
        "INSERT INTO products (company_id, name) VALUES (?1, 'Used Car Loan')",
        params![company_id],
    )
    .unwrap();
    let product_id = conn.last_insert_rowid();

    Desk {
        _dir: dir,
        db,
        actor: Actor::new(user_id, company_id, "NWF"),
        branch_id,
        product_id,
    }
}

pub fn form(desk: &Desk, pan: &str) -> ProposalForm {
    ProposalForm {
        branch_id: desk.branch_id.clone(),
        product_id: Some(desk.product_id),
        amount: 425_000.0,
        applicant: ApplicantForm {
            name: "Sameer Kulkarni".into(),
            mobile: "9988776655".into(),
            pan: pan.into(),
            email: None,
            date_of_birth: None,
        },
        address: AddressForm {
            line1: "22 FC Road".into(),
            line2: Some("Shivajinagar".into()),
            city: "Pune".into(),
            state: "Maharashtra".into(),
            pincode: "411005".into(),
        },
    }
}

pub fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
        .unwrap()
}
