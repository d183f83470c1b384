use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::uuid_column;
use crate::db::DatabaseError;
use crate::models::*;

/// Insert a proposal pending approval, handled by its creator. Returns `prop_id`.
pub fn insert_proposal(
    conn: &Connection,
    proposal: &NewProposal,
    created_at: &DateTime<Utc>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO proposals (prop_no, app_id, lead_id, client_id, branch_id, product_id,
         amount, status, handler_id, created_by, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9, ?10, ?10)",
        params![
            proposal.prop_no,
            proposal.app_id.to_string(),
            proposal.lead_id,
            proposal.client_id,
            proposal.branch_id,
            proposal.product_id,
            proposal.amount,
            STATUS_PENDING_APPROVAL,
            proposal.created_by,
            created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

const PROPOSAL_COLUMNS: &str = "p.prop_id, p.prop_no, p.app_id, p.lead_id, p.client_id, p.branch_id,
     p.product_id, p.amount, p.status, p.handler_id, p.created_by, p.created_at, p.updated_at";

pub fn get_proposal(conn: &Connection, prop_id: i64) -> Result<Option<Proposal>, DatabaseError> {
    conn.query_row(
        &format!("SELECT {PROPOSAL_COLUMNS} FROM proposals p WHERE p.prop_id = ?1"),
        params![prop_id],
        row_to_proposal,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// The proposal, if its application belongs to `company_id`.
pub fn get_company_proposal(
    conn: &Connection,
    prop_id: i64,
    company_id: i64,
) -> Result<Option<Proposal>, DatabaseError> {
    conn.query_row(
        &format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposals p
             JOIN applications a ON a.app_id = p.app_id
             WHERE p.prop_id = ?1 AND a.company_id = ?2"
        ),
        params![prop_id, company_id],
        row_to_proposal,
    )
    .optional()
    .map_err(DatabaseError::from)
}

fn row_to_proposal(row: &rusqlite::Row<'_>) -> rusqlite::Result<Proposal> {
    Ok(Proposal {
        prop_id: row.get(0)?,
        prop_no: row.get(1)?,
        app_id: uuid_column(row, 2)?,
        lead_id: row.get(3)?,
        client_id: row.get(4)?,
        branch_id: row.get(5)?,
        product_id: row.get(6)?,
        amount: row.get(7)?,
        status: row.get(8)?,
        handler_id: row.get(9)?,
        created_by: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

/// Set the numeric status. Returns the number of rows affected.
pub fn update_status(
    conn: &Connection,
    prop_id: i64,
    status: i64,
    updated_at: &DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let updated = conn.execute(
        "UPDATE proposals SET status = ?2, updated_at = ?3 WHERE prop_id = ?1",
        params![prop_id, status, updated_at],
    )?;
    Ok(updated)
}
