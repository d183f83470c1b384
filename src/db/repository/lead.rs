use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

/// Insert a lead with term 0. Returns the new `lead_id`.
pub fn insert_lead(
    conn: &Connection,
    lead: &NewLead,
    company_id: i64,
    created_by: i64,
    created_at: &DateTime<Utc>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO leads (company_id, branch_id, product_id, name, mobile, pan, amount,
         term, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9)",
        params![
            company_id,
            lead.branch_id,
            lead.product_id,
            lead.name,
            lead.mobile,
            lead.pan,
            lead.amount,
            created_by,
            created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_lead(conn: &Connection, lead_id: i64) -> Result<Option<Lead>, DatabaseError> {
    conn.query_row(
        "SELECT lead_id, company_id, branch_id, product_id, name, mobile, pan, amount, term,
         created_by, created_at
         FROM leads WHERE lead_id = ?1",
        params![lead_id],
        |row| {
            Ok(Lead {
                lead_id: row.get(0)?,
                company_id: row.get(1)?,
                branch_id: row.get(2)?,
                product_id: row.get(3)?,
                name: row.get(4)?,
                mobile: row.get(5)?,
                pan: row.get(6)?,
                amount: row.get(7)?,
                term: row.get(8)?,
                created_by: row.get(9)?,
                created_at: row.get(10)?,
            })
        },
    )
    .optional()
    .map_err(DatabaseError::from)
}
