//! Operator listings: in-flight cases, specialist queues and the approval
//! inbox, scoped to the branches a user is mapped to.

use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};

use crate::db::repository::branch;
use crate::db::repository::uuid_column;
use crate::db::DatabaseError;
use crate::models::enums::Queue;
use crate::models::*;

const LISTING_QUERY: &str = "SELECT p.prop_id, p.prop_no, p.app_id, p.lead_id, c.name, p.branch_id,
        b.name, pr.name, p.amount, p.status, l.label, u.name, p.created_at, ps.stages
     FROM proposals p
     LEFT JOIN client c ON c.prop_id = p.prop_id
     LEFT JOIN branches b ON b.branch_id = p.branch_id
     LEFT JOIN products pr ON pr.product_id = p.product_id
     LEFT JOIN proposal_status_labels l ON l.status = p.status
     LEFT JOIN users u ON u.user_id = p.handler_id
     LEFT JOIN process_state ps ON ps.app_id = p.app_id
     WHERE p.branch_id IN (SELECT branch_id FROM user_branches WHERE user_id = ?1)";

/// In-flight proposals (`5 < status < 20`) in the user's branches, newest
/// first, each with its current stage.
pub fn get_applications_list(conn: &Connection, user_id: i64) -> Result<Vec<ApplicationRow>, DatabaseError> {
    if branch::branches_for_user(conn, user_id)?.is_empty() {
        tracing::debug!(user_id, "User has no branches");
        return Ok(Vec::new());
    }
    query_rows(
        conn,
        &format!(
            "{LISTING_QUERY} AND p.status > {STATUS_PENDING_APPROVAL} AND p.status < {STATUS_DISBURSED}
             ORDER BY p.prop_id DESC"
        ),
        user_id,
    )
}

/// The in-flight listing narrowed to applications whose current stage is
/// worked by `queue`.
pub fn get_queue(conn: &Connection, user_id: i64, queue: Queue) -> Result<Vec<ApplicationRow>, DatabaseError> {
    let rows = get_applications_list(conn, user_id)?;
    Ok(rows
        .into_iter()
        .filter(|row| row.current_process.queue() == Some(queue))
        .collect())
}

/// Proposals awaiting an approval decision in the user's branches.
pub fn list_pending(conn: &Connection, user_id: i64) -> Result<Vec<ApplicationRow>, DatabaseError> {
    query_rows(
        conn,
        &format!("{LISTING_QUERY} AND p.status = {STATUS_PENDING_APPROVAL} ORDER BY p.prop_id DESC"),
        user_id,
    )
}

/// Number of in-flight proposals across all tenants.
pub fn count_in_flight(conn: &Connection) -> Result<i64, DatabaseError> {
    conn.query_row(
        "SELECT COUNT(*) FROM proposals WHERE status > ?1 AND status < ?2",
        params![STATUS_PENDING_APPROVAL, STATUS_DISBURSED],
        |row| row.get(0),
    )
    .map_err(DatabaseError::from)
}

fn query_rows(conn: &Connection, sql: &str, user_id: i64) -> Result<Vec<ApplicationRow>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![user_id], row_from_listing)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

fn row_from_listing(row: &Row<'_>) -> rusqlite::Result<ApplicationRow> {
    let state = match row.get::<_, Option<String>>(13)? {
        Some(json) => ProcessState::from_json(&json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(13, Type::Text, Box::new(e)))?,
        None => ProcessState::new(),
    };
    Ok(ApplicationRow {
        prop_id: row.get(0)?,
        prop_no: row.get(1)?,
        app_id: uuid_column(row, 2)?,
        lead_id: row.get(3)?,
        client_name: row.get(4)?,
        branch_id: row.get(5)?,
        branch_name: row.get(6)?,
        product_name: row.get(7)?,
        amount: row.get(8)?,
        status: row.get(9)?,
        status_label: row.get(10)?,
        handler_name: row.get(11)?,
        created_at: row.get(12)?,
        current_process: state.current_stage(),
    })
}
