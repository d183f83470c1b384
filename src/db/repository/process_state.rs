use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::ProcessState;

pub fn insert_process_state(
    conn: &Connection,
    app_id: &Uuid,
    state: &ProcessState,
    updated_at: &DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO process_state (app_id, stages, updated_at) VALUES (?1, ?2, ?3)",
        params![app_id.to_string(), state.to_json()?, updated_at],
    )?;
    Ok(())
}

/// Overwrite the document. Returns the number of rows written (0 or 1).
pub fn store_process_state(
    conn: &Connection,
    app_id: &Uuid,
    state: &ProcessState,
    updated_at: &DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let written = conn.execute(
        "UPDATE process_state SET stages = ?2, updated_at = ?3 WHERE app_id = ?1",
        params![app_id.to_string(), state.to_json()?, updated_at],
    )?;
    Ok(written)
}

pub fn load_process_state(conn: &Connection, app_id: &Uuid) -> Result<Option<ProcessState>, DatabaseError> {
    let json: Option<String> = conn
        .query_row(
            "SELECT stages FROM process_state WHERE app_id = ?1",
            params![app_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    match json {
        Some(json) => Ok(Some(ProcessState::from_json(&json)?)),
        None => Ok(None),
    }
}
