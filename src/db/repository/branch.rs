use rusqlite::{params, Connection, OptionalExtension};

use crate::db::{in_transaction, DatabaseError};
use crate::identifiers::{self, IdentifierError};

#[derive(Debug, thiserror::Error)]
pub enum BranchError {
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Create a branch with the next per-company sequence and its generated id.
pub fn create_branch(
    conn: &Connection,
    company_id: i64,
    company_abbr: &str,
    name: &str,
) -> Result<String, BranchError> {
    in_transaction(conn, |tx| -> Result<String, BranchError> {
        let seq: i64 = tx
            .query_row(
                "SELECT COALESCE(MAX(seq), 0) + 1 FROM branches WHERE company_id = ?1",
                params![company_id],
                |row| row.get(0),
            )
            .map_err(DatabaseError::from)?;
        let branch_id = identifiers::branch_id(company_abbr, seq)?;
        tx.execute(
            "INSERT INTO branches (branch_id, company_id, seq, name) VALUES (?1, ?2, ?3, ?4)",
            params![branch_id, company_id, seq, name],
        )
        .map_err(DatabaseError::from)?;
        tracing::debug!(%branch_id, company_id, "Branch created");
        Ok(branch_id)
    })
}

/// Branch ids the user is mapped to.
pub fn branches_for_user(conn: &Connection, user_id: i64) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT branch_id FROM user_branches WHERE user_id = ?1 ORDER BY branch_id",
    )?;
    let rows = stmt.query_map(params![user_id], |row| row.get::<_, String>(0))?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// Owning company of a branch, `None` for an unknown id.
pub fn branch_company(conn: &Connection, branch_id: &str) -> Result<Option<i64>, DatabaseError> {
    conn.query_row(
        "SELECT company_id FROM branches WHERE branch_id = ?1",
        params![branch_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn assign_user_branch(conn: &Connection, user_id: i64, branch_id: &str) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT OR IGNORE INTO user_branches (user_id, branch_id) VALUES (?1, ?2)",
        params![user_id, branch_id],
    )?;
    Ok(())
}
