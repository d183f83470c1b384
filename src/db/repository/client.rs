use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::enum_column;
use crate::db::DatabaseError;
use crate::models::enums::{AddressType, ClientTag};
use crate::models::*;

/// `client_id` of an active client with this PAN in the company, if any.
pub fn find_active_client_id(
    conn: &Connection,
    company_id: i64,
    pan: &str,
) -> Result<Option<i64>, DatabaseError> {
    conn.query_row(
        "SELECT client_id FROM client
         WHERE company_id = ?1 AND pan = ?2 AND active = 1
         ORDER BY id LIMIT 1",
        params![company_id, pan],
        |row| row.get(0),
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Mint the next sequential `client_id` from the autoincrement identity table.
pub fn mint_client_id(
    conn: &Connection,
    company_id: i64,
    minted_at: &DateTime<Utc>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO client_id_seq (company_id, minted_at) VALUES (?1, ?2)",
        params![company_id, minted_at],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert a client row for `lead_id`, reusing the person's `client_id` when
/// an active client with the same PAN exists in the company.
///
/// Must run inside a write transaction so lookup and mint cannot interleave
/// with another submission.
pub fn create_client(
    conn: &Connection,
    applicant: &ApplicantForm,
    company_id: i64,
    lead_id: i64,
    created_by: i64,
    created_at: &DateTime<Utc>,
) -> Result<ClientCreated, DatabaseError> {
    let (client_id, tag) = match find_active_client_id(conn, company_id, &applicant.pan)? {
        Some(existing) => (existing, ClientTag::Existing),
        None => (mint_client_id(conn, company_id, created_at)?, ClientTag::New),
    };

    conn.execute(
        "INSERT INTO client (client_id, company_id, lead_id, name, mobile, pan, email,
         date_of_birth, tag, active, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 1, ?10, ?11)",
        params![
            client_id,
            company_id,
            lead_id,
            applicant.name,
            applicant.mobile,
            applicant.pan,
            applicant.email,
            applicant.date_of_birth,
            tag.as_str(),
            created_by,
            created_at,
        ],
    )?;

    Ok(ClientCreated {
        row_id: conn.last_insert_rowid(),
        client_id,
        tag,
    })
}

/// Back-link a client row to the proposal created for it.
pub fn link_proposal(conn: &Connection, row_id: i64, prop_id: i64) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE client SET prop_id = ?2 WHERE id = ?1",
        params![row_id, prop_id],
    )?;
    if updated == 0 {
        return Err(DatabaseError::not_found("client", row_id));
    }
    Ok(())
}

pub fn get_client(conn: &Connection, row_id: i64) -> Result<Option<Client>, DatabaseError> {
    conn.query_row(
        &format!("{CLIENT_COLUMNS} WHERE id = ?1"),
        params![row_id],
        client_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

pub fn get_client_for_proposal(conn: &Connection, prop_id: i64) -> Result<Option<Client>, DatabaseError> {
    conn.query_row(
        &format!("{CLIENT_COLUMNS} WHERE prop_id = ?1 ORDER BY id LIMIT 1"),
        params![prop_id],
        client_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// All rows of one person, oldest first.
pub fn get_client_rows(conn: &Connection, client_id: i64) -> Result<Vec<Client>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("{CLIENT_COLUMNS} WHERE client_id = ?1 ORDER BY id"))?;
    let rows = stmt.query_map(params![client_id], client_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn insert_address(
    conn: &Connection,
    client: &ClientCreated,
    address_type: AddressType,
    address: &AddressForm,
    created_at: &DateTime<Utc>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO client_address (client_row_id, client_id, address_type, line1, line2,
         city, state, pincode, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            client.row_id,
            client.client_id,
            address_type.as_str(),
            address.line1,
            address.line2,
            address.city,
            address.state,
            address.pincode,
            created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_addresses(conn: &Connection, client_row_id: i64) -> Result<Vec<ClientAddress>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, client_row_id, client_id, address_type, line1, line2, city, state, pincode
         FROM client_address WHERE client_row_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![client_row_id], |row| {
        Ok(ClientAddress {
            id: row.get(0)?,
            client_row_id: row.get(1)?,
            client_id: row.get(2)?,
            address_type: enum_column(row, 3)?,
            line1: row.get(4)?,
            line2: row.get(5)?,
            city: row.get(6)?,
            state: row.get(7)?,
            pincode: row.get(8)?,
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

const CLIENT_COLUMNS: &str = "SELECT id, client_id, company_id, lead_id, prop_id, name, mobile,
    pan, email, date_of_birth, tag, active, created_by, created_at FROM client";

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(0)?,
        client_id: row.get(1)?,
        company_id: row.get(2)?,
        lead_id: row.get(3)?,
        prop_id: row.get(4)?,
        name: row.get(5)?,
        mobile: row.get(6)?,
        pan: row.get(7)?,
        email: row.get(8)?,
        date_of_birth: row.get(9)?,
        tag: enum_column(row, 10)?,
        active: row.get(11)?,
        created_by: row.get(12)?,
        created_at: row.get(13)?,
    })
}
