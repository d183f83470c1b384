//! Repository layer: row-level database operations, one module per table group.
//!
//! Functions take `&Connection` and never open transactions themselves; the
//! callers in `process`, `pipeline`, `approval` and `booking` compose them
//! inside `in_transaction`.

pub mod application;
pub mod branch;
pub mod client;
pub mod lead;
pub mod process_state;
pub mod product;
pub mod proposal;

use std::str::FromStr;

use rusqlite::types::Type;
use rusqlite::Row;
use uuid::Uuid;

use super::DatabaseError;

/// Read a TEXT column holding a UUID.
pub(crate) fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    Uuid::parse_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a TEXT column holding one of the `str_enum!` values.
pub(crate) fn enum_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = DatabaseError>,
{
    let raw: String = row.get(idx)?;
    T::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
