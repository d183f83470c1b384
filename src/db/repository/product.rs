use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;

/// Owning company of a product, `None` for an unknown id.
pub fn product_company(conn: &Connection, product_id: i64) -> Result<Option<i64>, DatabaseError> {
    conn.query_row(
        "SELECT company_id FROM products WHERE product_id = ?1",
        params![product_id],
        |row| row.get(0),
    )
    .optional()
    .map_err(DatabaseError::from)
}
