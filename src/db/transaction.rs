//! Unit-of-work executor.
//!
//! Every multi-step write runs through [`in_transaction`]. A connection in
//! autocommit mode gets its own IMMEDIATE transaction, so concurrent writers
//! serialize on the SQLite write lock instead of racing on read-then-write
//! sequences. A connection that already has a transaction open is joined:
//! the outermost owner commits or rolls back the whole unit.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use super::DatabaseError;

/// Run `f` inside a transaction on `conn`.
///
/// Commits when `f` returns `Ok`, rolls back when it returns `Err`. Errors
/// from `f` must propagate out of the body untouched so the rollback happens
/// before they are turned into a result envelope.
pub fn in_transaction<T, E, F>(conn: &Connection, f: F) -> Result<T, E>
where
    F: FnOnce(&Connection) -> Result<T, E>,
    E: From<DatabaseError>,
{
    if !conn.is_autocommit() {
        tracing::trace!("Joining open transaction");
        return f(conn);
    }

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(DatabaseError::from)?;

    match f(&*tx) {
        Ok(value) => {
            tx.commit().map_err(DatabaseError::from)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                tracing::error!(error = %rollback_err, "Transaction rollback failed");
            } else {
                tracing::debug!("Transaction rolled back");
            }
            Err(err)
        }
    }
}
