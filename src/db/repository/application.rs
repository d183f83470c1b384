use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::uuid_column;
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_application(
    conn: &Connection,
    app_id: &Uuid,
    company_id: i64,
    lead_id: i64,
    created_at: &DateTime<Utc>,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO applications (app_id, company_id, lead_id, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![app_id.to_string(), company_id, lead_id, created_at],
    )?;
    Ok(())
}

pub fn get_application(conn: &Connection, app_id: &Uuid) -> Result<Option<Application>, DatabaseError> {
    conn.query_row(
        "SELECT app_id, company_id, lead_id, prop_id, loan_id, lan, created_at
         FROM applications WHERE app_id = ?1",
        params![app_id.to_string()],
        application_from_row,
    )
    .optional()
    .map_err(DatabaseError::from)
}

/// Every aggregate matching ANY of the supplied identifiers.
///
/// Absent keys bind as NULL and never match. With `company_id` set, only
/// that tenant's aggregates are considered. Callers decide what more than
/// one match means.
pub fn find_matching_applications(
    conn: &Connection,
    keys: &ApplicationKeys,
    company_id: Option<i64>,
) -> Result<Vec<Uuid>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT app_id FROM applications
         WHERE (app_id = ?1 OR lead_id = ?2 OR prop_id = ?3 OR loan_id = ?4 OR lan = ?5)
           AND (?6 IS NULL OR company_id = ?6)
         ORDER BY created_at",
    )?;
    let rows = stmt.query_map(
        params![
            keys.app_id.map(|id| id.to_string()),
            keys.lead_id,
            keys.prop_id,
            keys.loan_id,
            keys.lan,
            company_id,
        ],
        |row| uuid_column(row, 0),
    )?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn attach_proposal(conn: &Connection, app_id: &Uuid, prop_id: i64) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE applications SET prop_id = ?2 WHERE app_id = ?1",
        params![app_id.to_string(), prop_id],
    )?;
    expect_one(updated, app_id)
}

pub fn attach_loan(conn: &Connection, app_id: &Uuid, loan_id: i64) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE applications SET loan_id = ?2 WHERE app_id = ?1",
        params![app_id.to_string(), loan_id],
    )?;
    expect_one(updated, app_id)
}

pub fn attach_lan(conn: &Connection, app_id: &Uuid, lan: &str) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE applications SET lan = ?2 WHERE app_id = ?1",
        params![app_id.to_string(), lan],
    )?;
    expect_one(updated, app_id)
}

fn expect_one(updated: usize, app_id: &Uuid) -> Result<(), DatabaseError> {
    if updated == 0 {
        return Err(DatabaseError::not_found("application", app_id));
    }
    Ok(())
}

fn application_from_row(row: &Row<'_>) -> rusqlite::Result<Application> {
    Ok(Application {
        app_id: uuid_column(row, 0)?,
        company_id: row.get(1)?,
        lead_id: row.get(2)?,
        prop_id: row.get(3)?,
        loan_id: row.get(4)?,
        lan: row.get(5)?,
        created_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_lead, Fixture};

    #[test]
    fn attach_keys_and_read_back() {
        let fx = Fixture::new();
        let lead_id = seed_lead(&fx, "ABCDE1234F");
        let app_id = Uuid::new_v4();
        insert_application(&fx.conn, &app_id, fx.company_id, lead_id, &Utc::now()).unwrap();

        attach_proposal(&fx.conn, &app_id, 11).unwrap();
        attach_loan(&fx.conn, &app_id, 900).unwrap();
        attach_lan(&fx.conn, &app_id, "LAN0001").unwrap();

        let app = get_application(&fx.conn, &app_id).unwrap().unwrap();
        assert_eq!(app.lead_id, lead_id);
        assert_eq!(app.prop_id, Some(11));
        assert_eq!(app.loan_id, Some(900));
        assert_eq!(app.lan.as_deref(), Some("LAN0001"));
        assert_eq!(app.keys().prop_id, Some(11));
    }

    #[test]
    fn any_supplied_key_matches() {
        let fx = Fixture::new();
        let lead_id = seed_lead(&fx, "ABCDE1234F");
        let app_id = Uuid::new_v4();
        insert_application(&fx.conn, &app_id, fx.company_id, lead_id, &Utc::now()).unwrap();
        attach_proposal(&fx.conn, &app_id, 5).unwrap();

        let by_prop = find_matching_applications(&fx.conn, &ApplicationKeys::proposal(5), None).unwrap();
        assert_eq!(by_prop, vec![app_id]);

        // Stale prop id alongside a good lead id still finds the record
        let mixed = ApplicationKeys::lead(lead_id).with_prop(999);
        assert_eq!(find_matching_applications(&fx.conn, &mixed, None).unwrap(), vec![app_id]);

        let none = find_matching_applications(&fx.conn, &ApplicationKeys::lead(lead_id + 50), None).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn company_scope_hides_other_tenants() {
        let fx = Fixture::new();
        let lead_id = seed_lead(&fx, "ABCDE1234F");
        let app_id = Uuid::new_v4();
        insert_application(&fx.conn, &app_id, fx.company_id, lead_id, &Utc::now()).unwrap();
        let other_company = fx.seed_company("Other Finance", "OTF");

        let keys = ApplicationKeys::lead(lead_id);
        assert_eq!(
            find_matching_applications(&fx.conn, &keys, Some(fx.company_id)).unwrap(),
            vec![app_id]
        );
        assert!(find_matching_applications(&fx.conn, &keys, Some(other_company))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn attach_to_missing_application_is_not_found() {
        let fx = Fixture::new();
        let err = attach_lan(&fx.conn, &Uuid::new_v4(), "LAN1").unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }

    #[test]
    fn duplicate_lan_violates_constraint() {
        let fx = Fixture::new();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        insert_application(&fx.conn, &first, fx.company_id, seed_lead(&fx, "ABCDE1234F"), &Utc::now()).unwrap();
        insert_application(&fx.conn, &second, fx.company_id, seed_lead(&fx, "ABCDE1234G"), &Utc::now()).unwrap();

        attach_lan(&fx.conn, &first, "LAN-DUP").unwrap();
        let err = attach_lan(&fx.conn, &second, "LAN-DUP").unwrap_err();
        assert!(err.is_constraint_violation());
    }
}
