//! Process store: per-application pipeline stage tracking.
//!
//! Each application aggregate owns one `ProcessState` document holding a
//! `StageTransition { status, at, by }` per stage. Status, timestamp and
//! acting user are written in one statement, so they cannot drift apart.
//!
//! Applications are addressed by any combination of identifiers. A record
//! matches if ANY supplied identifier matches; identifiers that point at
//! two different aggregates are rejected instead of picking one.

use chrono::Utc;
use rusqlite::Connection;
use thiserror::Error;
use uuid::Uuid;

use crate::db::repository::{application, process_state};
use crate::db::{in_transaction, DatabaseError};
use crate::models::enums::Stage;
use crate::models::*;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("At least one identifier is required")]
    KeysRequired,

    #[error("No process record found for {0}")]
    NotFound(ApplicationKeys),

    #[error("Identifiers {keys} match {count} different applications")]
    AmbiguousKeys { keys: ApplicationKeys, count: usize },

    #[error("Process update not processed! {stage} was not written for application {app_id}")]
    NotUpdated { stage: Stage, app_id: Uuid },

    #[error("Unknown process stage: {0}")]
    UnknownStage(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for ProcessError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.into())
    }
}

/// Parse a stage name as submitted by a form (`"kyc_process"`).
pub fn parse_stage(name: &str) -> Result<Stage, ProcessError> {
    name.trim()
        .parse()
        .map_err(|_| ProcessError::UnknownStage(name.to_string()))
}

/// Resolve the single application addressed by `keys`.
pub fn resolve_application(conn: &Connection, keys: &ApplicationKeys) -> Result<Uuid, ProcessError> {
    resolve_scoped(conn, keys, None)
}

/// Resolve the single application addressed by `keys` within one company.
/// Another tenant's application is reported as not found.
pub fn resolve_company_application(
    conn: &Connection,
    keys: &ApplicationKeys,
    company_id: i64,
) -> Result<Uuid, ProcessError> {
    resolve_scoped(conn, keys, Some(company_id))
}

fn resolve_scoped(conn: &Connection, keys: &ApplicationKeys, company_id: Option<i64>) -> Result<Uuid, ProcessError> {
    if keys.is_empty() {
        return Err(ProcessError::KeysRequired);
    }
    let matches = application::find_matching_applications(conn, keys, company_id)?;
    match matches.as_slice() {
        [] => Err(ProcessError::NotFound(keys.clone())),
        [app_id] => Ok(*app_id),
        _ => {
            tracing::warn!(%keys, count = matches.len(), "Identifiers resolve to several applications");
            Err(ProcessError::AmbiguousKeys {
                keys: keys.clone(),
                count: matches.len(),
            })
        }
    }
}

/// Create the application aggregate for a freshly captured lead, with
/// `lead_process` marked done by `actor`. Returns the new `app_id`.
pub fn initialize_process(conn: &Connection, lead_id: i64, actor: &Actor) -> Result<Uuid, ProcessError> {
    in_transaction(conn, |tx| -> Result<Uuid, ProcessError> {
        let app_id = Uuid::new_v4();
        let now = Utc::now();
        application::insert_application(tx, &app_id, actor.company_id, lead_id, &now)?;
        let state = ProcessState::initial(now, actor.user_id);
        process_state::insert_process_state(tx, &app_id, &state, &now)?;
        tracing::info!(%app_id, lead_id, user_id = actor.user_id, "Process initialized");
        Ok(app_id)
    })
}

/// Set `stage` to `value`, stamped now and by `actor`. Only applications of
/// the actor's company are addressable.
///
/// Joins the caller's transaction when one is open; otherwise runs in its
/// own. Any failure rolls back the enclosing unit of work.
pub fn update_process(
    conn: &Connection,
    stage: Stage,
    value: i64,
    keys: &ApplicationKeys,
    actor: &Actor,
) -> Result<StageTransition, ProcessError> {
    if keys.is_empty() {
        return Err(ProcessError::KeysRequired);
    }

    in_transaction(conn, |tx| -> Result<StageTransition, ProcessError> {
        let app_id = resolve_company_application(tx, keys, actor.company_id)?;
        let mut state = process_state::load_process_state(tx, &app_id)?
            .ok_or_else(|| ProcessError::NotFound(keys.clone()))?;

        let now = Utc::now();
        let transition = state.mark(stage, value, now, actor.user_id).clone();
        let written = process_state::store_process_state(tx, &app_id, &state, &now)?;
        if written == 0 {
            return Err(ProcessError::NotUpdated { stage, app_id });
        }

        tracing::debug!(%app_id, %stage, value, user_id = actor.user_id, "Stage updated");
        Ok(transition)
    })
}

/// Per-stage `(status, at, by)` timeline of the addressed application.
pub fn get_process_log(conn: &Connection, keys: &ApplicationKeys) -> Result<ProcessLog, ProcessError> {
    let app_id = resolve_application(conn, keys)?;
    let app = application::get_application(conn, &app_id)?
        .ok_or_else(|| ProcessError::NotFound(keys.clone()))?;
    let state = process_state::load_process_state(conn, &app_id)?.unwrap_or_default();
    Ok(ProcessLog::from_state(app_id, app.keys(), &state))
}

/// Current pipeline position of the addressed application.
pub fn current_stage(conn: &Connection, keys: &ApplicationKeys) -> Result<CurrentStage, ProcessError> {
    let app_id = resolve_application(conn, keys)?;
    let state = process_state::load_process_state(conn, &app_id)?.unwrap_or_default();
    Ok(state.current_stage())
}
