pub mod actions;
pub mod applications;
pub mod approval;
pub mod booking;
pub mod config;
pub mod db;
pub mod identifiers;
pub mod models;
pub mod pipeline;
pub mod process;

#[cfg(test)]
pub(crate) mod test_support;

use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::db::{Database, DatabaseError};

/// Install the global `tracing` subscriber. `RUST_LOG` wins over the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Open (and migrate) the configured database and report its state.
pub fn run(config: &Config) -> Result<(), DatabaseError> {
    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let database = Database::open(config.database_path.clone(), config.busy_timeout)?;
    let conn = database.connect()?;
    let version = db::schema_version(&conn);
    let in_flight = applications::count_in_flight(&conn)?;

    tracing::info!(
        path = %database.path().display(),
        schema_version = version,
        in_flight,
        "Database ready"
    );
    Ok(())
}
