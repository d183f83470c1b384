use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Loandesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HOME_ENV: &str = "LOANDESK_HOME";
pub const DB_ENV: &str = "LOANDESK_DB";
pub const BUSY_TIMEOUT_ENV: &str = "LOANDESK_BUSY_TIMEOUT_MS";

/// How long a writer waits on the SQLite write lock before giving up.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

const DB_FILE_NAME: &str = "loandesk.db";

/// Application data directory: `$LOANDESK_HOME`, else `<data dir>/loandesk`.
pub fn app_data_dir() -> PathBuf {
    resolve_data_dir(std::env::var_os(HOME_ENV).map(PathBuf::from), dirs::data_dir())
}

/// Database file: `$LOANDESK_DB`, else `loandesk.db` in the data directory.
pub fn database_path() -> PathBuf {
    std::env::var_os(DB_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| app_data_dir().join(DB_FILE_NAME))
}

pub fn busy_timeout() -> Duration {
    parse_busy_timeout(std::env::var(BUSY_TIMEOUT_ENV).ok().as_deref())
}

/// Milliseconds from the environment; unset or unparsable falls back to the default.
pub fn parse_busy_timeout(raw: Option<&str>) -> Duration {
    match raw.map(str::trim) {
        Some(ms) => match ms.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                tracing::warn!(value = ms, "Ignoring invalid {BUSY_TIMEOUT_ENV}");
                DEFAULT_BUSY_TIMEOUT
            }
        },
        None => DEFAULT_BUSY_TIMEOUT,
    }
}

/// Filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "loandesk=info"
}

fn resolve_data_dir(override_dir: Option<PathBuf>, platform_dir: Option<PathBuf>) -> PathBuf {
    override_dir.unwrap_or_else(|| {
        platform_dir
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_NAME.to_ascii_lowercase())
    })
}

/// Runtime settings for the binary, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_path: PathBuf,
    pub busy_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_path: database_path(),
            busy_timeout: busy_timeout(),
        }
    }
}
