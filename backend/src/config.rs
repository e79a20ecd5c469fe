use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::AppError;

pub const DEFAULT_TECSUP_BASE_URL: &str = "https://tecsup.instructure.com/api/v1";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub tecsup_base_url: String,
    pub tecsup_timeout_secs: u64,
    pub fetch_concurrency: usize,
    pub snapshot_interval_secs: Option<u64>,
    pub summary_retention_days: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://productivity.db".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            tecsup_base_url: DEFAULT_TECSUP_BASE_URL.to_string(),
            tecsup_timeout_secs: 30,
            fetch_concurrency: 4,
            snapshot_interval_secs: None,
            summary_retention_days: None,
        }
    }
}

impl AppConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset or blank keys take the default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|raw| !raw.trim().is_empty());

        let snapshot_interval_secs = parse_var::<u64>(&var, "SNAPSHOT_INTERVAL_SECS")?;
        if snapshot_interval_secs == Some(0) {
            return Err(AppError::Config(
                "SNAPSHOT_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            database_url: var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: parse_var(&var, "BIND_ADDR")?.unwrap_or(defaults.bind_addr),
            tecsup_base_url: var("TECSUP_BASE_URL")
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.tecsup_base_url),
            tecsup_timeout_secs: parse_var(&var, "TECSUP_TIMEOUT_SECS")?
                .unwrap_or(defaults.tecsup_timeout_secs),
            fetch_concurrency: parse_var::<usize>(&var, "TECSUP_FETCH_CONCURRENCY")?
                .unwrap_or(defaults.fetch_concurrency)
                .max(1),
            snapshot_interval_secs,
            summary_retention_days: parse_var(&var, "SUMMARY_RETENTION_DAYS")?,
        })
    }
}

fn parse_var<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, AppError> {
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(None),
    }
}
