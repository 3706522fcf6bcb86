//! Application configuration loaded from environment variables.

use std::time::Duration;

use projections::{DEFAULT_BATCH_SIZE, DEFAULT_CACHE_TTL};

/// Notebook configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `NOTEBOOK_EVENTS_DB`: event log URL (default: `"sqlite://notebook-events.db"`)
/// - `NOTEBOOK_PROJECTIONS_DB`: projection tables URL (default: `"sqlite://notebook-projections.db"`)
/// - `NOTEBOOK_BATCH_SIZE`: catch-up batch size (default: `500`)
/// - `NOTEBOOK_CACHE_TTL_MS`: query cache lifetime (default: `2000`)
/// - `NOTEBOOK_COMMAND_RETRIES`: attempts per command on version conflicts (default: `3`)
/// - `NOTEBOOK_SYNC_INTERVAL_MS`: background catch-up period, `0` disables it (default: `5000`)
/// - `NOTEBOOK_VERIFY_EVERY`: consistency check every N background ticks, `0` disables it (default: `60`)
/// - `NOTEBOOK_LOG_JSON`: emit JSON log lines (default: `false`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub events_db: String,
    pub projections_db: String,
    pub batch_size: usize,
    pub cache_ttl: Duration,
    pub command_retries: u32,
    pub sync_interval: Duration,
    pub verify_every: u32,
    pub log_json: bool,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through `lookup`, falling back to defaults for
    /// missing or unparsable values.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            events_db: lookup("NOTEBOOK_EVENTS_DB").unwrap_or(defaults.events_db),
            projections_db: lookup("NOTEBOOK_PROJECTIONS_DB").unwrap_or(defaults.projections_db),
            batch_size: parse("NOTEBOOK_BATCH_SIZE")
                .filter(|n| *n > 0)
                .map_or(defaults.batch_size, |n| n as usize),
            cache_ttl: parse("NOTEBOOK_CACHE_TTL_MS")
                .map_or(defaults.cache_ttl, Duration::from_millis),
            command_retries: parse("NOTEBOOK_COMMAND_RETRIES")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.command_retries),
            sync_interval: parse("NOTEBOOK_SYNC_INTERVAL_MS")
                .map_or(defaults.sync_interval, Duration::from_millis),
            verify_every: parse("NOTEBOOK_VERIFY_EVERY")
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.verify_every),
            log_json: lookup("NOTEBOOK_LOG_JSON")
                .map_or(defaults.log_json, |v| matches!(v.trim(), "1" | "true" | "yes")),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Whether the background catch-up loop should run.
    pub fn background_sync_enabled(&self) -> bool {
        !self.sync_interval.is_zero()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            events_db: "sqlite://notebook-events.db".to_string(),
            projections_db: "sqlite://notebook-projections.db".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            cache_ttl: DEFAULT_CACHE_TTL,
            command_retries: 3,
            sync_interval: Duration::from_secs(5),
            verify_every: 60,
            log_json: false,
            log_level: "info".to_string(),
        }
    }
}
