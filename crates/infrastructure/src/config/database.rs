//! Database (SQLite) configuration.

use serde::{Deserialize, Serialize};

use super::default_true;

/// SQLite database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Maximum number of open connections in the pool.
    #[serde(default = "default_max_open_connections")]
    pub max_open_connections: u32,

    /// Minimum idle connections the pool keeps warm.
    #[serde(default = "default_max_idle_connections")]
    pub max_idle_connections: u32,

    /// Maximum lifetime of a pooled connection, in seconds, before it is
    /// recycled. `0` means unbounded.
    #[serde(default = "default_conn_max_lifetime_sec")]
    pub conn_max_lifetime_sec: u64,

    /// Maximum time, in seconds, a connection may sit idle before being
    /// closed. `0` means unbounded.
    #[serde(default = "default_conn_max_idle_time_sec")]
    pub conn_max_idle_time_sec: u64,

    /// Whether to run pending migrations on startup (default: true)
    #[serde(default = "default_true")]
    pub run_migrations: bool,

    /// Retention window, in days, for the Mapping Store janitor: mappings
    /// whose `forwarded_at` is older than this are deleted.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_db_path() -> String {
    "whatsignal.db".to_string()
}

const fn default_max_open_connections() -> u32 {
    5
}

const fn default_max_idle_connections() -> u32 {
    2
}

const fn default_conn_max_lifetime_sec() -> u64 {
    3600
}

const fn default_conn_max_idle_time_sec() -> u64 {
    600
}

const fn default_retention_days() -> u32 {
    30
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_open_connections: default_max_open_connections(),
            max_idle_connections: default_max_idle_connections(),
            conn_max_lifetime_sec: default_conn_max_lifetime_sec(),
            conn_max_idle_time_sec: default_conn_max_idle_time_sec(),
            run_migrations: true,
            retention_days: default_retention_days(),
        }
    }
}
