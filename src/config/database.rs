use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Database configuration.
///
/// The database is owned by the panel; this service only reads the
/// `inbounds` and `client_traffics` tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub enum DatabaseConfig {
    /// The panel's SQLite database file.
    Sqlite(SqliteConfig),
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig::Sqlite(SqliteConfig::default())
    }
}

impl DatabaseConfig {
    pub fn sqlite(&self) -> &SqliteConfig {
        match self {
            DatabaseConfig::Sqlite(c) => c,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            DatabaseConfig::Sqlite(c) => c.validate(),
        }
    }
}

/// SQLite configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteConfig {
    /// Path to the panel's SQLite database file.
    #[serde(default = "default_path")]
    pub path: String,

    /// Create the database file if it doesn't exist.
    ///
    /// Off by default: a missing file almost always means a wrong path, and
    /// an empty database would turn every lookup into a 500.
    #[serde(default)]
    pub create_if_missing: bool,

    /// Open the database read-only.
    #[serde(default)]
    pub read_only: bool,

    /// Request WAL journal mode so panel writes never block lookups.
    /// Ignored when `read_only` is set.
    #[serde(default = "default_true")]
    pub wal_mode: bool,

    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    /// Maximum pooled connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            create_if_missing: false,
            read_only: false,
            wal_mode: true,
            busy_timeout_ms: default_busy_timeout(),
            max_connections: default_max_connections(),
        }
    }
}

impl SqliteConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.path.is_empty() {
            return Err(ConfigError::Validation(
                "SQLite path cannot be empty".into(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be at least 1".into(),
            ));
        }
        if self.read_only && self.create_if_missing {
            return Err(ConfigError::Validation(
                "database.create_if_missing cannot be combined with read_only".into(),
            ));
        }
        Ok(())
    }
}

fn default_path() -> String {
    "/etc/x-ui/x-ui.db".to_string()
}

fn default_true() -> bool {
    true
}

fn default_busy_timeout() -> u64 {
    5000
}

fn default_max_connections() -> u32 {
    5
}
