//! Connection configuration
//!
//! The engine never reads configuration files or environment variables; the
//! host application resolves its settings and hands the engine a fully
//! populated [`ConnectionConfig`].

use serde::{Deserialize, Serialize};

/// Default name of the version-log table
pub const DEFAULT_LOG_TABLE: &str = "strata_migrations";

/// Resolved database connection settings for one migration target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Adapter name: "postgres"/"pgsql" or "mysql"
    pub adapter: String,
    /// Database server host
    pub host: String,
    /// Database server port; adapter default when `None`
    pub port: Option<u16>,
    /// Target database name
    pub name: String,
    /// Login user
    pub user: String,
    /// Login password
    pub pass: Option<String>,
    /// Connection character set (used by engines that honor it)
    pub charset: Option<String>,
    /// Prefix applied to every table name passed through the adapter
    pub table_prefix: Option<String>,
    /// Suffix applied to every table name passed through the adapter
    pub table_suffix: Option<String>,
    /// Name of the version-log table
    pub log_table: String,
}

impl ConnectionConfig {
    /// Create a configuration for the given adapter and database name with
    /// everything else at its default
    pub fn new(adapter: &str, name: &str) -> Self {
        Self {
            adapter: adapter.to_string(),
            host: "localhost".to_string(),
            port: None,
            name: name.to_string(),
            user: String::new(),
            pass: None,
            charset: None,
            table_prefix: None,
            table_suffix: None,
            log_table: DEFAULT_LOG_TABLE.to_string(),
        }
    }

    /// Set the host
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the credentials
    pub fn with_credentials(mut self, user: &str, pass: Option<&str>) -> Self {
        self.user = user.to_string();
        self.pass = pass.map(str::to_string);
        self
    }

    /// Set the connection character set
    pub fn with_charset(mut self, charset: &str) -> Self {
        self.charset = Some(charset.to_string());
        self
    }

    /// Set a table prefix applied to every table the engine touches
    pub fn with_table_prefix(mut self, prefix: &str) -> Self {
        self.table_prefix = Some(prefix.to_string());
        self
    }

    /// Set a table suffix applied to every table the engine touches
    pub fn with_table_suffix(mut self, suffix: &str) -> Self {
        self.table_suffix = Some(suffix.to_string());
        self
    }

    /// Override the version-log table name
    pub fn with_log_table(mut self, table: &str) -> Self {
        self.log_table = table.to_string();
        self
    }

    /// Whether the factory should wrap the adapter with the prefixing decorator
    pub fn has_table_affix(&self) -> bool {
        self.table_prefix.as_deref().is_some_and(|p| !p.is_empty())
            || self.table_suffix.as_deref().is_some_and(|s| !s.is_empty())
    }
}
