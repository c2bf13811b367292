//! Error types for the migration engine
//!
//! Every fallible operation in the engine returns [`MigrateResult`]. The
//! variants follow the failure taxonomy of a migration run: bad
//! configuration, invalid migration sets, connectivity, failed DDL (carrying
//! the attempted SQL), and reversibility violations.

use thiserror::Error;

/// Result type for migration operations
pub type MigrateResult<T> = Result<T, MigrateError>;

/// Errors that can occur while resolving adapters or running migrations
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Invalid or missing configuration (unknown adapter name, bad options)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid migration/seed set or target (duplicate versions, unknown seed)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Could not connect to or create the target database
    #[error("Connection error: {0}")]
    Connection(String),

    /// A statement failed while executing a migration
    #[error("Execution error: {message}{}", .sql.as_deref().map(|s| format!("\nsql: {}", s)).unwrap_or_default())]
    Execution {
        message: String,
        /// The SQL text that was being executed, when applicable
        sql: Option<String>,
    },

    /// A reversible migration issued an operation with no defined inverse
    #[error("Irreversible migration: {0}")]
    Irreversible(String),

    /// A seeder failed
    #[error("Seed error: {0}")]
    Seed(String),
}

impl MigrateError {
    /// Create a new configuration error
    pub fn configuration<T: ToString>(msg: T) -> Self {
        Self::Configuration(msg.to_string())
    }

    /// Create a new validation error
    pub fn validation<T: ToString>(msg: T) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create a new connection error
    pub fn connection<T: ToString>(msg: T) -> Self {
        Self::Connection(msg.to_string())
    }

    /// Create an execution error without an associated statement
    pub fn execution<T: ToString>(msg: T) -> Self {
        Self::Execution {
            message: msg.to_string(),
            sql: None,
        }
    }

    /// Create an execution error wrapping the attempted SQL text
    pub fn execution_with_sql<T: ToString, S: ToString>(msg: T, sql: S) -> Self {
        Self::Execution {
            message: msg.to_string(),
            sql: Some(sql.to_string()),
        }
    }

    /// Create a new irreversibility error for the named operation
    pub fn irreversible<T: ToString>(operation: T) -> Self {
        Self::Irreversible(format!(
            "'{}' cannot be automatically inverted; write explicit up()/down() migrations instead",
            operation.to_string()
        ))
    }

    /// Create a new seed error
    pub fn seed<T: ToString>(msg: T) -> Self {
        Self::Seed(msg.to_string())
    }
}

// Convert from sqlx errors
impl From<sqlx::Error> for MigrateError {
    fn from(err: sqlx::Error) -> Self {
        MigrateError::execution(err)
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for MigrateError {
    fn from(err: serde_json::Error) -> Self {
        MigrateError::execution(err)
    }
}

// Convert from anyhow errors
impl From<anyhow::Error> for MigrateError {
    fn from(err: anyhow::Error) -> Self {
        MigrateError::execution(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_error_carries_sql_text() {
        let err = MigrateError::execution_with_sql("syntax error", "CREATE TABLE broken (");
        let rendered = err.to_string();
        assert!(rendered.contains("syntax error"));
        assert!(rendered.contains("CREATE TABLE broken ("));
    }

    #[test]
    fn execution_error_without_sql_omits_suffix() {
        let err = MigrateError::execution("transaction already open");
        assert_eq!(err.to_string(), "Execution error: transaction already open");
    }
}
