//! Dialect adapters
//!
//! A [`SchemaAdapter`] turns the schema-change vocabulary into
//! dialect-correct SQL for one database engine and answers introspection
//! queries against that engine's catalogs. The engine talks to exactly one
//! adapter per run; wrappers ([`RecordingAdapter`], [`PrefixAdapter`])
//! implement the same trait and compose explicitly around an inner adapter.

pub mod dialect;
pub mod mysql;
pub mod postgres;
pub mod prefix;
pub mod recording;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::ConnectionConfig;
use crate::error::{MigrateError, MigrateResult};
use crate::migrations::{Direction, VersionLogEntry};
use crate::schema::{Column, ColumnType, ForeignKey, Index, SqlValue, Table};

pub use dialect::{NativeType, QuoteStyle};
pub use mysql::MysqlAdapter;
pub use postgres::PostgresAdapter;
pub use prefix::PrefixAdapter;
pub use recording::{RecordedCommand, RecordingAdapter};

/// Capability interface of one database engine.
///
/// Mutating operations take `&mut self`: an adapter instance is a single
/// connection with strictly ordered DDL, never a pool.
#[async_trait]
pub trait SchemaAdapter: Send {
    // --- connection lifecycle ---

    /// Open the connection; idempotent. Creates the target database lazily
    /// when the engine allows it.
    async fn connect(&mut self) -> MigrateResult<()>;

    /// Close the connection
    async fn disconnect(&mut self) -> MigrateResult<()>;

    /// Whether DDL on this engine participates in transactions; when false
    /// the manager skips the begin/commit wrapper entirely
    fn has_transactions(&self) -> bool;

    async fn begin_transaction(&mut self) -> MigrateResult<()>;
    async fn commit_transaction(&mut self) -> MigrateResult<()>;
    async fn rollback_transaction(&mut self) -> MigrateResult<()>;

    // --- version log ---

    /// Create the version-log table through the normal vocabulary path
    async fn create_schema_table(&mut self) -> MigrateResult<()>;

    /// All applied versions, ascending
    async fn get_versions(&mut self) -> MigrateResult<Vec<i64>>;

    /// The full version log indexed by version, ascending
    async fn get_version_log(&mut self) -> MigrateResult<BTreeMap<i64, VersionLogEntry>>;

    /// Record the outcome of one migration: insert the log row on UP,
    /// delete it on DOWN
    async fn record_migrated(
        &mut self,
        version: i64,
        name: &str,
        direction: Direction,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> MigrateResult<()>;

    // --- tables ---

    async fn has_table(&mut self, table: &str) -> MigrateResult<bool>;
    async fn create_table(&mut self, table: &Table) -> MigrateResult<()>;
    async fn rename_table(&mut self, table: &str, new_name: &str) -> MigrateResult<()>;
    async fn drop_table(&mut self, table: &str) -> MigrateResult<()>;

    // --- columns ---

    async fn get_columns(&mut self, table: &str) -> MigrateResult<Vec<Column>>;
    async fn has_column(&mut self, table: &str, column: &str) -> MigrateResult<bool>;
    async fn add_column(&mut self, table: &str, column: &Column) -> MigrateResult<()>;
    async fn rename_column(
        &mut self,
        table: &str,
        column: &str,
        new_name: &str,
    ) -> MigrateResult<()>;
    async fn change_column(
        &mut self,
        table: &str,
        column: &str,
        new_column: &Column,
    ) -> MigrateResult<()>;
    async fn drop_column(&mut self, table: &str, column: &str) -> MigrateResult<()>;

    // --- indexes ---

    /// Whether an index exists on exactly this column set, order-independent
    async fn has_index(&mut self, table: &str, columns: &[String]) -> MigrateResult<bool>;
    async fn has_index_by_name(&mut self, table: &str, index_name: &str) -> MigrateResult<bool>;
    async fn add_index(&mut self, table: &str, index: &Index) -> MigrateResult<()>;
    /// Resolve the index name by column set and drop it; no match is a no-op
    async fn drop_index(&mut self, table: &str, columns: &[String]) -> MigrateResult<()>;
    async fn drop_index_by_name(&mut self, table: &str, index_name: &str) -> MigrateResult<()>;

    // --- foreign keys ---

    async fn has_foreign_key(
        &mut self,
        table: &str,
        columns: &[String],
        constraint: Option<&str>,
    ) -> MigrateResult<bool>;
    async fn add_foreign_key(&mut self, table: &str, foreign_key: &ForeignKey)
        -> MigrateResult<()>;
    /// Resolve the constraint by name or column set and drop it; no match is
    /// a no-op
    async fn drop_foreign_key(
        &mut self,
        table: &str,
        columns: &[String],
        constraint: Option<&str>,
    ) -> MigrateResult<()>;

    // --- databases ---

    async fn create_database(&mut self, name: &str) -> MigrateResult<()>;
    async fn has_database(&mut self, name: &str) -> MigrateResult<bool>;
    async fn drop_database(&mut self, name: &str) -> MigrateResult<()>;

    // --- raw access for migrations and seeders ---

    /// Execute a raw statement, returning the affected-row count
    async fn execute(&mut self, sql: &str) -> MigrateResult<u64>;

    /// Insert one row of literal values
    async fn insert(&mut self, table: &str, row: &[(String, SqlValue)]) -> MigrateResult<()>;

    // --- type mapping and quoting ---

    /// Map a vocabulary type (plus requested limit) to the engine's native type
    fn sql_type(&self, column_type: ColumnType, limit: Option<u64>) -> MigrateResult<NativeType>;

    /// Map a native type name back to the vocabulary
    fn vocabulary_type(&self, native: &str) -> MigrateResult<ColumnType>;

    /// Quote an identifier in the engine's style
    fn quote_identifier(&self, identifier: &str) -> String;
}

/// Resolve a concrete adapter from a configuration bag, wrapping it with the
/// prefixing decorator when `table_prefix`/`table_suffix` are set.
pub fn resolve_adapter(config: &ConnectionConfig) -> MigrateResult<Box<dyn SchemaAdapter>> {
    let adapter: Box<dyn SchemaAdapter> = match config.adapter.to_lowercase().as_str() {
        "postgres" | "postgresql" | "pgsql" => Box::new(PostgresAdapter::new(config.clone())),
        "mysql" => Box::new(MysqlAdapter::new(config.clone())),
        "" => return Err(MigrateError::configuration("no adapter was specified")),
        other => {
            return Err(MigrateError::configuration(format!(
                "adapter '{}' is not supported",
                other
            )))
        }
    };

    if config.has_table_affix() {
        Ok(Box::new(PrefixAdapter::new(adapter, config)))
    } else {
        Ok(adapter)
    }
}
