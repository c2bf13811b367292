//! Table prefix/suffix decorator
//!
//! Rewrites every table-name argument (including foreign-key referenced
//! tables) with the configured prefix/suffix before delegating to the inner
//! adapter. The version-log table is owned by the inner adapter and is not
//! rewritten.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::ConnectionConfig;
use crate::error::MigrateResult;
use crate::migrations::{Direction, VersionLogEntry};
use crate::schema::{Column, ColumnType, ForeignKey, Index, SqlValue, Table};

use super::dialect::NativeType;
use super::SchemaAdapter;

/// Adapter decorator applying `table_prefix`/`table_suffix`
pub struct PrefixAdapter {
    inner: Box<dyn SchemaAdapter>,
    prefix: String,
    suffix: String,
}

impl PrefixAdapter {
    /// Wrap the given adapter with the affixes from the configuration
    pub fn new(inner: Box<dyn SchemaAdapter>, config: &ConnectionConfig) -> Self {
        Self {
            inner,
            prefix: config.table_prefix.clone().unwrap_or_default(),
            suffix: config.table_suffix.clone().unwrap_or_default(),
        }
    }

    fn adjust(&self, table: &str) -> String {
        format!("{}{}{}", self.prefix, table, self.suffix)
    }

    fn adjust_table(&self, table: &Table) -> Table {
        let mut adjusted = table.renamed(&self.adjust(table.name()));
        adjusted.rewrite_foreign_keys(|fk| fk.referenced_table = self.adjust(&fk.referenced_table));
        adjusted
    }

    fn adjust_foreign_key(&self, foreign_key: &ForeignKey) -> ForeignKey {
        let mut adjusted = foreign_key.clone();
        adjusted.referenced_table = self.adjust(&adjusted.referenced_table);
        adjusted
    }
}

#[async_trait]
impl SchemaAdapter for PrefixAdapter {
    async fn connect(&mut self) -> MigrateResult<()> {
        self.inner.connect().await
    }

    async fn disconnect(&mut self) -> MigrateResult<()> {
        self.inner.disconnect().await
    }

    fn has_transactions(&self) -> bool {
        self.inner.has_transactions()
    }

    async fn begin_transaction(&mut self) -> MigrateResult<()> {
        self.inner.begin_transaction().await
    }

    async fn commit_transaction(&mut self) -> MigrateResult<()> {
        self.inner.commit_transaction().await
    }

    async fn rollback_transaction(&mut self) -> MigrateResult<()> {
        self.inner.rollback_transaction().await
    }

    async fn create_schema_table(&mut self) -> MigrateResult<()> {
        self.inner.create_schema_table().await
    }

    async fn get_versions(&mut self) -> MigrateResult<Vec<i64>> {
        self.inner.get_versions().await
    }

    async fn get_version_log(&mut self) -> MigrateResult<BTreeMap<i64, VersionLogEntry>> {
        self.inner.get_version_log().await
    }

    async fn record_migrated(
        &mut self,
        version: i64,
        name: &str,
        direction: Direction,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> MigrateResult<()> {
        self.inner
            .record_migrated(version, name, direction, start_time, end_time)
            .await
    }

    async fn has_table(&mut self, table: &str) -> MigrateResult<bool> {
        let table = self.adjust(table);
        self.inner.has_table(&table).await
    }

    async fn create_table(&mut self, table: &Table) -> MigrateResult<()> {
        let table = self.adjust_table(table);
        self.inner.create_table(&table).await
    }

    async fn rename_table(&mut self, table: &str, new_name: &str) -> MigrateResult<()> {
        let table = self.adjust(table);
        let new_name = self.adjust(new_name);
        self.inner.rename_table(&table, &new_name).await
    }

    async fn drop_table(&mut self, table: &str) -> MigrateResult<()> {
        let table = self.adjust(table);
        self.inner.drop_table(&table).await
    }

    async fn get_columns(&mut self, table: &str) -> MigrateResult<Vec<Column>> {
        let table = self.adjust(table);
        self.inner.get_columns(&table).await
    }

    async fn has_column(&mut self, table: &str, column: &str) -> MigrateResult<bool> {
        let table = self.adjust(table);
        self.inner.has_column(&table, column).await
    }

    async fn add_column(&mut self, table: &str, column: &Column) -> MigrateResult<()> {
        let table = self.adjust(table);
        self.inner.add_column(&table, column).await
    }

    async fn rename_column(
        &mut self,
        table: &str,
        column: &str,
        new_name: &str,
    ) -> MigrateResult<()> {
        let table = self.adjust(table);
        self.inner.rename_column(&table, column, new_name).await
    }

    async fn change_column(
        &mut self,
        table: &str,
        column: &str,
        new_column: &Column,
    ) -> MigrateResult<()> {
        let table = self.adjust(table);
        self.inner.change_column(&table, column, new_column).await
    }

    async fn drop_column(&mut self, table: &str, column: &str) -> MigrateResult<()> {
        let table = self.adjust(table);
        self.inner.drop_column(&table, column).await
    }

    async fn has_index(&mut self, table: &str, columns: &[String]) -> MigrateResult<bool> {
        let table = self.adjust(table);
        self.inner.has_index(&table, columns).await
    }

    async fn has_index_by_name(&mut self, table: &str, index_name: &str) -> MigrateResult<bool> {
        let table = self.adjust(table);
        self.inner.has_index_by_name(&table, index_name).await
    }

    async fn add_index(&mut self, table: &str, index: &Index) -> MigrateResult<()> {
        let table = self.adjust(table);
        self.inner.add_index(&table, index).await
    }

    async fn drop_index(&mut self, table: &str, columns: &[String]) -> MigrateResult<()> {
        let table = self.adjust(table);
        self.inner.drop_index(&table, columns).await
    }

    async fn drop_index_by_name(&mut self, table: &str, index_name: &str) -> MigrateResult<()> {
        let table = self.adjust(table);
        self.inner.drop_index_by_name(&table, index_name).await
    }

    async fn has_foreign_key(
        &mut self,
        table: &str,
        columns: &[String],
        constraint: Option<&str>,
    ) -> MigrateResult<bool> {
        let table = self.adjust(table);
        self.inner
            .has_foreign_key(&table, columns, constraint)
            .await
    }

    async fn add_foreign_key(
        &mut self,
        table: &str,
        foreign_key: &ForeignKey,
    ) -> MigrateResult<()> {
        let table = self.adjust(table);
        let foreign_key = self.adjust_foreign_key(foreign_key);
        self.inner.add_foreign_key(&table, &foreign_key).await
    }

    async fn drop_foreign_key(
        &mut self,
        table: &str,
        columns: &[String],
        constraint: Option<&str>,
    ) -> MigrateResult<()> {
        let table = self.adjust(table);
        self.inner
            .drop_foreign_key(&table, columns, constraint)
            .await
    }

    async fn create_database(&mut self, name: &str) -> MigrateResult<()> {
        self.inner.create_database(name).await
    }

    async fn has_database(&mut self, name: &str) -> MigrateResult<bool> {
        self.inner.has_database(name).await
    }

    async fn drop_database(&mut self, name: &str) -> MigrateResult<()> {
        self.inner.drop_database(name).await
    }

    async fn execute(&mut self, sql: &str) -> MigrateResult<u64> {
        self.inner.execute(sql).await
    }

    async fn insert(&mut self, table: &str, row: &[(String, SqlValue)]) -> MigrateResult<()> {
        let table = self.adjust(table);
        self.inner.insert(&table, row).await
    }

    fn sql_type(&self, column_type: ColumnType, limit: Option<u64>) -> MigrateResult<NativeType> {
        self.inner.sql_type(column_type, limit)
    }

    fn vocabulary_type(&self, native: &str) -> MigrateResult<ColumnType> {
        self.inner.vocabulary_type(native)
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        self.inner.quote_identifier(identifier)
    }
}
