//! Recording adapter for reversible migrations
//!
//! Wraps the real adapter while a reversible `change()` routine runs in DOWN
//! mode: every mutating vocabulary call is recorded instead of executed,
//! read-only calls pass through so the routine can branch on live schema
//! state, and [`RecordingAdapter::execute_inverted`] then replays the inverse
//! of the recorded sequence, in reverse order, against the wrapped adapter.
//!
//! Operations whose prior state is not captured (`change_column`, the
//! `drop_*` family, raw statements) have no inverse; recording one fails with
//! an irreversibility error instead of silently skipping it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{MigrateError, MigrateResult};
use crate::migrations::{Direction, VersionLogEntry};
use crate::schema::{Column, ColumnType, ForeignKey, Index, SqlValue, Table};

use super::dialect::NativeType;
use super::SchemaAdapter;

/// One recorded mutating call
#[derive(Debug, Clone)]
pub enum RecordedCommand {
    CreateTable(Table),
    RenameTable { table: String, new_name: String },
    AddColumn { table: String, column: Column },
    RenameColumn { table: String, column: String, new_name: String },
    AddIndex { table: String, index: Index },
    AddForeignKey { table: String, foreign_key: ForeignKey },
}

/// Adapter wrapper that records mutations for inverted playback
pub struct RecordingAdapter<'a> {
    inner: &'a mut dyn SchemaAdapter,
    commands: Vec<RecordedCommand>,
}

impl<'a> RecordingAdapter<'a> {
    /// Wrap the given adapter
    pub fn new(inner: &'a mut dyn SchemaAdapter) -> Self {
        Self {
            inner,
            commands: Vec::new(),
        }
    }

    /// The commands recorded so far, in call order
    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Execute the inverse of every recorded command, in reverse order,
    /// against the wrapped adapter.
    pub async fn execute_inverted(self) -> MigrateResult<()> {
        let Self { inner, commands } = self;
        for command in commands.into_iter().rev() {
            match command {
                RecordedCommand::CreateTable(table) => {
                    inner.drop_table(table.name()).await?;
                }
                RecordedCommand::RenameTable { table, new_name } => {
                    inner.rename_table(&new_name, &table).await?;
                }
                RecordedCommand::AddColumn { table, column } => {
                    inner.drop_column(&table, &column.name).await?;
                }
                RecordedCommand::RenameColumn {
                    table,
                    column,
                    new_name,
                } => {
                    inner.rename_column(&table, &new_name, &column).await?;
                }
                RecordedCommand::AddIndex { table, index } => {
                    inner.drop_index(&table, &index.columns).await?;
                }
                RecordedCommand::AddForeignKey {
                    table,
                    foreign_key,
                } => {
                    inner
                        .drop_foreign_key(
                            &table,
                            &foreign_key.columns,
                            foreign_key.constraint.as_deref(),
                        )
                        .await?;
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SchemaAdapter for RecordingAdapter<'_> {
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
        self.inner.has_table(table).await
    }

    async fn create_table(&mut self, table: &Table) -> MigrateResult<()> {
        self.commands
            .push(RecordedCommand::CreateTable(table.clone()));
        Ok(())
    }

    async fn rename_table(&mut self, table: &str, new_name: &str) -> MigrateResult<()> {
        self.commands.push(RecordedCommand::RenameTable {
            table: table.to_string(),
            new_name: new_name.to_string(),
        });
        Ok(())
    }

    async fn drop_table(&mut self, _table: &str) -> MigrateResult<()> {
        Err(MigrateError::irreversible("drop_table"))
    }

    async fn get_columns(&mut self, table: &str) -> MigrateResult<Vec<Column>> {
        self.inner.get_columns(table).await
    }

    async fn has_column(&mut self, table: &str, column: &str) -> MigrateResult<bool> {
        self.inner.has_column(table, column).await
    }

    async fn add_column(&mut self, table: &str, column: &Column) -> MigrateResult<()> {
        self.commands.push(RecordedCommand::AddColumn {
            table: table.to_string(),
            column: column.clone(),
        });
        Ok(())
    }

    async fn rename_column(
        &mut self,
        table: &str,
        column: &str,
        new_name: &str,
    ) -> MigrateResult<()> {
        self.commands.push(RecordedCommand::RenameColumn {
            table: table.to_string(),
            column: column.to_string(),
            new_name: new_name.to_string(),
        });
        Ok(())
    }

    async fn change_column(
        &mut self,
        _table: &str,
        _column: &str,
        _new_column: &Column,
    ) -> MigrateResult<()> {
        Err(MigrateError::irreversible("change_column"))
    }

    async fn drop_column(&mut self, _table: &str, _column: &str) -> MigrateResult<()> {
        Err(MigrateError::irreversible("drop_column"))
    }

    async fn has_index(&mut self, table: &str, columns: &[String]) -> MigrateResult<bool> {
        self.inner.has_index(table, columns).await
    }

    async fn has_index_by_name(&mut self, table: &str, index_name: &str) -> MigrateResult<bool> {
        self.inner.has_index_by_name(table, index_name).await
    }

    async fn add_index(&mut self, table: &str, index: &Index) -> MigrateResult<()> {
        self.commands.push(RecordedCommand::AddIndex {
            table: table.to_string(),
            index: index.clone(),
        });
        Ok(())
    }

    async fn drop_index(&mut self, _table: &str, _columns: &[String]) -> MigrateResult<()> {
        Err(MigrateError::irreversible("drop_index"))
    }

    async fn drop_index_by_name(&mut self, _table: &str, _index_name: &str) -> MigrateResult<()> {
        Err(MigrateError::irreversible("drop_index_by_name"))
    }

    async fn has_foreign_key(
        &mut self,
        table: &str,
        columns: &[String],
        constraint: Option<&str>,
    ) -> MigrateResult<bool> {
        self.inner.has_foreign_key(table, columns, constraint).await
    }

    async fn add_foreign_key(
        &mut self,
        table: &str,
        foreign_key: &ForeignKey,
    ) -> MigrateResult<()> {
        self.commands.push(RecordedCommand::AddForeignKey {
            table: table.to_string(),
            foreign_key: foreign_key.clone(),
        });
        Ok(())
    }

    async fn drop_foreign_key(
        &mut self,
        _table: &str,
        _columns: &[String],
        _constraint: Option<&str>,
    ) -> MigrateResult<()> {
        Err(MigrateError::irreversible("drop_foreign_key"))
    }

    async fn create_database(&mut self, _name: &str) -> MigrateResult<()> {
        Err(MigrateError::irreversible("create_database"))
    }

    async fn has_database(&mut self, name: &str) -> MigrateResult<bool> {
        self.inner.has_database(name).await
    }

    async fn drop_database(&mut self, _name: &str) -> MigrateResult<()> {
        Err(MigrateError::irreversible("drop_database"))
    }

    async fn execute(&mut self, _sql: &str) -> MigrateResult<u64> {
        Err(MigrateError::irreversible("execute"))
    }

    async fn insert(&mut self, _table: &str, _row: &[(String, SqlValue)]) -> MigrateResult<()> {
        Err(MigrateError::irreversible("insert"))
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
