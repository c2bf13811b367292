//! In-memory schema adapter for tests
//!
//! Implements the full adapter contract against a hash-map "database":
//! tables with columns/indexes/foreign keys, a version log, and snapshot
//! transaction semantics so a rolled-back unit really leaves no trace.
//! Clone the [`MockHandle`] before handing the adapter to a manager to keep
//! a window into the shared state.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::adapters::dialect::{column_set_covers, column_sets_equal, NativeType, QuoteStyle};
use crate::adapters::SchemaAdapter;
use crate::error::{MigrateError, MigrateResult};
use crate::migrations::{Direction, VersionLogEntry};
use crate::schema::{Column, ColumnType, ForeignKey, Index, SqlValue, Table};

#[derive(Debug, Clone, Default)]
pub struct MockTable {
    pub columns: Vec<Column>,
    /// index name -> columns
    pub indexes: BTreeMap<String, Vec<String>>,
    /// constraint name -> columns
    pub foreign_keys: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default)]
pub struct MockState {
    pub connected: bool,
    pub tables: BTreeMap<String, MockTable>,
    pub log: BTreeMap<i64, VersionLogEntry>,
    pub databases: BTreeSet<String>,
    /// every mutating operation, in call order
    pub op_log: Vec<String>,
    pub begun: usize,
    pub committed: usize,
    pub rolled_back: usize,
    pub record_calls: usize,
    in_transaction: bool,
    snapshot: Option<(BTreeMap<String, MockTable>, BTreeMap<i64, VersionLogEntry>)>,
}

/// Shared view into a [`MockAdapter`]'s state
#[derive(Clone, Default)]
pub struct MockHandle(Arc<Mutex<MockState>>);

impl MockHandle {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.0.lock().unwrap()
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.lock().tables.contains_key(name)
    }

    pub fn table_columns(&self, name: &str) -> Vec<String> {
        self.lock()
            .tables
            .get(name)
            .map(|t| t.columns.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn versions(&self) -> Vec<i64> {
        self.lock().log.keys().copied().collect()
    }

    pub fn op_log(&self) -> Vec<String> {
        self.lock().op_log.clone()
    }

    pub fn record_calls(&self) -> usize {
        self.lock().record_calls
    }

    pub fn transaction_counts(&self) -> (usize, usize, usize) {
        let state = self.lock();
        (state.begun, state.committed, state.rolled_back)
    }

    /// Seed a log row directly, simulating an earlier run
    pub fn insert_log_entry(&self, version: i64, name: &str) {
        let now = Utc::now();
        self.lock().log.insert(
            version,
            VersionLogEntry {
                version,
                migration_name: Some(name.to_string()),
                start_time: now,
                end_time: now,
                breakpoint: false,
            },
        );
    }

    pub fn remove_log_entry(&self, version: i64) {
        self.lock().log.remove(&version);
    }

    /// Seed a table directly
    pub fn add_table(&self, name: &str, table: MockTable) {
        self.lock().tables.insert(name.to_string(), table);
    }

    pub fn remove_table(&self, name: &str) {
        self.lock().tables.remove(name);
    }
}

/// In-memory [`SchemaAdapter`]
pub struct MockAdapter {
    state: MockHandle,
    transactional: bool,
}

impl MockAdapter {
    pub fn new() -> Self {
        Self {
            state: MockHandle::default(),
            transactional: true,
        }
    }

    /// Behave like an engine whose DDL cannot be wrapped in a transaction
    pub fn non_transactional() -> Self {
        Self {
            state: MockHandle::default(),
            transactional: false,
        }
    }

    pub fn handle(&self) -> MockHandle {
        self.state.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock()
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn default_index_name(table: &str, columns: &[String]) -> String {
    format!("{}_{}", table, columns.join("_"))
}

#[async_trait]
impl SchemaAdapter for MockAdapter {
    async fn connect(&mut self) -> MigrateResult<()> {
        self.lock().connected = true;
        Ok(())
    }

    async fn disconnect(&mut self) -> MigrateResult<()> {
        self.lock().connected = false;
        Ok(())
    }

    fn has_transactions(&self) -> bool {
        self.transactional
    }

    async fn begin_transaction(&mut self) -> MigrateResult<()> {
        let mut state = self.lock();
        if state.in_transaction {
            return Err(MigrateError::execution("transaction already open"));
        }
        state.in_transaction = true;
        state.begun += 1;
        state.snapshot = Some((state.tables.clone(), state.log.clone()));
        Ok(())
    }

    async fn commit_transaction(&mut self) -> MigrateResult<()> {
        let mut state = self.lock();
        if !state.in_transaction {
            return Err(MigrateError::execution("no open transaction to commit"));
        }
        state.in_transaction = false;
        state.committed += 1;
        state.snapshot = None;
        Ok(())
    }

    async fn rollback_transaction(&mut self) -> MigrateResult<()> {
        let mut state = self.lock();
        if !state.in_transaction {
            return Err(MigrateError::execution("no open transaction to roll back"));
        }
        state.in_transaction = false;
        state.rolled_back += 1;
        if let Some((tables, log)) = state.snapshot.take() {
            state.tables = tables;
            state.log = log;
        }
        Ok(())
    }

    async fn create_schema_table(&mut self) -> MigrateResult<()> {
        Ok(())
    }

    async fn get_versions(&mut self) -> MigrateResult<Vec<i64>> {
        Ok(self.lock().log.keys().copied().collect())
    }

    async fn get_version_log(&mut self) -> MigrateResult<BTreeMap<i64, VersionLogEntry>> {
        Ok(self.lock().log.clone())
    }

    async fn record_migrated(
        &mut self,
        version: i64,
        name: &str,
        direction: Direction,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> MigrateResult<()> {
        let mut state = self.lock();
        state.record_calls += 1;
        match direction {
            Direction::Up => {
                state.log.insert(
                    version,
                    VersionLogEntry {
                        version,
                        migration_name: Some(name.to_string()),
                        start_time,
                        end_time,
                        breakpoint: false,
                    },
                );
            }
            Direction::Down => {
                state.log.remove(&version);
            }
        }
        Ok(())
    }

    async fn has_table(&mut self, table: &str) -> MigrateResult<bool> {
        Ok(self.lock().tables.contains_key(table))
    }

    async fn create_table(&mut self, table: &Table) -> MigrateResult<()> {
        let mut state = self.lock();
        if state.tables.contains_key(table.name()) {
            return Err(MigrateError::execution(format!(
                "table '{}' already exists",
                table.name()
            )));
        }

        let mut columns: Vec<Column> = Vec::new();
        if let Some(id) = table.injected_identity_column() {
            columns.push(Column::integer(id).identity());
        }
        columns.extend(table.columns().iter().cloned());

        let mut mock = MockTable {
            columns,
            ..MockTable::default()
        };
        for index in table.indexes() {
            let name = index
                .name
                .clone()
                .unwrap_or_else(|| default_index_name(table.name(), &index.columns));
            mock.indexes.insert(name, index.columns.clone());
        }
        for foreign_key in table.foreign_keys() {
            let name = foreign_key
                .constraint
                .clone()
                .unwrap_or_else(|| format!("{}_{}_fk", table.name(), foreign_key.columns.join("_")));
            mock.foreign_keys.insert(name, foreign_key.columns.clone());
        }

        state.op_log.push(format!("create_table {}", table.name()));
        state.tables.insert(table.name().to_string(), mock);
        Ok(())
    }

    async fn rename_table(&mut self, table: &str, new_name: &str) -> MigrateResult<()> {
        let mut state = self.lock();
        let mock = state
            .tables
            .remove(table)
            .ok_or_else(|| MigrateError::execution(format!("table '{}' does not exist", table)))?;
        state.tables.insert(new_name.to_string(), mock);
        state
            .op_log
            .push(format!("rename_table {} {}", table, new_name));
        Ok(())
    }

    async fn drop_table(&mut self, table: &str) -> MigrateResult<()> {
        let mut state = self.lock();
        state
            .tables
            .remove(table)
            .ok_or_else(|| MigrateError::execution(format!("table '{}' does not exist", table)))?;
        state.op_log.push(format!("drop_table {}", table));
        Ok(())
    }

    async fn get_columns(&mut self, table: &str) -> MigrateResult<Vec<Column>> {
        let state = self.lock();
        state
            .tables
            .get(table)
            .map(|t| t.columns.clone())
            .ok_or_else(|| MigrateError::execution(format!("table '{}' does not exist", table)))
    }

    async fn has_column(&mut self, table: &str, column: &str) -> MigrateResult<bool> {
        let state = self.lock();
        Ok(state
            .tables
            .get(table)
            .is_some_and(|t| t.columns.iter().any(|c| c.name == column)))
    }

    async fn add_column(&mut self, table: &str, column: &Column) -> MigrateResult<()> {
        let mut state = self.lock();
        let mock = state
            .tables
            .get_mut(table)
            .ok_or_else(|| MigrateError::execution(format!("table '{}' does not exist", table)))?;
        if mock.columns.iter().any(|c| c.name == column.name) {
            return Err(MigrateError::execution(format!(
                "column '{}' already exists on '{}'",
                column.name, table
            )));
        }
        mock.columns.push(column.clone());
        state
            .op_log
            .push(format!("add_column {} {}", table, column.name));
        Ok(())
    }

    async fn rename_column(
        &mut self,
        table: &str,
        column: &str,
        new_name: &str,
    ) -> MigrateResult<()> {
        let mut state = self.lock();
        let mock = state
            .tables
            .get_mut(table)
            .ok_or_else(|| MigrateError::execution(format!("table '{}' does not exist", table)))?;
        let found = mock
            .columns
            .iter_mut()
            .find(|c| c.name == column)
            .ok_or_else(|| {
                MigrateError::execution(format!(
                    "column '{}' does not exist on '{}'",
                    column, table
                ))
            })?;
        found.name = new_name.to_string();
        state
            .op_log
            .push(format!("rename_column {} {} {}", table, column, new_name));
        Ok(())
    }

    async fn change_column(
        &mut self,
        table: &str,
        column: &str,
        new_column: &Column,
    ) -> MigrateResult<()> {
        let mut state = self.lock();
        let mock = state
            .tables
            .get_mut(table)
            .ok_or_else(|| MigrateError::execution(format!("table '{}' does not exist", table)))?;
        let found = mock
            .columns
            .iter_mut()
            .find(|c| c.name == column)
            .ok_or_else(|| {
                MigrateError::execution(format!(
                    "column '{}' does not exist on '{}'",
                    column, table
                ))
            })?;
        *found = new_column.clone();
        state
            .op_log
            .push(format!("change_column {} {}", table, column));
        Ok(())
    }

    async fn drop_column(&mut self, table: &str, column: &str) -> MigrateResult<()> {
        let mut state = self.lock();
        let mock = state
            .tables
            .get_mut(table)
            .ok_or_else(|| MigrateError::execution(format!("table '{}' does not exist", table)))?;
        let before = mock.columns.len();
        mock.columns.retain(|c| c.name != column);
        if mock.columns.len() == before {
            return Err(MigrateError::execution(format!(
                "column '{}' does not exist on '{}'",
                column, table
            )));
        }
        state
            .op_log
            .push(format!("drop_column {} {}", table, column));
        Ok(())
    }

    async fn has_index(&mut self, table: &str, columns: &[String]) -> MigrateResult<bool> {
        let state = self.lock();
        Ok(state.tables.get(table).is_some_and(|t| {
            t.indexes
                .values()
                .any(|index_columns| column_sets_equal(index_columns, columns))
        }))
    }

    async fn has_index_by_name(&mut self, table: &str, index_name: &str) -> MigrateResult<bool> {
        let state = self.lock();
        Ok(state
            .tables
            .get(table)
            .is_some_and(|t| t.indexes.contains_key(index_name)))
    }

    async fn add_index(&mut self, table: &str, index: &Index) -> MigrateResult<()> {
        let mut state = self.lock();
        let name = index
            .name
            .clone()
            .unwrap_or_else(|| default_index_name(table, &index.columns));
        let mock = state
            .tables
            .get_mut(table)
            .ok_or_else(|| MigrateError::execution(format!("table '{}' does not exist", table)))?;
        mock.indexes.insert(name.clone(), index.columns.clone());
        state.op_log.push(format!("add_index {} {}", table, name));
        Ok(())
    }

    async fn drop_index(&mut self, table: &str, columns: &[String]) -> MigrateResult<()> {
        let mut state = self.lock();
        let Some(mock) = state.tables.get_mut(table) else {
            return Ok(());
        };
        let matched = mock
            .indexes
            .iter()
            .find(|(_, index_columns)| column_set_covers(index_columns, columns))
            .map(|(name, _)| name.clone());
        if let Some(name) = matched {
            mock.indexes.remove(&name);
            state.op_log.push(format!("drop_index {} {}", table, name));
        }
        Ok(())
    }

    async fn drop_index_by_name(&mut self, table: &str, index_name: &str) -> MigrateResult<()> {
        let mut state = self.lock();
        if let Some(mock) = state.tables.get_mut(table) {
            if mock.indexes.remove(index_name).is_some() {
                state
                    .op_log
                    .push(format!("drop_index {} {}", table, index_name));
            }
        }
        Ok(())
    }

    async fn has_foreign_key(
        &mut self,
        table: &str,
        columns: &[String],
        constraint: Option<&str>,
    ) -> MigrateResult<bool> {
        let state = self.lock();
        let Some(mock) = state.tables.get(table) else {
            return Ok(false);
        };
        match constraint {
            Some(name) => Ok(mock.foreign_keys.contains_key(name)),
            None => Ok(mock
                .foreign_keys
                .values()
                .any(|key_columns| column_sets_equal(key_columns, columns))),
        }
    }

    async fn add_foreign_key(
        &mut self,
        table: &str,
        foreign_key: &ForeignKey,
    ) -> MigrateResult<()> {
        let mut state = self.lock();
        let name = foreign_key
            .constraint
            .clone()
            .unwrap_or_else(|| format!("{}_{}_fk", table, foreign_key.columns.join("_")));
        let mock = state
            .tables
            .get_mut(table)
            .ok_or_else(|| MigrateError::execution(format!("table '{}' does not exist", table)))?;
        mock.foreign_keys
            .insert(name.clone(), foreign_key.columns.clone());
        state
            .op_log
            .push(format!("add_foreign_key {} {}", table, name));
        Ok(())
    }

    async fn drop_foreign_key(
        &mut self,
        table: &str,
        columns: &[String],
        constraint: Option<&str>,
    ) -> MigrateResult<()> {
        let mut state = self.lock();
        let Some(mock) = state.tables.get_mut(table) else {
            return Ok(());
        };
        let names: Vec<String> = match constraint {
            Some(name) => {
                if mock.foreign_keys.contains_key(name) {
                    vec![name.to_string()]
                } else {
                    Vec::new()
                }
            }
            None => mock
                .foreign_keys
                .iter()
                .filter(|(_, key_columns)| column_set_covers(key_columns, columns))
                .map(|(name, _)| name.clone())
                .collect(),
        };
        for name in &names {
            mock.foreign_keys.remove(name);
        }
        for name in names {
            state
                .op_log
                .push(format!("drop_foreign_key {} {}", table, name));
        }
        Ok(())
    }

    async fn create_database(&mut self, name: &str) -> MigrateResult<()> {
        self.lock().databases.insert(name.to_string());
        Ok(())
    }

    async fn has_database(&mut self, name: &str) -> MigrateResult<bool> {
        Ok(self.lock().databases.contains(name))
    }

    async fn drop_database(&mut self, name: &str) -> MigrateResult<()> {
        self.lock().databases.remove(name);
        Ok(())
    }

    async fn execute(&mut self, sql: &str) -> MigrateResult<u64> {
        self.lock().op_log.push(format!("execute {}", sql));
        Ok(0)
    }

    async fn insert(&mut self, table: &str, row: &[(String, SqlValue)]) -> MigrateResult<()> {
        let columns: Vec<&str> = row.iter().map(|(name, _)| name.as_str()).collect();
        self.lock()
            .op_log
            .push(format!("insert {} ({})", table, columns.join(", ")));
        Ok(())
    }

    fn sql_type(&self, column_type: ColumnType, limit: Option<u64>) -> MigrateResult<NativeType> {
        Ok(NativeType {
            name: column_type.as_str().to_string(),
            limit,
        })
    }

    fn vocabulary_type(&self, _native: &str) -> MigrateResult<ColumnType> {
        Ok(ColumnType::String)
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        QuoteStyle::DoubleQuote.quote(identifier)
    }
}
