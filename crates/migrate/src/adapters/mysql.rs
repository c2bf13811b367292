//! MySQL dialect adapter
//!
//! MySQL exposes several overlapping-capacity native types for text, blob
//! and integer columns; requested limits are resolved through the shared
//! tier scan. DDL causes an implicit commit on MySQL, so `has_transactions`
//! is false and the manager runs each unit without a transaction wrapper.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlConnectOptions;
use sqlx::{Connection, MySqlConnection, Row};

use crate::config::ConnectionConfig;
use crate::error::{MigrateError, MigrateResult};
use crate::migrations::{Direction, VersionLogEntry};
use crate::schema::{Column, ColumnType, ForeignKey, Index, SqlValue, Table};

use super::dialect::{
    column_set_covers, column_sets_equal, select_size_tier, NativeType, QuoteStyle, SizeTier,
};
use super::SchemaAdapter;

const QUOTING: QuoteStyle = QuoteStyle::Backtick;

// Size must always be tested from largest to smallest.
const TEXT_TIERS: &[SizeTier] = &[
    SizeTier { name: "longtext", capacity: 4_294_967_295, display_limit: None },
    SizeTier { name: "mediumtext", capacity: 16_777_215, display_limit: None },
    SizeTier { name: "text", capacity: 65_535, display_limit: None },
    SizeTier { name: "tinytext", capacity: 255, display_limit: None },
];

const BLOB_TIERS: &[SizeTier] = &[
    SizeTier { name: "longblob", capacity: 4_294_967_295, display_limit: None },
    SizeTier { name: "mediumblob", capacity: 16_777_215, display_limit: None },
    SizeTier { name: "blob", capacity: 65_535, display_limit: None },
    SizeTier { name: "tinyblob", capacity: 255, display_limit: None },
];

const INT_TIERS: &[SizeTier] = &[
    SizeTier { name: "bigint", capacity: 18_446_744_073_709_551_615, display_limit: Some(20) },
    SizeTier { name: "int", capacity: 4_294_967_295, display_limit: Some(11) },
    SizeTier { name: "mediumint", capacity: 16_777_215, display_limit: Some(9) },
    SizeTier { name: "smallint", capacity: 65_535, display_limit: Some(6) },
    SizeTier { name: "tinyint", capacity: 255, display_limit: Some(4) },
];

/// Smallest tier capacity; limits below this are display widths, not sizes
const INT_TINY: u64 = 255;

/// Adapter for MySQL-family engines
pub struct MysqlAdapter {
    config: ConnectionConfig,
    connection: Option<MySqlConnection>,
    schema_table_ensured: bool,
}

impl MysqlAdapter {
    /// Create a disconnected adapter for the given target
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            connection: None,
            schema_table_ensured: false,
        }
    }

    fn connect_options(&self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&self.config.host)
            .username(&self.config.user);
        if let Some(port) = self.config.port {
            options = options.port(port);
        }
        if let Some(pass) = &self.config.pass {
            options = options.password(pass);
        }
        if let Some(charset) = &self.config.charset {
            options = options.charset(charset);
        }
        options
    }

    fn conn(&mut self) -> MigrateResult<&mut MySqlConnection> {
        self.connection
            .as_mut()
            .ok_or_else(|| MigrateError::connection("adapter is not connected"))
    }

    async fn run(&mut self, sql: &str) -> MigrateResult<u64> {
        tracing::debug!(target: "strata_migrate::sql", "{}", sql);
        let conn = self.conn()?;
        let result = sqlx::query(sql)
            .execute(&mut *conn)
            .await
            .map_err(|e| MigrateError::execution_with_sql(e, sql))?;
        Ok(result.rows_affected())
    }

    async fn indexes_of(&mut self, table: &str) -> MigrateResult<BTreeMap<String, Vec<String>>> {
        let sql = "SELECT index_name, column_name FROM information_schema.statistics \
                   WHERE table_schema = ? AND table_name = ? ORDER BY seq_in_index";
        let database = self.config.name.clone();
        let conn = self.conn()?;
        let rows = sqlx::query(sql)
            .bind(&database)
            .bind(table)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| MigrateError::execution_with_sql(e, sql))?;

        let mut indexes: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in rows {
            let name: String = row.try_get(0).map_err(MigrateError::execution)?;
            let column: String = row.try_get(1).map_err(MigrateError::execution)?;
            indexes.entry(name).or_default().push(column);
        }
        Ok(indexes)
    }

    async fn foreign_keys_of(
        &mut self,
        table: &str,
    ) -> MigrateResult<BTreeMap<String, Vec<String>>> {
        let sql = "SELECT constraint_name, column_name FROM information_schema.key_column_usage \
                   WHERE table_schema = ? AND table_name = ? \
                   AND referenced_table_name IS NOT NULL ORDER BY ordinal_position";
        let database = self.config.name.clone();
        let conn = self.conn()?;
        let rows = sqlx::query(sql)
            .bind(&database)
            .bind(table)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| MigrateError::execution_with_sql(e, sql))?;

        let mut keys: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in rows {
            let name: String = row.try_get(0).map_err(MigrateError::execution)?;
            let column: String = row.try_get(1).map_err(MigrateError::execution)?;
            keys.entry(name).or_default().push(column);
        }
        Ok(keys)
    }

    async fn ensure_schema_table(&mut self) -> MigrateResult<()> {
        if !self.schema_table_ensured {
            self.create_schema_table().await?;
            self.schema_table_ensured = true;
        }
        Ok(())
    }

    fn column_sql(&self, column: &Column) -> MigrateResult<String> {
        let mut buffer: Vec<String> = Vec::new();

        if column.identity {
            // auto-increment bypasses generic type mapping entirely
            let fragment = if column.column_type == ColumnType::BigInteger {
                "BIGINT(20)"
            } else {
                "INT(11)"
            };
            buffer.push(fragment.to_string());
            if !column.signed {
                buffer.push("UNSIGNED".to_string());
            }
            buffer.push("NOT NULL AUTO_INCREMENT".to_string());
            return Ok(buffer.join(" "));
        }

        let native = self.sql_type(column.column_type, column.limit)?;
        let mut type_sql = native.name.to_uppercase();
        if column.column_type == ColumnType::Decimal
            && (column.precision.is_some() || column.scale.is_some())
        {
            type_sql.push_str(&format!(
                "({}, {})",
                column.precision.unwrap_or(18),
                column.scale.unwrap_or(0)
            ));
        } else if matches!(column.column_type, ColumnType::Enum | ColumnType::Set) {
            let values = column.values.as_ref().ok_or_else(|| {
                MigrateError::validation(format!(
                    "column '{}' of type '{}' requires a value list",
                    column.name, column.column_type
                ))
            })?;
            let rendered: Vec<String> = values
                .iter()
                .map(|v| SqlValue::from(v.as_str()).to_sql())
                .collect();
            type_sql.push_str(&format!("({})", rendered.join(", ")));
        } else if let Some(limit) = native.limit {
            type_sql.push_str(&format!("({})", limit));
        }
        buffer.push(type_sql);

        if !column.signed
            && matches!(
                column.column_type,
                ColumnType::Integer
                    | ColumnType::BigInteger
                    | ColumnType::Float
                    | ColumnType::Decimal
            )
        {
            buffer.push("UNSIGNED".to_string());
        }

        buffer.push(if column.null { "NULL" } else { "NOT NULL" }.to_string());

        if let Some(default) = &column.default {
            buffer.push(format!("DEFAULT {}", default.to_sql()));
        }
        if let Some(comment) = &column.comment {
            buffer.push(format!(
                "COMMENT {}",
                SqlValue::from(comment.as_str()).to_sql()
            ));
        }

        Ok(buffer.join(" "))
    }

    fn index_sql(&self, table: &str, index: &Index) -> String {
        let name = index
            .name
            .clone()
            .unwrap_or_else(|| format!("{}_{}", table, index.columns.join("_")));
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if index.unique { "UNIQUE " } else { "" },
            QUOTING.quote(&name),
            QUOTING.quote(table),
            QUOTING.quote_list(&index.columns)
        )
    }

    fn foreign_key_sql(&self, table: &str, foreign_key: &ForeignKey) -> String {
        let mut sql = format!("ALTER TABLE {} ADD ", QUOTING.quote(table));
        if let Some(constraint) = &foreign_key.constraint {
            sql.push_str(&format!("CONSTRAINT {} ", QUOTING.quote(constraint)));
        }
        sql.push_str(&format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            QUOTING.quote_list(&foreign_key.columns),
            QUOTING.quote(&foreign_key.referenced_table),
            QUOTING.quote_list(&foreign_key.referenced_columns)
        ));
        if let Some(action) = foreign_key.on_delete {
            sql.push_str(&format!(" ON DELETE {}", action.as_sql()));
        }
        if let Some(action) = foreign_key.on_update {
            sql.push_str(&format!(" ON UPDATE {}", action.as_sql()));
        }
        sql
    }

    fn create_table_sql(&self, table: &Table) -> MigrateResult<String> {
        let mut columns: Vec<Column> = Vec::new();
        if let Some(id) = table.injected_identity_column() {
            columns.push(Column::integer(id).identity());
        }
        columns.extend(table.columns().iter().cloned());

        let mut parts = Vec::with_capacity(columns.len() + 1);
        for column in &columns {
            parts.push(format!(
                "{} {}",
                QUOTING.quote(&column.name),
                self.column_sql(column)?
            ));
        }

        let primary_key = table.effective_primary_key();
        if !primary_key.is_empty() {
            parts.push(format!("PRIMARY KEY ({})", QUOTING.quote_list(&primary_key)));
        }

        let options = table.options();
        let mut sql = format!(
            "CREATE TABLE {} ({}) ENGINE = {}",
            QUOTING.quote(table.name()),
            parts.join(", "),
            options.engine.as_deref().unwrap_or("InnoDB")
        );
        if let Some(collation) = &options.collation {
            sql.push_str(&format!(" COLLATE = {}", collation));
        }
        if let Some(comment) = &options.comment {
            sql.push_str(&format!(
                " COMMENT = {}",
                SqlValue::from(comment.as_str()).to_sql()
            ));
        }
        Ok(sql)
    }
}

#[async_trait]
impl SchemaAdapter for MysqlAdapter {
    async fn connect(&mut self) -> MigrateResult<()> {
        if self.connection.is_some() {
            return Ok(());
        }

        // Connect server-level, then lazily create and select the target
        // database.
        let mut connection = MySqlConnection::connect_with(&self.connect_options())
            .await
            .map_err(|e| {
                MigrateError::connection(format!(
                    "could not connect to '{}': {}",
                    self.config.host, e
                ))
            })?;

        let create = format!(
            "CREATE DATABASE IF NOT EXISTS {}",
            QUOTING.quote(&self.config.name)
        );
        sqlx::query(&create)
            .execute(&mut connection)
            .await
            .map_err(|e| {
                MigrateError::connection(format!(
                    "could not create database '{}': {}",
                    self.config.name, e
                ))
            })?;
        sqlx::query(&format!("USE {}", QUOTING.quote(&self.config.name)))
            .execute(&mut connection)
            .await
            .map_err(MigrateError::connection)?;

        tracing::debug!(database = %self.config.name, "connected");
        self.connection = Some(connection);
        Ok(())
    }

    async fn disconnect(&mut self) -> MigrateResult<()> {
        if let Some(connection) = self.connection.take() {
            connection.close().await.map_err(MigrateError::connection)?;
        }
        Ok(())
    }

    fn has_transactions(&self) -> bool {
        // DDL triggers an implicit commit; pretending otherwise would hide
        // partial state after a failed unit
        false
    }

    async fn begin_transaction(&mut self) -> MigrateResult<()> {
        self.run("START TRANSACTION").await.map(|_| ())
    }

    async fn commit_transaction(&mut self) -> MigrateResult<()> {
        self.run("COMMIT").await.map(|_| ())
    }

    async fn rollback_transaction(&mut self) -> MigrateResult<()> {
        self.run("ROLLBACK").await.map(|_| ())
    }

    async fn create_schema_table(&mut self) -> MigrateResult<()> {
        let log_table = self.config.log_table.clone();
        if self.has_table(&log_table).await? {
            return Ok(());
        }
        let table = Table::new(&log_table)
            .without_id()
            .set_primary_key(["version"])
            .add_column(Column::big_integer("version").with_limit(14))
            .add_column(Column::string("migration_name").with_limit(100).nullable())
            .add_column(
                Column::timestamp("start_time")
                    .with_default(SqlValue::Expression("CURRENT_TIMESTAMP".to_string())),
            )
            .add_column(
                Column::timestamp("end_time")
                    .with_default(SqlValue::Expression("CURRENT_TIMESTAMP".to_string())),
            )
            .add_column(Column::boolean("breakpoint").with_default(false));
        self.create_table(&table).await
    }

    async fn get_versions(&mut self) -> MigrateResult<Vec<i64>> {
        Ok(self.get_version_log().await?.into_keys().collect())
    }

    async fn get_version_log(&mut self) -> MigrateResult<BTreeMap<i64, VersionLogEntry>> {
        self.ensure_schema_table().await?;
        let sql = format!(
            "SELECT version, migration_name, start_time, end_time, breakpoint FROM {} ORDER BY version ASC",
            QUOTING.quote(&self.config.log_table)
        );
        let conn = self.conn()?;
        let rows = sqlx::query(&sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| MigrateError::execution_with_sql(e, &sql))?;

        let mut log = BTreeMap::new();
        for row in rows {
            let version: i64 = row.try_get("version").map_err(MigrateError::execution)?;
            let migration_name: Option<String> = row
                .try_get("migration_name")
                .map_err(MigrateError::execution)?;
            let start_time: DateTime<Utc> =
                row.try_get("start_time").map_err(MigrateError::execution)?;
            let end_time: DateTime<Utc> =
                row.try_get("end_time").map_err(MigrateError::execution)?;
            let breakpoint: bool = row.try_get("breakpoint").map_err(MigrateError::execution)?;
            log.insert(
                version,
                VersionLogEntry {
                    version,
                    migration_name,
                    start_time,
                    end_time,
                    breakpoint,
                },
            );
        }
        Ok(log)
    }

    async fn record_migrated(
        &mut self,
        version: i64,
        name: &str,
        direction: Direction,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> MigrateResult<()> {
        self.ensure_schema_table().await?;
        let log_table = QUOTING.quote(&self.config.log_table);
        match direction {
            Direction::Up => {
                let sql = format!(
                    "INSERT INTO {} (version, migration_name, start_time, end_time, breakpoint) \
                     VALUES (?, ?, ?, ?, FALSE)",
                    log_table
                );
                let conn = self.conn()?;
                sqlx::query(&sql)
                    .bind(version)
                    .bind(name)
                    .bind(start_time)
                    .bind(end_time)
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| MigrateError::execution_with_sql(e, &sql))?;
            }
            Direction::Down => {
                let sql = format!("DELETE FROM {} WHERE version = ?", log_table);
                let conn = self.conn()?;
                sqlx::query(&sql)
                    .bind(version)
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| MigrateError::execution_with_sql(e, &sql))?;
            }
        }
        Ok(())
    }

    async fn has_table(&mut self, table: &str) -> MigrateResult<bool> {
        let sql = "SELECT COUNT(*) FROM information_schema.tables \
                   WHERE table_schema = ? AND table_name = ?";
        let database = self.config.name.clone();
        let conn = self.conn()?;
        let count: i64 = sqlx::query_scalar(sql)
            .bind(&database)
            .bind(table)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| MigrateError::execution_with_sql(e, sql))?;
        Ok(count > 0)
    }

    async fn create_table(&mut self, table: &Table) -> MigrateResult<()> {
        let sql = self.create_table_sql(table)?;
        self.run(&sql).await?;

        for index in table.indexes() {
            let sql = self.index_sql(table.name(), index);
            self.run(&sql).await?;
        }
        for foreign_key in table.foreign_keys() {
            let sql = self.foreign_key_sql(table.name(), foreign_key);
            self.run(&sql).await?;
        }
        Ok(())
    }

    async fn rename_table(&mut self, table: &str, new_name: &str) -> MigrateResult<()> {
        let sql = format!(
            "RENAME TABLE {} TO {}",
            QUOTING.quote(table),
            QUOTING.quote(new_name)
        );
        self.run(&sql).await.map(|_| ())
    }

    async fn drop_table(&mut self, table: &str) -> MigrateResult<()> {
        let sql = format!("DROP TABLE {}", QUOTING.quote(table));
        self.run(&sql).await.map(|_| ())
    }

    async fn get_columns(&mut self, table: &str) -> MigrateResult<Vec<Column>> {
        let sql = "SELECT column_name, data_type, is_nullable, column_default, extra, \
                          character_maximum_length, numeric_precision, numeric_scale \
                   FROM information_schema.columns \
                   WHERE table_schema = ? AND table_name = ? ORDER BY ordinal_position";
        let database = self.config.name.clone();
        let conn = self.conn()?;
        let rows = sqlx::query(sql)
            .bind(&database)
            .bind(table)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| MigrateError::execution_with_sql(e, sql))?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get(0).map_err(MigrateError::execution)?;
            let data_type: String = row.try_get(1).map_err(MigrateError::execution)?;
            let is_nullable: String = row.try_get(2).map_err(MigrateError::execution)?;
            let default: Option<String> = row.try_get(3).map_err(MigrateError::execution)?;
            let extra: String = row.try_get(4).map_err(MigrateError::execution)?;
            // information_schema sizes are BIGINT UNSIGNED
            let char_length: Option<u64> = row.try_get(5).map_err(MigrateError::execution)?;
            let num_precision: Option<u64> = row.try_get(6).map_err(MigrateError::execution)?;
            let num_scale: Option<u64> = row.try_get(7).map_err(MigrateError::execution)?;

            let mut column = Column::new(&name, self.vocabulary_type(&data_type)?);
            if is_nullable == "YES" {
                column = column.nullable();
            }
            if extra.contains("auto_increment") {
                column = column.identity();
            } else if let Some(default) = default {
                column = column.with_default(SqlValue::Expression(default));
            }
            if let Some(length) = char_length {
                column = column.with_limit(length);
            }
            if let Some(precision) = num_precision {
                column = column.with_precision(precision as u32);
            }
            if let Some(scale) = num_scale {
                column = column.with_scale(scale as u32);
            }
            columns.push(column);
        }
        Ok(columns)
    }

    async fn has_column(&mut self, table: &str, column: &str) -> MigrateResult<bool> {
        let sql = "SELECT COUNT(*) FROM information_schema.columns \
                   WHERE table_schema = ? AND table_name = ? AND column_name = ?";
        let database = self.config.name.clone();
        let conn = self.conn()?;
        let count: i64 = sqlx::query_scalar(sql)
            .bind(&database)
            .bind(table)
            .bind(column)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| MigrateError::execution_with_sql(e, sql))?;
        Ok(count > 0)
    }

    async fn add_column(&mut self, table: &str, column: &Column) -> MigrateResult<()> {
        let sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            QUOTING.quote(table),
            QUOTING.quote(&column.name),
            self.column_sql(column)?
        );
        self.run(&sql).await.map(|_| ())
    }

    async fn rename_column(
        &mut self,
        table: &str,
        column: &str,
        new_name: &str,
    ) -> MigrateResult<()> {
        if !self.has_column(table, column).await? {
            return Err(MigrateError::validation(format!(
                "column '{}' does not exist on table '{}'",
                column, table
            )));
        }
        let sql = format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            QUOTING.quote(table),
            QUOTING.quote(column),
            QUOTING.quote(new_name)
        );
        self.run(&sql).await.map(|_| ())
    }

    async fn change_column(
        &mut self,
        table: &str,
        column: &str,
        new_column: &Column,
    ) -> MigrateResult<()> {
        let sql = format!(
            "ALTER TABLE {} CHANGE {} {} {}",
            QUOTING.quote(table),
            QUOTING.quote(column),
            QUOTING.quote(&new_column.name),
            self.column_sql(new_column)?
        );
        self.run(&sql).await.map(|_| ())
    }

    async fn drop_column(&mut self, table: &str, column: &str) -> MigrateResult<()> {
        let sql = format!(
            "ALTER TABLE {} DROP COLUMN {}",
            QUOTING.quote(table),
            QUOTING.quote(column)
        );
        self.run(&sql).await.map(|_| ())
    }

    async fn has_index(&mut self, table: &str, columns: &[String]) -> MigrateResult<bool> {
        let indexes = self.indexes_of(table).await?;
        Ok(indexes
            .values()
            .any(|index_columns| column_sets_equal(index_columns, columns)))
    }

    async fn has_index_by_name(&mut self, table: &str, index_name: &str) -> MigrateResult<bool> {
        let indexes = self.indexes_of(table).await?;
        Ok(indexes.contains_key(index_name))
    }

    async fn add_index(&mut self, table: &str, index: &Index) -> MigrateResult<()> {
        let sql = self.index_sql(table, index);
        self.run(&sql).await.map(|_| ())
    }

    async fn drop_index(&mut self, table: &str, columns: &[String]) -> MigrateResult<()> {
        let indexes = self.indexes_of(table).await?;
        let matched = indexes
            .into_iter()
            .find(|(_, index_columns)| column_set_covers(index_columns, columns));
        match matched {
            Some((name, _)) => self.drop_index_by_name(table, &name).await,
            None => {
                tracing::warn!(table, ?columns, "no index matched the column set; nothing dropped");
                Ok(())
            }
        }
    }

    async fn drop_index_by_name(&mut self, table: &str, index_name: &str) -> MigrateResult<()> {
        if !self.has_index_by_name(table, index_name).await? {
            tracing::warn!(table, index_name, "index does not exist; nothing dropped");
            return Ok(());
        }
        let sql = format!(
            "DROP INDEX {} ON {}",
            QUOTING.quote(index_name),
            QUOTING.quote(table)
        );
        self.run(&sql).await.map(|_| ())
    }

    async fn has_foreign_key(
        &mut self,
        table: &str,
        columns: &[String],
        constraint: Option<&str>,
    ) -> MigrateResult<bool> {
        let keys = self.foreign_keys_of(table).await?;
        match constraint {
            Some(name) => Ok(keys.contains_key(name)),
            None => Ok(keys
                .values()
                .any(|key_columns| column_sets_equal(key_columns, columns))),
        }
    }

    async fn add_foreign_key(
        &mut self,
        table: &str,
        foreign_key: &ForeignKey,
    ) -> MigrateResult<()> {
        let sql = self.foreign_key_sql(table, foreign_key);
        self.run(&sql).await.map(|_| ())
    }

    async fn drop_foreign_key(
        &mut self,
        table: &str,
        columns: &[String],
        constraint: Option<&str>,
    ) -> MigrateResult<()> {
        let keys = self.foreign_keys_of(table).await?;
        let names: Vec<String> = match constraint {
            Some(name) => {
                if keys.contains_key(name) {
                    vec![name.to_string()]
                } else {
                    Vec::new()
                }
            }
            None => keys
                .into_iter()
                .filter(|(_, key_columns)| column_set_covers(key_columns, columns))
                .map(|(name, _)| name)
                .collect(),
        };

        if names.is_empty() {
            tracing::warn!(table, ?columns, "no foreign key matched; nothing dropped");
            return Ok(());
        }
        for name in names {
            let sql = format!(
                "ALTER TABLE {} DROP FOREIGN KEY {}",
                QUOTING.quote(table),
                QUOTING.quote(&name)
            );
            self.run(&sql).await?;
        }
        Ok(())
    }

    async fn create_database(&mut self, name: &str) -> MigrateResult<()> {
        let mut sql = format!("CREATE DATABASE {}", QUOTING.quote(name));
        if let Some(charset) = &self.config.charset {
            sql.push_str(&format!(" DEFAULT CHARACTER SET {}", charset));
        }
        self.run(&sql).await.map(|_| ())
    }

    async fn has_database(&mut self, name: &str) -> MigrateResult<bool> {
        let sql = "SELECT COUNT(*) FROM information_schema.schemata WHERE schema_name = ?";
        let conn = self.conn()?;
        let count: i64 = sqlx::query_scalar(sql)
            .bind(name)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| MigrateError::execution_with_sql(e, sql))?;
        Ok(count > 0)
    }

    async fn drop_database(&mut self, name: &str) -> MigrateResult<()> {
        let sql = format!("DROP DATABASE IF EXISTS {}", QUOTING.quote(name));
        self.run(&sql).await?;
        self.schema_table_ensured = false;
        self.disconnect().await
    }

    async fn execute(&mut self, sql: &str) -> MigrateResult<u64> {
        self.run(sql).await
    }

    async fn insert(&mut self, table: &str, row: &[(String, SqlValue)]) -> MigrateResult<()> {
        let columns: Vec<String> = row.iter().map(|(name, _)| name.clone()).collect();
        let values: Vec<String> = row.iter().map(|(_, value)| value.to_sql()).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            QUOTING.quote(table),
            QUOTING.quote_list(&columns),
            values.join(", ")
        );
        self.run(&sql).await.map(|_| ())
    }

    fn sql_type(&self, column_type: ColumnType, limit: Option<u64>) -> MigrateResult<NativeType> {
        let native = match column_type {
            ColumnType::String => NativeType::with_limit("varchar", limit.unwrap_or(255)),
            ColumnType::Char => NativeType::with_limit("char", limit.unwrap_or(255)),
            ColumnType::Text => match limit.and_then(|l| select_size_tier(TEXT_TIERS, l)) {
                Some(tier) => NativeType::named(tier.name),
                None => NativeType::named("text"),
            },
            ColumnType::Blob => match limit.and_then(|l| select_size_tier(BLOB_TIERS, l)) {
                Some(tier) => NativeType::named(tier.name),
                None => NativeType::named("blob"),
            },
            ColumnType::Binary => NativeType::with_limit("binary", limit.unwrap_or(255)),
            ColumnType::VarBinary => NativeType::with_limit("varbinary", limit.unwrap_or(255)),
            ColumnType::Integer => match limit {
                Some(l) if l >= INT_TINY => {
                    match select_size_tier(INT_TIERS, l) {
                        Some(tier) => NativeType {
                            name: tier.name.to_string(),
                            limit: tier.display_limit,
                        },
                        // below every tier: treat as display width
                        None => NativeType::with_limit("int", l),
                    }
                }
                Some(l) => NativeType::with_limit("int", l),
                None => NativeType::with_limit("int", 11),
            },
            ColumnType::BigInteger => NativeType::with_limit("bigint", 20),
            ColumnType::Float => NativeType::named("float"),
            ColumnType::Decimal => NativeType::named("decimal"),
            ColumnType::Boolean => NativeType::with_limit("tinyint", 1),
            ColumnType::Date => NativeType::named("date"),
            ColumnType::Time => NativeType::named("time"),
            ColumnType::DateTime => NativeType::named("datetime"),
            ColumnType::Timestamp => NativeType::named("timestamp"),
            ColumnType::Uuid => NativeType::with_limit("char", 36),
            ColumnType::Json => NativeType::named("json"),
            ColumnType::Enum => NativeType::named("enum"),
            ColumnType::Set => NativeType::named("set"),
            ColumnType::Year => match limit {
                Some(l) if l == 2 || l == 4 => NativeType::with_limit("year", l),
                _ => NativeType::with_limit("year", 4),
            },
            ColumnType::Geometry => NativeType::named("geometry"),
            ColumnType::Point => NativeType::named("point"),
            ColumnType::LineString => NativeType::named("linestring"),
            ColumnType::Polygon => NativeType::named("polygon"),
            other => {
                return Err(MigrateError::validation(format!(
                    "type '{}' is not supported by the mysql adapter",
                    other
                )))
            }
        };
        Ok(native)
    }

    fn vocabulary_type(&self, native: &str) -> MigrateResult<ColumnType> {
        let column_type = match native {
            "varchar" => ColumnType::String,
            "char" => ColumnType::Char,
            "tinytext" | "text" | "mediumtext" | "longtext" => ColumnType::Text,
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" => ColumnType::Integer,
            "bigint" => ColumnType::BigInteger,
            "float" | "double" => ColumnType::Float,
            "decimal" | "numeric" => ColumnType::Decimal,
            "binary" => ColumnType::Binary,
            "varbinary" => ColumnType::VarBinary,
            "tinyblob" | "blob" | "mediumblob" | "longblob" => ColumnType::Blob,
            "date" => ColumnType::Date,
            "time" => ColumnType::Time,
            "datetime" => ColumnType::DateTime,
            "timestamp" => ColumnType::Timestamp,
            "json" => ColumnType::Json,
            "enum" => ColumnType::Enum,
            "set" => ColumnType::Set,
            "year" => ColumnType::Year,
            "geometry" => ColumnType::Geometry,
            "point" => ColumnType::Point,
            "linestring" => ColumnType::LineString,
            "polygon" => ColumnType::Polygon,
            other => {
                return Err(MigrateError::validation(format!(
                    "native type '{}' has no vocabulary equivalent",
                    other
                )))
            }
        };
        Ok(column_type)
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        QUOTING.quote(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> MysqlAdapter {
        MysqlAdapter::new(ConnectionConfig::new("mysql", "app"))
    }

    #[test]
    fn text_limit_selects_smallest_sufficient_tier() {
        // 20,000,000 exceeds the mediumtext capacity boundary but not longtext's
        let native = adapter()
            .sql_type(ColumnType::Text, Some(20_000_000))
            .unwrap();
        assert_eq!(native.name, "mediumtext");
        let native = adapter()
            .sql_type(ColumnType::Text, Some(5_000_000_000))
            .unwrap();
        assert_eq!(native.name, "longtext");
        let native = adapter().sql_type(ColumnType::Text, Some(100)).unwrap();
        assert_eq!(native.name, "text");
        let native = adapter().sql_type(ColumnType::Text, None).unwrap();
        assert_eq!(native.name, "text");
    }

    #[test]
    fn integer_defaults_to_display_width_eleven() {
        let native = adapter().sql_type(ColumnType::Integer, None).unwrap();
        assert_eq!(native, NativeType::with_limit("int", 11));
    }

    #[test]
    fn integer_limit_above_tier_floor_selects_sized_type() {
        let native = adapter()
            .sql_type(ColumnType::Integer, Some(65_535))
            .unwrap();
        assert_eq!(native, NativeType::with_limit("smallint", 6));
        let native = adapter()
            .sql_type(ColumnType::Integer, Some(4_294_967_295))
            .unwrap();
        assert_eq!(native, NativeType::with_limit("int", 11));
    }

    #[test]
    fn identity_column_emits_auto_increment_fragment() {
        let column = Column::integer("id").identity();
        assert_eq!(
            adapter().column_sql(&column).unwrap(),
            "INT(11) NOT NULL AUTO_INCREMENT"
        );
        let column = Column::big_integer("id").identity();
        assert_eq!(
            adapter().column_sql(&column).unwrap(),
            "BIGINT(20) NOT NULL AUTO_INCREMENT"
        );
    }

    #[test]
    fn create_table_uses_backticks_and_engine_options() {
        let table = Table::new("widgets").add_column(Column::integer("qty"));
        let sql = adapter().create_table_sql(&table).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE `widgets` (`id` INT(11) NOT NULL AUTO_INCREMENT, \
             `qty` INT(11) NOT NULL, PRIMARY KEY (`id`)) ENGINE = InnoDB"
        );
    }

    #[test]
    fn enum_requires_values() {
        let column = Column::new("state", ColumnType::Enum);
        assert!(matches!(
            adapter().column_sql(&column),
            Err(MigrateError::Validation(_))
        ));
        let column = Column::new("state", ColumnType::Enum).with_values(["new", "done"]);
        assert_eq!(
            adapter().column_sql(&column).unwrap(),
            "ENUM('new', 'done') NOT NULL"
        );
    }

    #[test]
    fn boolean_maps_to_tinyint_one()  {
        let native = adapter().sql_type(ColumnType::Boolean, None).unwrap();
        assert_eq!(native, NativeType::with_limit("tinyint", 1));
    }

    #[test]
    fn jsonb_is_rejected() {
        assert!(matches!(
            adapter().sql_type(ColumnType::Jsonb, None),
            Err(MigrateError::Validation(_))
        ));
    }

    #[test]
    fn unsigned_integer_renders_unsigned() {
        let column = Column::unsigned_integer("votes");
        assert_eq!(
            adapter().column_sql(&column).unwrap(),
            "INT(11) UNSIGNED NOT NULL"
        );
    }
}
