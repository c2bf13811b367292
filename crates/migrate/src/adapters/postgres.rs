//! PostgreSQL dialect adapter
//!
//! Owns a single `sqlx` connection: a migration run is one strictly ordered
//! stream of DDL, so there is nothing for a pool to do here. DDL on Postgres
//! is transactional, so `has_transactions` is true and the manager wraps each
//! unit in BEGIN/COMMIT.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection, Row};

use crate::config::ConnectionConfig;
use crate::error::{MigrateError, MigrateResult};
use crate::migrations::{Direction, VersionLogEntry};
use crate::schema::{Column, ColumnType, ForeignKey, Index, SqlValue, Table};

use super::dialect::{
    column_set_covers, column_sets_equal, NativeType, QuoteStyle,
};
use super::SchemaAdapter;

const QUOTING: QuoteStyle = QuoteStyle::DoubleQuote;

/// Adapter for PostgreSQL-family engines
pub struct PostgresAdapter {
    config: ConnectionConfig,
    connection: Option<PgConnection>,
    schema_table_ensured: bool,
}

impl PostgresAdapter {
    /// Create a disconnected adapter for the given target
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            connection: None,
            schema_table_ensured: false,
        }
    }

    fn connect_options(&self, database: &str) -> PgConnectOptions {
        let mut options = PgConnectOptions::new()
            .host(&self.config.host)
            .username(&self.config.user)
            .database(database);
        if let Some(port) = self.config.port {
            options = options.port(port);
        }
        if let Some(pass) = &self.config.pass {
            options = options.password(pass);
        }
        options
    }

    fn conn(&mut self) -> MigrateResult<&mut PgConnection> {
        self.connection
            .as_mut()
            .ok_or_else(|| MigrateError::connection("adapter is not connected"))
    }

    /// Execute one statement, wrapping failures with the attempted SQL
    async fn run(&mut self, sql: &str) -> MigrateResult<u64> {
        tracing::debug!(target: "strata_migrate::sql", "{}", sql);
        let conn = self.conn()?;
        let result = sqlx::query(sql)
            .execute(&mut *conn)
            .await
            .map_err(|e| MigrateError::execution_with_sql(e, sql))?;
        Ok(result.rows_affected())
    }

    /// Indexes of a table: name -> column list
    async fn indexes_of(&mut self, table: &str) -> MigrateResult<BTreeMap<String, Vec<String>>> {
        let sql = "SELECT i.relname AS index_name, a.attname AS column_name \
                   FROM pg_class t \
                   JOIN pg_index ix ON t.oid = ix.indrelid \
                   JOIN pg_class i ON i.oid = ix.indexrelid \
                   JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey) \
                   WHERE t.relkind = 'r' AND t.relname = $1";
        let conn = self.conn()?;
        let rows = sqlx::query(sql)
            .bind(table)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| MigrateError::execution_with_sql(e, sql))?;

        let mut indexes: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in rows {
            let name: String = row.try_get("index_name").map_err(MigrateError::execution)?;
            let column: String = row.try_get("column_name").map_err(MigrateError::execution)?;
            indexes.entry(name).or_default().push(column);
        }
        Ok(indexes)
    }

    /// Foreign keys of a table: constraint name -> column list
    async fn foreign_keys_of(
        &mut self,
        table: &str,
    ) -> MigrateResult<BTreeMap<String, Vec<String>>> {
        let sql = "SELECT tc.constraint_name, kcu.column_name \
                   FROM information_schema.table_constraints tc \
                   JOIN information_schema.key_column_usage kcu \
                     ON tc.constraint_name = kcu.constraint_name \
                    AND tc.table_schema = kcu.table_schema \
                   WHERE tc.constraint_type = 'FOREIGN KEY' AND tc.table_name = $1 \
                   ORDER BY kcu.ordinal_position";
        let conn = self.conn()?;
        let rows = sqlx::query(sql)
            .bind(table)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| MigrateError::execution_with_sql(e, sql))?;

        let mut keys: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in rows {
            let name: String = row
                .try_get("constraint_name")
                .map_err(MigrateError::execution)?;
            let column: String = row.try_get("column_name").map_err(MigrateError::execution)?;
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

    /// Column definition fragment, e.g. `VARCHAR(255) NOT NULL DEFAULT 'x'`
    fn column_sql(&self, column: &Column) -> MigrateResult<String> {
        let mut buffer: Vec<String> = Vec::new();

        if column.identity {
            // serial bypasses generic type mapping entirely
            buffer.push(
                if column.column_type == ColumnType::BigInteger {
                    "BIGSERIAL"
                } else {
                    "SERIAL"
                }
                .to_string(),
            );
        } else {
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
            } else if let Some(limit) = native.limit {
                type_sql.push_str(&format!("({})", limit));
            }
            if column.timezone
                && matches!(
                    column.column_type,
                    ColumnType::Timestamp | ColumnType::DateTime | ColumnType::Time
                )
            {
                type_sql.push_str(" WITH TIME ZONE");
            }
            buffer.push(type_sql);
        }

        buffer.push(if column.null { "NULL" } else { "NOT NULL" }.to_string());

        if let Some(default) = &column.default {
            buffer.push(format!("DEFAULT {}", default.to_sql()));
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

        Ok(format!(
            "CREATE TABLE {} ({})",
            QUOTING.quote(table.name()),
            parts.join(", ")
        ))
    }
}

#[async_trait]
impl SchemaAdapter for PostgresAdapter {
    async fn connect(&mut self) -> MigrateResult<()> {
        if self.connection.is_some() {
            return Ok(());
        }

        match PgConnection::connect_with(&self.connect_options(&self.config.name)).await {
            Ok(connection) => {
                tracing::debug!(database = %self.config.name, "connected");
                self.connection = Some(connection);
                Ok(())
            }
            Err(first_error) => {
                // The target database may not exist yet; create it through the
                // maintenance database and retry.
                let mut admin = PgConnection::connect_with(&self.connect_options("postgres"))
                    .await
                    .map_err(|e| {
                        MigrateError::connection(format!(
                            "could not connect to database '{}': {} (maintenance connection also failed: {})",
                            self.config.name, first_error, e
                        ))
                    })?;

                let exists: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM pg_database WHERE datname = $1")
                        .bind(&self.config.name)
                        .fetch_one(&mut admin)
                        .await
                        .map_err(MigrateError::connection)?;
                if exists == 0 {
                    tracing::debug!(database = %self.config.name, "creating missing database");
                    sqlx::query(&format!(
                        "CREATE DATABASE {}",
                        QUOTING.quote(&self.config.name)
                    ))
                    .execute(&mut admin)
                    .await
                    .map_err(|e| {
                        MigrateError::connection(format!(
                            "could not create database '{}': {}",
                            self.config.name, e
                        ))
                    })?;
                }
                admin.close().await.ok();

                let connection = PgConnection::connect_with(
                    &self.connect_options(&self.config.name),
                )
                .await
                .map_err(|e| {
                    MigrateError::connection(format!(
                        "could not connect to database '{}': {}",
                        self.config.name, e
                    ))
                })?;
                self.connection = Some(connection);
                Ok(())
            }
        }
    }

    async fn disconnect(&mut self) -> MigrateResult<()> {
        if let Some(connection) = self.connection.take() {
            connection.close().await.map_err(MigrateError::connection)?;
        }
        Ok(())
    }

    fn has_transactions(&self) -> bool {
        true
    }

    async fn begin_transaction(&mut self) -> MigrateResult<()> {
        self.run("BEGIN").await.map(|_| ())
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
            .add_column(Column::big_integer("version"))
            .add_column(Column::string("migration_name").with_limit(100).nullable())
            .add_column(Column::timestamp("start_time"))
            .add_column(Column::timestamp("end_time"))
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
            let start_time: NaiveDateTime =
                row.try_get("start_time").map_err(MigrateError::execution)?;
            let end_time: NaiveDateTime =
                row.try_get("end_time").map_err(MigrateError::execution)?;
            let breakpoint: bool = row.try_get("breakpoint").map_err(MigrateError::execution)?;
            log.insert(
                version,
                VersionLogEntry {
                    version,
                    migration_name,
                    start_time: DateTime::from_naive_utc_and_offset(start_time, Utc),
                    end_time: DateTime::from_naive_utc_and_offset(end_time, Utc),
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
                     VALUES ($1, $2, $3, $4, FALSE)",
                    log_table
                );
                let conn = self.conn()?;
                sqlx::query(&sql)
                    .bind(version)
                    .bind(name)
                    .bind(start_time.naive_utc())
                    .bind(end_time.naive_utc())
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| MigrateError::execution_with_sql(e, &sql))?;
            }
            Direction::Down => {
                let sql = format!("DELETE FROM {} WHERE version = $1", log_table);
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
                   WHERE table_schema = 'public' AND table_name = $1";
        let conn = self.conn()?;
        let count: i64 = sqlx::query_scalar(sql)
            .bind(table)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| MigrateError::execution_with_sql(e, sql))?;
        Ok(count > 0)
    }

    async fn create_table(&mut self, table: &Table) -> MigrateResult<()> {
        let sql = self.create_table_sql(table)?;
        self.run(&sql).await?;

        if let Some(comment) = &table.options().comment {
            let sql = format!(
                "COMMENT ON TABLE {} IS {}",
                QUOTING.quote(table.name()),
                SqlValue::from(comment.as_str()).to_sql()
            );
            self.run(&sql).await?;
        }

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
            "ALTER TABLE {} RENAME TO {}",
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
        let sql = "SELECT column_name, data_type, is_nullable, column_default, \
                          character_maximum_length::int4 AS char_length, \
                          numeric_precision::int4 AS num_precision, \
                          numeric_scale::int4 AS num_scale \
                   FROM information_schema.columns \
                   WHERE table_schema = 'public' AND table_name = $1 \
                   ORDER BY ordinal_position";
        let conn = self.conn()?;
        let rows = sqlx::query(sql)
            .bind(table)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| MigrateError::execution_with_sql(e, sql))?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("column_name").map_err(MigrateError::execution)?;
            let data_type: String = row.try_get("data_type").map_err(MigrateError::execution)?;
            let is_nullable: String =
                row.try_get("is_nullable").map_err(MigrateError::execution)?;
            let default: Option<String> = row
                .try_get("column_default")
                .map_err(MigrateError::execution)?;
            let char_length: Option<i32> =
                row.try_get("char_length").map_err(MigrateError::execution)?;
            let num_precision: Option<i32> = row
                .try_get("num_precision")
                .map_err(MigrateError::execution)?;
            let num_scale: Option<i32> =
                row.try_get("num_scale").map_err(MigrateError::execution)?;

            let identity = default
                .as_deref()
                .is_some_and(|d| d.starts_with("nextval("));
            let mut column = Column::new(&name, self.vocabulary_type(&data_type)?);
            if is_nullable == "YES" {
                column = column.nullable();
            }
            if identity {
                column = column.identity();
            } else if let Some(default) = default {
                column = column.with_default(SqlValue::Expression(default));
            }
            if let Some(length) = char_length {
                column = column.with_limit(length as u64);
            }
            if let Some(precision) = num_precision {
                column = column.with_precision(precision as u32);
            }
            if let Some(scale) = num_scale {
                column = column.with_scale(scale as u32);
            }
            if data_type.ends_with("with time zone") {
                column = column.with_timezone();
            }
            columns.push(column);
        }
        Ok(columns)
    }

    async fn has_column(&mut self, table: &str, column: &str) -> MigrateResult<bool> {
        let sql = "SELECT COUNT(*) FROM information_schema.columns \
                   WHERE table_schema = 'public' AND table_name = $1 AND column_name = $2";
        let conn = self.conn()?;
        let count: i64 = sqlx::query_scalar(sql)
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
        let quoted_table = QUOTING.quote(table);
        let quoted_column = QUOTING.quote(column);

        let native = self.sql_type(new_column.column_type, new_column.limit)?;
        let mut type_sql = native.name.to_uppercase();
        if new_column.column_type == ColumnType::Decimal
            && (new_column.precision.is_some() || new_column.scale.is_some())
        {
            type_sql.push_str(&format!(
                "({}, {})",
                new_column.precision.unwrap_or(18),
                new_column.scale.unwrap_or(0)
            ));
        } else if let Some(limit) = native.limit {
            type_sql.push_str(&format!("({})", limit));
        }

        let sql = format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {}",
            quoted_table, quoted_column, type_sql
        );
        self.run(&sql).await?;

        let sql = format!(
            "ALTER TABLE {} ALTER COLUMN {} {} NOT NULL",
            quoted_table,
            quoted_column,
            if new_column.null { "DROP" } else { "SET" }
        );
        self.run(&sql).await?;

        let sql = match &new_column.default {
            Some(default) => format!(
                "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {}",
                quoted_table,
                quoted_column,
                default.to_sql()
            ),
            None => format!(
                "ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT",
                quoted_table, quoted_column
            ),
        };
        self.run(&sql).await?;

        if new_column.name != column {
            let sql = format!(
                "ALTER TABLE {} RENAME COLUMN {} TO {}",
                quoted_table,
                quoted_column,
                QUOTING.quote(&new_column.name)
            );
            self.run(&sql).await?;
        }
        Ok(())
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

    async fn drop_index_by_name(&mut self, _table: &str, index_name: &str) -> MigrateResult<()> {
        let sql = format!("DROP INDEX IF EXISTS {}", QUOTING.quote(index_name));
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
                "ALTER TABLE {} DROP CONSTRAINT {}",
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
            sql.push_str(&format!(" ENCODING = '{}'", charset));
        }
        self.run(&sql).await.map(|_| ())
    }

    async fn has_database(&mut self, name: &str) -> MigrateResult<bool> {
        let sql = "SELECT COUNT(*) FROM pg_database WHERE datname = $1";
        let conn = self.conn()?;
        let count: i64 = sqlx::query_scalar(sql)
            .bind(name)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| MigrateError::execution_with_sql(e, sql))?;
        Ok(count > 0)
    }

    async fn drop_database(&mut self, name: &str) -> MigrateResult<()> {
        // Postgres refuses to drop the database it is connected to; go
        // through the maintenance database and end up disconnected.
        self.disconnect().await?;
        let mut admin = PgConnection::connect_with(&self.connect_options("postgres"))
            .await
            .map_err(MigrateError::connection)?;
        let sql = format!("DROP DATABASE IF EXISTS {}", QUOTING.quote(name));
        sqlx::query(&sql)
            .execute(&mut admin)
            .await
            .map_err(|e| MigrateError::execution_with_sql(e, &sql))?;
        admin.close().await.ok();
        self.schema_table_ensured = false;
        Ok(())
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
            ColumnType::Text => NativeType::named("text"),
            ColumnType::Integer => NativeType::named("integer"),
            ColumnType::BigInteger => NativeType::named("bigint"),
            ColumnType::Float => NativeType::named("real"),
            ColumnType::Decimal => NativeType::named("numeric"),
            ColumnType::Boolean => NativeType::named("boolean"),
            ColumnType::Date => NativeType::named("date"),
            ColumnType::Time => NativeType::named("time"),
            ColumnType::DateTime | ColumnType::Timestamp => NativeType::named("timestamp"),
            ColumnType::Binary | ColumnType::VarBinary | ColumnType::Blob => {
                NativeType::named("bytea")
            }
            ColumnType::Json => NativeType::named("json"),
            ColumnType::Jsonb => NativeType::named("jsonb"),
            ColumnType::Uuid => NativeType::named("uuid"),
            other => {
                return Err(MigrateError::validation(format!(
                    "type '{}' is not supported by the postgres adapter",
                    other
                )))
            }
        };
        Ok(native)
    }

    fn vocabulary_type(&self, native: &str) -> MigrateResult<ColumnType> {
        let column_type = match native {
            "character varying" | "varchar" => ColumnType::String,
            "character" | "char" => ColumnType::Char,
            "text" => ColumnType::Text,
            "smallint" | "int" | "int2" | "int4" | "integer" => ColumnType::Integer,
            "bigint" | "int8" => ColumnType::BigInteger,
            "real" | "float4" | "double precision" => ColumnType::Float,
            "decimal" | "numeric" => ColumnType::Decimal,
            "bytea" => ColumnType::Binary,
            "time" | "timetz" | "time with time zone" | "time without time zone" => {
                ColumnType::Time
            }
            "date" => ColumnType::Date,
            "timestamp" | "timestamptz" | "timestamp with time zone"
            | "timestamp without time zone" => ColumnType::Timestamp,
            "bool" | "boolean" => ColumnType::Boolean,
            "uuid" => ColumnType::Uuid,
            "json" => ColumnType::Json,
            "jsonb" => ColumnType::Jsonb,
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
    use crate::schema::ReferentialAction;

    fn adapter() -> PostgresAdapter {
        PostgresAdapter::new(ConnectionConfig::new("postgres", "app"))
    }

    #[test]
    fn create_table_injects_serial_identity_primary_key() {
        let table = Table::new("users")
            .add_column(Column::string("name"))
            .add_column(Column::string("email").with_limit(120));
        let sql = adapter().create_table_sql(&table).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE \"users\" (\"id\" SERIAL NOT NULL, \"name\" VARCHAR(255) NOT NULL, \
             \"email\" VARCHAR(120) NOT NULL, PRIMARY KEY (\"id\"))"
        );
    }

    #[test]
    fn create_table_with_explicit_primary_key_has_no_identity() {
        let table = Table::new("versions")
            .without_id()
            .set_primary_key(["version"])
            .add_column(Column::big_integer("version"))
            .add_column(Column::string("migration_name").with_limit(100).nullable());
        let sql = adapter().create_table_sql(&table).unwrap();
        assert!(!sql.contains("SERIAL"));
        assert!(sql.contains("\"version\" BIGINT NOT NULL"));
        assert!(sql.contains("\"migration_name\" VARCHAR(100) NULL"));
        assert!(sql.ends_with("PRIMARY KEY (\"version\"))"));
    }

    #[test]
    fn named_id_option_renames_identity_column() {
        let table = Table::new("widgets").set_id("widget_id");
        let sql = adapter().create_table_sql(&table).unwrap();
        assert!(sql.contains("\"widget_id\" SERIAL NOT NULL"));
        assert!(sql.ends_with("PRIMARY KEY (\"widget_id\"))"));
    }

    #[test]
    fn identity_bypasses_type_mapping_and_limits() {
        let column = Column::big_integer("id").identity().with_limit(3);
        assert_eq!(adapter().column_sql(&column).unwrap(), "BIGSERIAL NOT NULL");
    }

    #[test]
    fn decimal_renders_precision_and_scale() {
        let column = Column::decimal("price", 10, 2);
        assert_eq!(
            adapter().column_sql(&column).unwrap(),
            "NUMERIC(10, 2) NOT NULL"
        );
    }

    #[test]
    fn timestamp_with_timezone_suffix() {
        let column = Column::timestamp("seen_at").with_timezone().nullable();
        assert_eq!(
            adapter().column_sql(&column).unwrap(),
            "TIMESTAMP WITH TIME ZONE NULL"
        );
    }

    #[test]
    fn default_values_are_rendered_as_literals() {
        let column = Column::boolean("active").with_default(true);
        assert_eq!(
            adapter().column_sql(&column).unwrap(),
            "BOOLEAN NOT NULL DEFAULT TRUE"
        );
        let column = Column::string("status").with_default("new");
        assert_eq!(
            adapter().column_sql(&column).unwrap(),
            "VARCHAR(255) NOT NULL DEFAULT 'new'"
        );
    }

    #[test]
    fn index_sql_derives_name_and_quotes_every_identifier() {
        let index = Index::new(["account_id", "kind"]).unique();
        assert_eq!(
            adapter().index_sql("events", &index),
            "CREATE UNIQUE INDEX \"events_account_id_kind\" ON \"events\" (\"account_id\", \"kind\")"
        );
    }

    #[test]
    fn foreign_key_sql_includes_actions() {
        let fk = ForeignKey::new(["user_id"], "users", ["id"])
            .named("posts_user_id_fk")
            .on_delete(ReferentialAction::Cascade);
        assert_eq!(
            adapter().foreign_key_sql("posts", &fk),
            "ALTER TABLE \"posts\" ADD CONSTRAINT \"posts_user_id_fk\" FOREIGN KEY (\"user_id\") \
             REFERENCES \"users\" (\"id\") ON DELETE CASCADE"
        );
    }

    #[test]
    fn unsupported_type_is_a_validation_error() {
        assert!(matches!(
            adapter().sql_type(ColumnType::Set, None),
            Err(MigrateError::Validation(_))
        ));
    }
}
