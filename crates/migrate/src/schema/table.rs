//! Table descriptors
//!
//! A [`Table`] collects pending columns, indexes and foreign keys plus the
//! table-level options, then is consumed whole by
//! [`SchemaAdapter::create_table`](crate::adapters::SchemaAdapter::create_table).

use serde::{Deserialize, Serialize};

use super::column::{Column, ColumnType};
use super::foreign_key::ForeignKey;
use super::index::Index;
use super::value::SqlValue;

/// How the implicit identity primary-key column is handled
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum IdOption {
    /// Inject an identity column named `id`
    #[default]
    Default,
    /// Inject an identity column with the given name
    Named(String),
    /// No implicit identity column
    Disabled,
}

/// Table-level options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableOptions {
    pub id: IdOption,
    /// Explicit primary-key column list; suppresses the implicit identity column
    pub primary_key: Vec<String>,
    /// Storage engine, for engines that support one (MySQL `ENGINE=`)
    pub engine: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
}

/// Descriptor of a table to create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    name: String,
    options: TableOptions,
    columns: Vec<Column>,
    indexes: Vec<Index>,
    foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// Create an empty table descriptor with default options
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            options: TableOptions::default(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    /// Pending columns in declaration order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// Rename the identity column (`id` by default)
    pub fn set_id(mut self, id: &str) -> Self {
        self.options.id = IdOption::Named(id.to_string());
        self
    }

    /// Suppress the implicit identity column
    pub fn without_id(mut self) -> Self {
        self.options.id = IdOption::Disabled;
        self
    }

    /// Set an explicit primary key; suppresses the implicit identity column
    pub fn set_primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the storage engine
    pub fn set_engine(mut self, engine: &str) -> Self {
        self.options.engine = Some(engine.to_string());
        self
    }

    /// Set the collation
    pub fn set_collation(mut self, collation: &str) -> Self {
        self.options.collation = Some(collation.to_string());
        self
    }

    /// Set the table comment
    pub fn set_comment(mut self, comment: &str) -> Self {
        self.options.comment = Some(comment.to_string());
        self
    }

    /// Queue a column. A column flagged unique also queues a unique index on it.
    pub fn add_column(mut self, column: Column) -> Self {
        if column.unique {
            self.indexes.push(Index::new([column.name.clone()]).unique());
        }
        self.columns.push(column);
        self
    }

    /// Queue an index
    pub fn add_index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    /// Queue a foreign key
    pub fn add_foreign_key(mut self, foreign_key: ForeignKey) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    /// Queue the conventional create/update timestamp pair: created NOT NULL
    /// defaulting to the current time, updated nullable with no default.
    pub fn add_timestamps(
        self,
        created_at: Option<&str>,
        updated_at: Option<&str>,
        with_timezone: bool,
    ) -> Self {
        let mut created = Column::timestamp(created_at.unwrap_or("create_time"))
            .with_default(SqlValue::Expression("CURRENT_TIMESTAMP".to_string()));
        let mut updated = Column::timestamp(updated_at.unwrap_or("update_time")).nullable();
        if with_timezone {
            created = created.with_timezone();
            updated = updated.with_timezone();
        }
        self.add_column(created).add_column(updated)
    }

    /// Queue a nullable soft-delete timestamp column
    pub fn add_soft_delete(self) -> Self {
        self.add_column(Column::timestamp("delete_time").nullable())
    }

    /// Queue a polymorphic-relation column pair plus its composite index
    pub fn add_morphs(self, name: &str, index_name: Option<&str>) -> Self {
        let id_column = format!("{}_id", name);
        let type_column = format!("{}_type", name);
        let mut index = Index::new([id_column.clone(), type_column.clone()]);
        if let Some(n) = index_name {
            index = index.named(n);
        }
        self.add_column(Column::unsigned_integer(&id_column))
            .add_column(Column::string(&type_column))
            .add_index(index)
    }

    /// [`add_morphs`](Self::add_morphs) with both columns nullable
    pub fn add_nullable_morphs(self, name: &str, index_name: Option<&str>) -> Self {
        let id_column = format!("{}_id", name);
        let type_column = format!("{}_type", name);
        let mut index = Index::new([id_column.clone(), type_column.clone()]);
        if let Some(n) = index_name {
            index = index.named(n);
        }
        self.add_column(Column::unsigned_integer(&id_column).nullable())
            .add_column(Column::string(&type_column).nullable())
            .add_index(index)
    }

    /// Copy of this descriptor under a different name
    pub fn renamed(&self, new_name: &str) -> Table {
        let mut table = self.clone();
        table.name = new_name.to_string();
        table
    }

    /// Apply a rewrite to every queued foreign key
    pub fn rewrite_foreign_keys(&mut self, mut rewrite: impl FnMut(&mut ForeignKey)) {
        for foreign_key in &mut self.foreign_keys {
            rewrite(foreign_key);
        }
    }

    /// Name of the identity column the adapter must inject, if any.
    ///
    /// An explicit primary key or `IdOption::Disabled` suppresses injection.
    pub fn injected_identity_column(&self) -> Option<&str> {
        if !self.options.primary_key.is_empty() {
            return None;
        }
        match &self.options.id {
            IdOption::Default => Some("id"),
            IdOption::Named(name) => Some(name),
            IdOption::Disabled => None,
        }
    }

    /// The effective primary-key column list after identity injection
    pub fn effective_primary_key(&self) -> Vec<String> {
        if let Some(id) = self.injected_identity_column() {
            vec![id.to_string()]
        } else if !self.options.primary_key.is_empty() {
            self.options.primary_key.clone()
        } else {
            self.columns
                .iter()
                .filter(|c| c.identity)
                .map(|c| c.name.clone())
                .collect()
        }
    }
}
