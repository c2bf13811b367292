//! Foreign-key descriptors

use serde::{Deserialize, Serialize};

/// Referential action for ON DELETE / ON UPDATE clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    Cascade,
    Restrict,
    SetNull,
    NoAction,
}

impl ReferentialAction {
    /// The SQL keyword sequence
    pub fn as_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}

/// Describes a foreign-key constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    /// Explicit constraint name; adapters derive `<table>_<col>_fk` when absent
    pub constraint: Option<String>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

impl ForeignKey {
    /// Create a foreign key from `columns` to `referenced_table(referenced_columns)`
    pub fn new<I, S>(columns: I, referenced_table: &str, referenced_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            referenced_table: referenced_table.to_string(),
            referenced_columns: referenced_columns.into_iter().map(Into::into).collect(),
            constraint: None,
            on_delete: None,
            on_update: None,
        }
    }

    /// Give the constraint an explicit name
    pub fn named(mut self, constraint: &str) -> Self {
        self.constraint = Some(constraint.to_string());
        self
    }

    /// Set the ON DELETE action
    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Set the ON UPDATE action
    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }
}
