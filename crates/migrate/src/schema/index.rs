//! Index descriptors

use serde::{Deserialize, Serialize};

/// Describes an index over one or more columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub columns: Vec<String>,
    /// Explicit index name; adapters derive `<table>_<col>_<col>` when absent
    pub name: Option<String>,
    pub unique: bool,
}

impl Index {
    /// Create an index over the given columns
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            name: None,
            unique: false,
        }
    }

    /// Make the index unique
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Give the index an explicit name
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
}
