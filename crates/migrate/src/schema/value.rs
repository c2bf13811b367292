//! SQL literal values for column defaults and seed rows

use serde::{Deserialize, Serialize};

/// A literal value rendered into generated SQL (column defaults, seed rows)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Raw SQL expression emitted verbatim, e.g. `CURRENT_TIMESTAMP`
    Expression(String),
}

impl SqlValue {
    /// Render the value as a SQL literal. Strings are single-quoted with
    /// embedded quotes doubled; expressions pass through untouched.
    pub fn to_sql(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Boolean(b) => {
                if *b {
                    "TRUE".to_string()
                } else {
                    "FALSE".to_string()
                }
            }
            SqlValue::Integer(i) => i.to_string(),
            SqlValue::Float(f) => f.to_string(),
            SqlValue::String(s) => format!("'{}'", s.replace('\'', "''")),
            SqlValue::Expression(e) => e.clone(),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Boolean(value)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Integer(value as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::String(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::String(value)
    }
}
