//! Column descriptors

use serde::{Deserialize, Serialize};

use super::value::SqlValue;

/// Logical column types understood by the engine.
///
/// Each adapter maps these to native types; an adapter that cannot express a
/// type rejects it with a validation error rather than guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Char,
    Text,
    Integer,
    BigInteger,
    Float,
    Decimal,
    Boolean,
    Date,
    Time,
    DateTime,
    Timestamp,
    Binary,
    VarBinary,
    Blob,
    Json,
    Jsonb,
    Uuid,
    Enum,
    Set,
    Year,
    Geometry,
    Point,
    LineString,
    Polygon,
}

impl ColumnType {
    /// Lowercase vocabulary name, as used in diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Char => "char",
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::BigInteger => "biginteger",
            ColumnType::Float => "float",
            ColumnType::Decimal => "decimal",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Time => "time",
            ColumnType::DateTime => "datetime",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Binary => "binary",
            ColumnType::VarBinary => "varbinary",
            ColumnType::Blob => "blob",
            ColumnType::Json => "json",
            ColumnType::Jsonb => "jsonb",
            ColumnType::Uuid => "uuid",
            ColumnType::Enum => "enum",
            ColumnType::Set => "set",
            ColumnType::Year => "year",
            ColumnType::Geometry => "geometry",
            ColumnType::Point => "point",
            ColumnType::LineString => "linestring",
            ColumnType::Polygon => "polygon",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes one column of a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    /// Requested size; drives the tiered native-type selection for sized types
    pub limit: Option<u64>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    /// Whether the column accepts NULL (defaults to NOT NULL)
    pub null: bool,
    pub default: Option<SqlValue>,
    /// Auto-increment column; implicitly the primary key unless overridden
    pub identity: bool,
    pub signed: bool,
    /// Store timestamps with time zone where the engine distinguishes
    pub timezone: bool,
    /// Queue a unique index on this column when added to a table
    pub unique: bool,
    /// Allowed values for `enum`/`set` columns
    pub values: Option<Vec<String>>,
    pub comment: Option<String>,
}

impl Column {
    /// Create a column of the given type with engine defaults for everything else
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            column_type,
            limit: None,
            precision: None,
            scale: None,
            null: false,
            default: None,
            identity: false,
            signed: true,
            timezone: false,
            unique: false,
            values: None,
            comment: None,
        }
    }

    /// Shorthand for a `string` column
    pub fn string(name: &str) -> Self {
        Self::new(name, ColumnType::String)
    }

    /// Shorthand for a `text` column
    pub fn text(name: &str) -> Self {
        Self::new(name, ColumnType::Text)
    }

    /// Shorthand for an `integer` column
    pub fn integer(name: &str) -> Self {
        Self::new(name, ColumnType::Integer)
    }

    /// Shorthand for an unsigned `integer` column
    pub fn unsigned_integer(name: &str) -> Self {
        Self::new(name, ColumnType::Integer).unsigned()
    }

    /// Shorthand for a `biginteger` column
    pub fn big_integer(name: &str) -> Self {
        Self::new(name, ColumnType::BigInteger)
    }

    /// Shorthand for a `decimal` column
    pub fn decimal(name: &str, precision: u32, scale: u32) -> Self {
        Self::new(name, ColumnType::Decimal)
            .with_precision(precision)
            .with_scale(scale)
    }

    /// Shorthand for a `boolean` column
    pub fn boolean(name: &str) -> Self {
        Self::new(name, ColumnType::Boolean)
    }

    /// Shorthand for a `timestamp` column
    pub fn timestamp(name: &str) -> Self {
        Self::new(name, ColumnType::Timestamp)
    }

    /// Shorthand for a `datetime` column
    pub fn datetime(name: &str) -> Self {
        Self::new(name, ColumnType::DateTime)
    }

    /// Shorthand for a `json` column
    pub fn json(name: &str) -> Self {
        Self::new(name, ColumnType::Json)
    }

    /// Shorthand for a `uuid` column
    pub fn uuid(name: &str) -> Self {
        Self::new(name, ColumnType::Uuid)
    }

    /// Set the size limit
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the numeric precision
    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    /// Set the numeric scale
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Allow NULL values
    pub fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: impl Into<SqlValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Mark as auto-increment
    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    /// Mark as unsigned
    pub fn unsigned(mut self) -> Self {
        self.signed = false;
        self
    }

    /// Store with time zone
    pub fn with_timezone(mut self) -> Self {
        self.timezone = true;
        self
    }

    /// Request a unique index on this column
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set the allowed values for an `enum`/`set` column
    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Set the column comment
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }
}
