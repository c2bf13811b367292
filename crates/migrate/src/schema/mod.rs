//! Schema-change vocabulary
//!
//! Engine-neutral value objects describing tables, columns, indexes and
//! foreign keys. Migration units build these and hand them to a
//! [`SchemaAdapter`](crate::adapters::SchemaAdapter), which translates them
//! into dialect-correct SQL. The vocabulary itself carries no execution
//! behavior.

pub mod column;
pub mod foreign_key;
pub mod index;
pub mod table;
pub mod value;

pub use column::{Column, ColumnType};
pub use foreign_key::{ForeignKey, ReferentialAction};
pub use index::Index;
pub use table::{IdOption, Table, TableOptions};
pub use value::SqlValue;
