//! # strata-migrate: schema migrations for SQL databases
//!
//! A schema-migration engine: versioned migration units describe schema
//! changes through an engine-neutral vocabulary, dialect adapters translate
//! the vocabulary into native SQL and introspect the target database, and a
//! manager reconciles the loaded units against a persisted version log —
//! applying or reverting whatever is needed to reach the requested version,
//! one transactional unit at a time.
//!
//! Reversible migrations write only the forward direction; running one
//! backwards records its primitive operations against a recording adapter
//! and replays the inverted sequence.
//!
//! The host application owns the outer surfaces (CLI, configuration files,
//! console rendering, file scaffolding) and hands the engine a resolved
//! [`ConnectionConfig`], an instantiated [`MigrationSet`], and an
//! [`OutputSink`] for progress lines.

pub mod adapters;
pub mod config;
pub mod error;
pub mod migrations;
pub mod output;
pub mod schema;

#[cfg(test)]
mod tests;

// Re-export core traits and types
pub use adapters::*;
pub use config::*;
pub use error::*;
pub use migrations::*;
pub use output::*;
pub use schema::*;
