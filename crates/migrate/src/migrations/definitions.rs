//! Core types for the migration system
//!
//! Defines the migration unit and its capability traits, the version-log row
//! shape, and the status-report types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adapters::SchemaAdapter;
use crate::error::MigrateResult;

/// Direction of one migration execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Apply the migration
    Up,
    /// Revert the migration
    Down,
}

/// One row of the version log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionLogEntry {
    /// Version of the applied migration
    pub version: i64,
    /// Name the migration had when it was applied
    pub migration_name: Option<String>,
    /// When execution of the unit started
    pub start_time: DateTime<Utc>,
    /// When execution of the unit finished
    pub end_time: DateTime<Utc>,
    /// Breakpoint marker
    pub breakpoint: bool,
}

/// A migration with hand-written forward and backward logic
#[async_trait]
pub trait DirectedMigration: Send + Sync {
    /// Apply the schema change
    async fn up(&self, schema: &mut dyn SchemaAdapter) -> MigrateResult<()>;

    /// Revert the schema change
    async fn down(&self, schema: &mut dyn SchemaAdapter) -> MigrateResult<()>;
}

/// A migration expressed as a single forward-only routine whose effects are
/// recorded and inverted automatically for DOWN execution
#[async_trait]
pub trait ReversibleMigration: Send + Sync {
    /// Describe the schema change in invertible primitives
    async fn change(&self, schema: &mut dyn SchemaAdapter) -> MigrateResult<()>;
}

/// The script a migration unit carries; exactly one of the two shapes
pub enum MigrationScript {
    Directed(Box<dyn DirectedMigration>),
    Reversible(Box<dyn ReversibleMigration>),
}

impl std::fmt::Debug for MigrationScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MigrationScript::Directed(_) => f.write_str("MigrationScript::Directed"),
            MigrationScript::Reversible(_) => f.write_str("MigrationScript::Reversible"),
        }
    }
}

/// One versioned unit of schema change
#[derive(Debug)]
pub struct MigrationUnit {
    version: i64,
    name: String,
    script: MigrationScript,
}

impl MigrationUnit {
    /// Create a unit with explicit up/down logic
    pub fn directed(version: i64, name: &str, script: Box<dyn DirectedMigration>) -> Self {
        Self {
            version,
            name: name.to_string(),
            script: MigrationScript::Directed(script),
        }
    }

    /// Create a unit with a single reversible change routine
    pub fn reversible(version: i64, name: &str, script: Box<dyn ReversibleMigration>) -> Self {
        Self {
            version,
            name: name.to_string(),
            script: MigrationScript::Reversible(script),
        }
    }

    /// Monotonic, timestamp-derived version identifier
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn script(&self) -> &MigrationScript {
        &self.script
    }
}

/// A named seeder
#[async_trait]
pub trait Seed: Send + Sync {
    /// Seeder name, used for selection and ordering
    fn name(&self) -> &str;

    /// Populate data through the adapter
    async fn run(&self, schema: &mut dyn SchemaAdapter) -> MigrateResult<()>;
}

/// Rendering format for [`print_status`](crate::migrations::MigrationManager::print_status)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFormat {
    /// Structured JSON report appended after the plain rendering
    Json,
}

/// Status of one known migration in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationStatusEntry {
    /// `"up"` or `"down"`
    pub status: String,
    /// Version identifier
    pub id: i64,
    /// Migration name
    pub name: String,
}

/// Structured status report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Number of known migrations not yet applied
    pub pending_count: usize,
    /// One entry per known migration, ascending by version
    pub migrations: Vec<MigrationStatusEntry>,
}
