//! Validated migration and seed collections
//!
//! File discovery, naming conventions and instantiation are host concerns;
//! the engine receives already-constructed units and validates the set as a
//! whole: versions and names must be unique, ordering is by version (seeds
//! by name).

use std::collections::HashMap;

use crate::error::{MigrateError, MigrateResult};

use super::definitions::{MigrationUnit, Seed};

/// An ordered, validated collection of migration units
#[derive(Debug, Default)]
pub struct MigrationSet {
    units: Vec<MigrationUnit>,
}

impl MigrationSet {
    /// Validate and order the given units
    pub fn new(mut units: Vec<MigrationUnit>) -> MigrateResult<Self> {
        let mut by_version: HashMap<i64, &str> = HashMap::with_capacity(units.len());
        let mut by_name: HashMap<&str, i64> = HashMap::with_capacity(units.len());
        for unit in &units {
            if let Some(existing) = by_version.insert(unit.version(), unit.name()) {
                return Err(MigrateError::validation(format!(
                    "duplicate migration: '{}' has the same version {} as '{}'",
                    unit.name(),
                    unit.version(),
                    existing
                )));
            }
            if let Some(existing) = by_name.insert(unit.name(), unit.version()) {
                return Err(MigrateError::validation(format!(
                    "migration '{}' (version {}) has the same name as version {}",
                    unit.name(),
                    unit.version(),
                    existing
                )));
            }
        }
        drop(by_version);
        drop(by_name);

        units.sort_by_key(MigrationUnit::version);
        Ok(Self { units })
    }

    /// A set with no units
    pub fn empty() -> Self {
        Self::default()
    }

    /// Units in ascending version order
    pub fn units(&self) -> &[MigrationUnit] {
        &self.units
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// All known versions, ascending
    pub fn versions(&self) -> Vec<i64> {
        self.units.iter().map(MigrationUnit::version).collect()
    }

    /// Whether the set contains the given version
    pub fn contains(&self, version: i64) -> bool {
        self.units.iter().any(|u| u.version() == version)
    }

    /// The unit with the given version, if known
    pub fn get(&self, version: i64) -> Option<&MigrationUnit> {
        self.units.iter().find(|u| u.version() == version)
    }
}

/// An ordered, validated collection of seeders
#[derive(Default)]
pub struct SeedSet {
    seeds: Vec<Box<dyn Seed>>,
}

impl SeedSet {
    /// Validate and order the given seeders by name
    pub fn new(mut seeds: Vec<Box<dyn Seed>>) -> MigrateResult<Self> {
        let mut names: HashMap<String, ()> = HashMap::with_capacity(seeds.len());
        for seed in &seeds {
            if names.insert(seed.name().to_string(), ()).is_some() {
                return Err(MigrateError::validation(format!(
                    "duplicate seed name '{}'",
                    seed.name()
                )));
            }
        }
        seeds.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(Self { seeds })
    }

    /// A set with no seeders
    pub fn empty() -> Self {
        Self::default()
    }

    /// Seeders in name order
    pub fn seeds(&self) -> &[Box<dyn Seed>] {
        &self.seeds
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// The seeder with the given name, if known
    pub fn get(&self, name: &str) -> Option<&dyn Seed> {
        self.seeds
            .iter()
            .find(|s| s.name() == name)
            .map(AsRef::as_ref)
    }
}

impl std::fmt::Debug for SeedSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.seeds.iter().map(|s| s.name()))
            .finish()
    }
}
