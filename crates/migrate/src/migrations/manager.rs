//! Migration manager
//!
//! Orchestrates a migration run: reads the version log, computes the set and
//! order of units to execute in each direction, runs every unit inside a
//! transaction when the engine supports transactional DDL, and records the
//! outcome in the version log. Execution is strictly sequential; a failing
//! unit aborts the run.

use std::time::Instant;

use chrono::{NaiveDateTime, Utc};

use crate::adapters::{RecordingAdapter, SchemaAdapter};
use crate::error::{MigrateError, MigrateResult};
use crate::output::OutputSink;

use super::definitions::{
    Direction, MigrationScript, MigrationStatusEntry, MigrationUnit, Seed, StatusFormat,
    StatusReport,
};
use super::loader::{MigrationSet, SeedSet};

/// Exit code: at least one known migration is not applied
pub const EXIT_STATUS_DOWN: i32 = 1;

/// Exit code: the version log contains a version with no known unit;
/// reported in preference to [`EXIT_STATUS_DOWN`]
pub const EXIT_STATUS_MISSING: i32 = 2;

/// The orchestrator of migration and seed runs.
///
/// Explicitly constructed and handed its collaborators; there is no ambient
/// registry. The adapter is the single writer for the target database — the
/// engine assumes at most one concurrent run per target and implements no
/// locking against a second one.
pub struct MigrationManager {
    adapter: Box<dyn SchemaAdapter>,
    migrations: MigrationSet,
    seeds: SeedSet,
    output: Box<dyn OutputSink>,
}

impl MigrationManager {
    /// Create a manager over the given adapter and migration set
    pub fn new(
        adapter: Box<dyn SchemaAdapter>,
        migrations: MigrationSet,
        output: Box<dyn OutputSink>,
    ) -> Self {
        Self {
            adapter,
            migrations,
            seeds: SeedSet::empty(),
            output,
        }
    }

    /// Attach a seed set
    pub fn with_seeds(mut self, seeds: SeedSet) -> Self {
        self.seeds = seeds;
        self
    }

    /// The loaded migration set
    pub fn migrations(&self) -> &MigrationSet {
        &self.migrations
    }

    /// Tear the manager down, returning the adapter
    pub fn into_adapter(self) -> Box<dyn SchemaAdapter> {
        self.adapter
    }

    /// All applied versions, ascending
    pub async fn versions(&mut self) -> MigrateResult<Vec<i64>> {
        self.adapter.connect().await?;
        self.adapter.get_versions().await
    }

    /// The highest applied version, or 0 when nothing is applied
    pub async fn current_version(&mut self) -> MigrateResult<i64> {
        Ok(self.versions().await?.last().copied().unwrap_or(0))
    }

    /// Migrate to the given version, or to the newest known version.
    ///
    /// Runs a descending revert pass first when the target lies below the
    /// current version, then always an ascending apply pass, so a target that
    /// crosses both directions self-corrects. An unknown non-zero target is
    /// reported and ignored.
    pub async fn migrate(&mut self, target: Option<i64>) -> MigrateResult<()> {
        self.adapter.connect().await?;
        let applied = self.adapter.get_versions().await?;
        let current = applied.last().copied().unwrap_or(0);

        if applied.is_empty() && self.migrations.is_empty() {
            return Ok(());
        }

        let target = match target {
            None => applied
                .iter()
                .copied()
                .chain(self.migrations.versions())
                .max()
                .unwrap_or(0),
            Some(version) => {
                if version != 0 && !self.migrations.contains(version) {
                    tracing::warn!(version, "requested target is not a known version");
                    self.output
                        .line(&format!("warning: {} is not a valid version", version));
                    return Ok(());
                }
                version
            }
        };

        let direction = if target > current {
            Direction::Up
        } else {
            Direction::Down
        };

        if direction == Direction::Down {
            for index in (0..self.migrations.len()).rev() {
                let unit = &self.migrations.units()[index];
                if unit.version() <= target {
                    break;
                }
                if applied.contains(&unit.version()) {
                    execute_migration(
                        self.adapter.as_mut(),
                        self.output.as_mut(),
                        unit,
                        Direction::Down,
                    )
                    .await?;
                }
            }
        }

        for index in 0..self.migrations.len() {
            let unit = &self.migrations.units()[index];
            if unit.version() > target {
                break;
            }
            if !applied.contains(&unit.version()) {
                execute_migration(
                    self.adapter.as_mut(),
                    self.output.as_mut(),
                    unit,
                    Direction::Up,
                )
                .await?;
            }
        }

        Ok(())
    }

    /// Revert applied migrations down to (but not below) the given version.
    ///
    /// Without a target, reverts exactly the most recently applied unit. A
    /// target below the earliest applied version reverts everything.
    pub async fn rollback(&mut self, target: Option<i64>) -> MigrateResult<()> {
        self.adapter.connect().await?;
        let applied = self.adapter.get_versions().await?;

        if applied.is_empty() || target == applied.last().copied() {
            self.output.line("No migrations to rollback");
            return Ok(());
        }

        let target = match target {
            None => {
                if applied.len() >= 2 {
                    applied[applied.len() - 2]
                } else {
                    0
                }
            }
            Some(version) => {
                if version < applied[0] {
                    0
                } else {
                    version
                }
            }
        };

        if target != 0 && !self.migrations.contains(target) {
            tracing::warn!(version = target, "rollback target is not a known version");
            self.output
                .line(&format!("Target version ({}) not found", target));
            return Ok(());
        }

        for index in (0..self.migrations.len()).rev() {
            let unit = &self.migrations.units()[index];
            if unit.version() <= target {
                break;
            }
            if applied.contains(&unit.version()) {
                execute_migration(
                    self.adapter.as_mut(),
                    self.output.as_mut(),
                    unit,
                    Direction::Down,
                )
                .await?;
            }
        }

        Ok(())
    }

    /// Migrate to the newest known version dated at or before the given time
    pub async fn migrate_to_datetime(&mut self, when: NaiveDateTime) -> MigrateResult<()> {
        let boundary = version_for(when)?;
        let target = self
            .migrations
            .versions()
            .into_iter()
            .filter(|v| *v <= boundary)
            .max();

        if let Some(target) = target {
            self.output.line(&format!("Migrating to version {}", target));
            self.migrate(Some(target)).await?;
        }
        Ok(())
    }

    /// Roll back to the database state as of the given time
    pub async fn rollback_to_datetime(&mut self, when: NaiveDateTime) -> MigrateResult<()> {
        self.adapter.connect().await?;
        let applied = self.adapter.get_versions().await?;
        let boundary = version_for(when)?;

        let earlier = applied.iter().copied().filter(|v| *v <= boundary).max();
        let later_exists = applied.iter().any(|v| *v >= boundary);

        if later_exists {
            match earlier {
                Some(version) => {
                    self.output
                        .line(&format!("Rolling back to version {}", version));
                    self.rollback(Some(version)).await?;
                }
                None => {
                    self.output.line("Rolling back all migrations");
                    self.rollback(Some(0)).await?;
                }
            }
        }
        Ok(())
    }

    /// Print the migration status and return the exit code.
    ///
    /// `0` when every known migration is applied and the log holds nothing
    /// else, [`EXIT_STATUS_DOWN`] when at least one migration is pending, and
    /// [`EXIT_STATUS_MISSING`] when the log holds versions with no known
    /// unit — checked in that order of precedence, missing first.
    pub async fn print_status(&mut self, format: Option<StatusFormat>) -> MigrateResult<i32> {
        self.adapter.connect().await?;
        let mut log = self.adapter.get_version_log().await?;

        let mut entries: Vec<MigrationStatusEntry> = Vec::with_capacity(self.migrations.len());
        let mut has_down = false;

        if self.migrations.is_empty() && log.is_empty() {
            self.output.line("");
            self.output
                .line("There are no available migrations. Try creating one using the create command.");
        } else {
            self.output.line("");
            self.output.line(
                " Status  Migration ID    Started              Finished             Migration Name ",
            );
            self.output.line(
                "----------------------------------------------------------------------------------",
            );

            for unit in self.migrations.units() {
                let status = match log.remove(&unit.version()) {
                    Some(entry) => {
                        self.output.line(&format!(
                            "     up  {:14}  {:19}  {:19}  {}",
                            unit.version(),
                            entry.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                            entry.end_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                            unit.name()
                        ));
                        "up"
                    }
                    None => {
                        has_down = true;
                        self.output.line(&format!(
                            "   down  {:14}  {:19}  {:19}  {}",
                            unit.version(),
                            "",
                            "",
                            unit.name()
                        ));
                        "down"
                    }
                };
                entries.push(MigrationStatusEntry {
                    status: status.to_string(),
                    id: unit.version(),
                    name: unit.name().to_string(),
                });
            }
        }

        // Anything left in the log has no matching unit: schema drift.
        let has_missing = !log.is_empty();
        for (version, entry) in &log {
            self.output.line(&format!(
                "     up  {:14}  {:19}  {:19}  {}  ** MISSING **",
                version,
                entry.start_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                entry.end_time.format("%Y-%m-%d %H:%M:%S").to_string(),
                entry.migration_name.as_deref().unwrap_or("")
            ));
        }
        self.output.line("");

        if let Some(StatusFormat::Json) = format {
            let report = StatusReport {
                pending_count: entries.iter().filter(|e| e.status == "down").count(),
                migrations: entries,
            };
            let rendered = serde_json::to_string(&report)?;
            self.output.line(&rendered);
        }

        if has_missing {
            Ok(EXIT_STATUS_MISSING)
        } else if has_down {
            Ok(EXIT_STATUS_DOWN)
        } else {
            Ok(0)
        }
    }

    /// Run one named seeder, or every known seeder in name order
    pub async fn seed(&mut self, name: Option<&str>) -> MigrateResult<()> {
        self.adapter.connect().await?;
        match name {
            None => {
                for seed in self.seeds.seeds() {
                    execute_seed(self.adapter.as_mut(), self.output.as_mut(), seed.as_ref())
                        .await?;
                }
                Ok(())
            }
            Some(name) => match self.seeds.get(name) {
                Some(seed) => {
                    execute_seed(self.adapter.as_mut(), self.output.as_mut(), seed).await
                }
                None => Err(MigrateError::validation(format!(
                    "the seed '{}' does not exist",
                    name
                ))),
            },
        }
    }
}

/// Derive the version boundary encoded by a point in time
fn version_for(when: NaiveDateTime) -> MigrateResult<i64> {
    when.format("%Y%m%d%H%M%S")
        .to_string()
        .parse()
        .map_err(|e| MigrateError::validation(format!("invalid datetime target: {}", e)))
}

/// Execute one unit in the given direction: transaction wrapper when the
/// engine supports one, recording/inverted playback for reversible units run
/// DOWN, version-log bookkeeping on success.
async fn execute_migration(
    adapter: &mut dyn SchemaAdapter,
    output: &mut dyn OutputSink,
    unit: &MigrationUnit,
    direction: Direction,
) -> MigrateResult<()> {
    output.line("");
    output.line(&format!(
        " == {} {}: {}",
        unit.version(),
        unit.name(),
        match direction {
            Direction::Up => "migrating",
            Direction::Down => "reverting",
        }
    ));
    tracing::info!(
        version = unit.version(),
        name = unit.name(),
        direction = ?direction,
        "executing migration"
    );

    let timer = Instant::now();
    let start_time = Utc::now();
    let in_transaction = adapter.has_transactions();

    if in_transaction {
        adapter.begin_transaction().await?;
    }

    let run_result = match unit.script() {
        MigrationScript::Directed(script) => match direction {
            Direction::Up => script.up(adapter).await,
            Direction::Down => script.down(adapter).await,
        },
        MigrationScript::Reversible(script) => match direction {
            Direction::Up => script.change(adapter).await,
            Direction::Down => {
                // Record the forward operations, then replay their inverses
                // against the real adapter.
                let mut recorder = RecordingAdapter::new(adapter);
                match script.change(&mut recorder).await {
                    Ok(()) => recorder.execute_inverted().await,
                    Err(error) => Err(error),
                }
            }
        },
    };

    if let Err(error) = run_result {
        if in_transaction {
            if let Err(rollback_error) = adapter.rollback_transaction().await {
                tracing::error!(
                    version = unit.version(),
                    "transaction rollback after failure also failed: {}",
                    rollback_error
                );
            }
        }
        tracing::error!(version = unit.version(), "migration failed: {}", error);
        return Err(error);
    }

    if in_transaction {
        adapter.commit_transaction().await?;
    }

    adapter
        .record_migrated(
            unit.version(),
            unit.name(),
            direction,
            start_time,
            Utc::now(),
        )
        .await?;

    output.line(&format!(
        " == {} {}: {} {:.4}s",
        unit.version(),
        unit.name(),
        match direction {
            Direction::Up => "migrated",
            Direction::Down => "reverted",
        },
        timer.elapsed().as_secs_f64()
    ));
    Ok(())
}

/// Execute one seeder inside a transaction when the engine supports one
async fn execute_seed(
    adapter: &mut dyn SchemaAdapter,
    output: &mut dyn OutputSink,
    seed: &dyn Seed,
) -> MigrateResult<()> {
    output.line("");
    output.line(&format!(" == {}: seeding", seed.name()));
    tracing::info!(name = seed.name(), "executing seed");

    let timer = Instant::now();
    let in_transaction = adapter.has_transactions();

    if in_transaction {
        adapter.begin_transaction().await?;
    }

    if let Err(error) = seed.run(adapter).await {
        if in_transaction {
            if let Err(rollback_error) = adapter.rollback_transaction().await {
                tracing::error!(
                    name = seed.name(),
                    "transaction rollback after failure also failed: {}",
                    rollback_error
                );
            }
        }
        return Err(MigrateError::seed(format!("{}: {}", seed.name(), error)));
    }

    if in_transaction {
        adapter.commit_transaction().await?;
    }

    output.line(&format!(
        " == {}: seeded {:.4}s",
        seed.name(),
        timer.elapsed().as_secs_f64()
    ));
    Ok(())
}
