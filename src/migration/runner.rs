//! High-level operations over a [`MigrationManager`]
//!
//! These are the sweeps a command-line front end drives: migrate to a target,
//! reapply one migration, remove one migration, and report status. Each sweep
//! stops at the first failure and returns it.

use crate::migration::{MigrationError, MigrationId, MigrationManager, MigrationStatus};
use std::fmt;
use std::str::FromStr;

/// Where [`migrate`] should end up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MigrateTarget {
    /// Apply everything available
    #[default]
    Latest,
    /// Apply up to and including this id, or roll back to it
    Id(u64),
}

impl FromStr for MigrateTarget {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("latest") {
            return Ok(MigrateTarget::Latest);
        }
        s.parse::<MigrationId>().map(|id| MigrateTarget::Id(id.value()))
    }
}

impl fmt::Display for MigrateTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrateTarget::Latest => f.write_str("latest"),
            MigrateTarget::Id(id) => write!(f, "{id}"),
        }
    }
}

/// What a [`migrate`] call did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrateReport {
    /// Id before the sweep
    pub from: u64,
    /// Applied, in order
    pub applied: Vec<MigrationId>,
    /// Rolled back, in order
    pub rolled_back: Vec<MigrationId>,
}

impl MigrateReport {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty() && self.rolled_back.is_empty()
    }
}

/// Migrate up or down to `target`
///
/// Upwards, available migrations are applied in ascending order up to and
/// including the target. A target below the current id rolls back applied
/// migrations newest first while their id is above the target, which requires
/// `allow_rollback`.
///
/// # Errors
///
/// Returns `MigrationError::RollbackRefused` for an unpermitted downward
/// migration, or the first apply/rollback failure.
pub fn migrate(
    manager: &MigrationManager,
    target: MigrateTarget,
    allow_rollback: bool,
) -> Result<MigrateReport, MigrationError> {
    let current = manager.get_current_migration_id()?;
    let mut report = MigrateReport {
        from: current,
        ..MigrateReport::default()
    };

    match target {
        MigrateTarget::Id(target) if target < current => {
            if !allow_rollback {
                return Err(MigrationError::RollbackRefused { current, target });
            }

            log::info!("Rolling back from {current} to {target}");
            for mut unit in manager.get_applied_migrations()? {
                if unit.id().value() <= target {
                    break;
                }
                manager.rollback_migration(&mut unit)?;
                report.rolled_back.push(unit.id().clone());
            }
        }
        MigrateTarget::Id(target) if target == current => {
            log::info!("Already at {current}");
        }
        _ => {
            let available = manager.get_available_migrations()?;
            if available.is_empty() {
                log::info!("Already up-to-date");
                return Ok(report);
            }

            log::info!("Migrating from {current} to {target}");
            for mut unit in available {
                if let MigrateTarget::Id(target) = target {
                    if unit.id().value() > target {
                        break;
                    }
                }
                manager.apply_migration(&mut unit)?;
                report.applied.push(unit.id().clone());
            }
        }
    }

    Ok(report)
}

/// Roll back `target` if it is applied, then apply it again
///
/// # Errors
///
/// Returns `MigrationError::SystemMigration` for Ladder's own migrations,
/// lookup errors, or the rollback/apply failure.
pub fn reapply(manager: &MigrationManager, target: MigrateTarget) -> Result<MigrationId, MigrationError> {
    let mut unit = match target {
        MigrateTarget::Latest => manager.get_latest_migration()?,
        MigrateTarget::Id(id) => manager.get_migration_by_id(id)?,
    };

    if unit.is_system_managed() {
        return Err(MigrationError::SystemMigration {
            id: unit.id().clone(),
            action: "reapplied",
        });
    }

    if unit.is_applied() {
        manager.rollback_migration(&mut unit)?;
    }
    manager.apply_migration(&mut unit)?;

    log::info!("Reapplied migration {}", unit);
    Ok(unit.id().clone())
}

/// Roll back a single applied migration, regardless of order
///
/// # Errors
///
/// Returns `MigrationError::SystemMigration` for Ladder's own migrations,
/// `MigrationError::NotApplied` if it is not applied, lookup errors, or the
/// rollback failure.
pub fn remove(manager: &MigrationManager, id: u64) -> Result<MigrationId, MigrationError> {
    let mut unit = manager.get_migration_by_id(id)?;

    if unit.is_system_managed() {
        return Err(MigrationError::SystemMigration {
            id: unit.id().clone(),
            action: "removed",
        });
    }

    if !unit.is_applied() {
        return Err(MigrationError::NotApplied(unit.id().clone()));
    }

    manager.rollback_migration(&mut unit)?;
    log::info!("Removed migration {}", unit);
    Ok(unit.id().clone())
}

/// Current id plus applied and available migrations
///
/// # Errors
///
/// Returns discovery and version-table errors.
pub fn status(manager: &MigrationManager) -> Result<MigrationStatus, MigrationError> {
    let current = manager.get_current_migration_id()?;
    let all = manager.get_all_migrations()?;
    Ok(MigrationStatus::new(current, all.values()))
}
