//! Migration status reporting

use crate::migration::{MigrationId, MigrationUnit};
use chrono::NaiveDateTime;
use std::fmt;

/// One line of a status report
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationSummary {
    pub id: MigrationId,
    pub namespace: String,
    pub name: String,
    pub applied_at: Option<NaiveDateTime>,
    pub system: bool,
}

impl From<&MigrationUnit> for MigrationSummary {
    fn from(unit: &MigrationUnit) -> Self {
        Self {
            id: unit.id().clone(),
            namespace: unit.namespace().to_string(),
            name: unit.name().to_string(),
            applied_at: unit.applied_at(),
            system: unit.is_system_managed(),
        }
    }
}

impl fmt::Display for MigrationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {} [{}]", self.id, self.name, self.namespace)?;
        if let Some(applied_at) = self.applied_at {
            write!(f, " applied {applied_at}")?;
        }
        Ok(())
    }
}

/// Migration status information
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationStatus {
    /// Highest applied id, 0 if none
    pub current_id: u64,

    /// Applied migrations, newest first
    pub applied: Vec<MigrationSummary>,

    /// Migrations not yet applied, oldest first
    pub available: Vec<MigrationSummary>,
}

impl MigrationStatus {
    /// Build a status report from every discovered unit, in ascending id order
    #[must_use]
    pub fn new<'a, I>(current_id: u64, units: I) -> Self
    where
        I: IntoIterator<Item = &'a MigrationUnit>,
    {
        let (mut applied, available): (Vec<MigrationSummary>, Vec<MigrationSummary>) = units
            .into_iter()
            .map(MigrationSummary::from)
            .partition(|m| m.applied_at.is_some());
        applied.reverse();

        Self {
            current_id,
            applied,
            available,
        }
    }

    /// Check if all migrations are applied
    #[must_use]
    pub fn is_up_to_date(&self) -> bool {
        self.available.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.applied.len() + self.available.len()
    }

    /// Get the next migration that would be applied
    #[must_use]
    pub fn next_available(&self) -> Option<&MigrationSummary> {
        self.available.first()
    }
}
