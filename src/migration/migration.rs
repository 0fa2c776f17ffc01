//! Migration trait and the discovered migration unit

use crate::migration::{BoxError, MigrationId};
use chrono::NaiveDateTime;
use serde_json::Value;
use std::fmt;

/// A reversible change
///
/// Implementations live in `Migration<digits>.rs` files (one per file) and
/// receive the shared connection in their constructor:
///
/// ```rust,no_run
/// use ladder::schema::{ColumnOptions, IndexOptions, Table};
/// use ladder::{BoxError, Migration, SharedConnection};
/// use serde_json::Value;
///
/// pub struct Migration1700000000 {
///     db: SharedConnection,
/// }
///
/// impl Migration1700000000 {
///     pub fn new(db: SharedConnection) -> Self {
///         Self { db }
///     }
/// }
///
/// impl Migration for Migration1700000000 {
///     fn name(&self) -> &str {
///         "Create users table"
///     }
///
///     fn apply(&mut self) -> Result<Option<Value>, BoxError> {
///         Table::new(self.db.clone(), "users")
///             .add_column("id", "autoincrement", ColumnOptions::new().unsigned())
///             .add_index("PRIMARY", &["id"], IndexOptions::new())
///             .create()?;
///         Ok(None)
///     }
///
///     fn rollback(&mut self, _data: Option<Value>) -> Result<(), BoxError> {
///         Table::new(self.db.clone(), "users").drop()?;
///         Ok(())
///     }
/// }
/// ```
pub trait Migration {
    /// Human-readable description
    fn name(&self) -> &str;

    /// Perform the forward change
    ///
    /// The returned value is stored with the version row and handed back to
    /// [`rollback`](Self::rollback).
    ///
    /// # Errors
    ///
    /// Any error aborts the apply; nothing is recorded.
    fn apply(&mut self) -> Result<Option<Value>, BoxError>;

    /// Undo the forward change
    ///
    /// # Errors
    ///
    /// Any error aborts the rollback; the version row is kept.
    fn rollback(&mut self, data: Option<Value>) -> Result<(), BoxError>;
}

/// A discovered migration: identity, origin and applied state around a
/// [`Migration`] implementation
pub struct MigrationUnit {
    id: MigrationId,
    namespace: String,
    system: bool,
    applied_at: Option<NaiveDateTime>,
    migration: Box<dyn Migration>,
}

impl MigrationUnit {
    pub fn new(
        id: MigrationId,
        namespace: impl Into<String>,
        system: bool,
        migration: Box<dyn Migration>,
    ) -> Self {
        Self {
            id,
            namespace: namespace.into(),
            system,
            applied_at: None,
            migration,
        }
    }

    pub fn id(&self) -> &MigrationId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.migration.name()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// True for Ladder's own bookkeeping migrations
    pub fn is_system_managed(&self) -> bool {
        self.system
    }

    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }

    pub fn applied_at(&self) -> Option<NaiveDateTime> {
        self.applied_at
    }

    /// Record the applied state; the manager calls this after a successful
    /// apply or rollback
    pub fn set_applied_at(&mut self, applied_at: Option<NaiveDateTime>) {
        self.applied_at = applied_at;
    }

    pub(crate) fn apply(&mut self) -> Result<Option<Value>, BoxError> {
        self.migration.apply()
    }

    pub(crate) fn rollback(&mut self, data: Option<Value>) -> Result<(), BoxError> {
        self.migration.rollback(data)
    }
}

impl fmt::Debug for MigrationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationUnit")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("namespace", &self.namespace)
            .field("system", &self.system)
            .field("applied_at", &self.applied_at)
            .finish()
    }
}

impl fmt::Display for MigrationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.id, self.name())
    }
}
