//! Migration-specific error types

use crate::connection::DbError;
use crate::migration::MigrationId;
use crate::schema::SchemaError;
use std::path::PathBuf;

/// Error type returned by migration bodies
///
/// Boxed so a migration can `?` connection, schema and its own errors alike.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Migration-specific errors
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Database execution error
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Version-table statement failed
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The namespace already has a source
    #[error("Namespace '{0}' is already registered")]
    DuplicateNamespace(String),

    /// A namespace was registered with an empty path
    #[error("No migrations path given for namespace '{namespace}'")]
    MissingPath { namespace: String },

    /// The namespace path does not exist or is not a directory
    #[error("Invalid migrations path for namespace '{namespace}': {}", path.display())]
    InvalidPath { namespace: String, path: PathBuf },

    /// Lookup by an id nothing was discovered for
    #[error("No such migration: {0}")]
    NoSuchMigration(u64),

    /// No migration was discovered at all
    #[error("No migrations found")]
    NoMigrations,

    /// Two discovered units share a numeric id
    #[error("Migration id {id} is defined in both '{first}' and '{second}'")]
    DuplicateId {
        id: MigrationId,
        first: String,
        second: String,
    },

    /// A migration file has no registered constructor
    #[error("Migration{id} in namespace '{namespace}' has no registered constructor")]
    NotRegistered { namespace: String, id: MigrationId },

    /// Registering a constructor twice
    #[error("Migration {id} is already registered in namespace '{namespace}'")]
    AlreadyRegistered { namespace: String, id: u64 },

    /// A migration id is not a decimal number
    #[error("Invalid migration id: '{0}'")]
    InvalidId(String),

    /// The unit's `apply()` failed
    #[error("Migration {id} ({name}) failed to apply: {source}")]
    ApplyFailed {
        id: MigrationId,
        name: String,
        #[source]
        source: BoxError,
    },

    /// The unit's `rollback()` failed
    #[error("Migration {id} ({name}) failed to roll back: {source}")]
    RollbackFailed {
        id: MigrationId,
        name: String,
        #[source]
        source: BoxError,
    },

    /// Stored rollback data is not valid JSON
    #[error("Invalid rollback data for migration {id}: {reason}")]
    InvalidPayload { id: u64, reason: String },

    /// A version-table row could not be read
    #[error("Invalid version record: {0}")]
    InvalidRecord(String),

    /// System migrations cannot be reapplied or removed
    #[error("Migration {id} is a Ladder system migration and cannot be {action}")]
    SystemMigration { id: MigrationId, action: &'static str },

    /// Removing a migration that is not applied
    #[error("Migration {0} is not applied")]
    NotApplied(MigrationId),

    /// Migrating downwards without permission
    #[error("Refusing to roll back from {current} to {target} without allowing rollback")]
    RollbackRefused { current: u64, target: u64 },

    /// Creating a migration file that already exists
    #[error("Migration file already exists: {}", path.display())]
    FileExists { path: PathBuf },

    /// Filesystem error while scanning or writing migrations
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be used
    #[error("Configuration error: {0}")]
    Config(String),
}
