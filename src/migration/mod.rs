//! Migration system for Ladder
//!
//! This module provides the infrastructure for database migrations, including:
//! - Migration trait definition and the per-manager registry of constructors
//! - File discovery of `Migration<digits>.rs` across namespaces
//! - Version table tracking in `ladder:migrations`
//! - Migration execution, status and the high-level runner sweeps
//!
//! # Example
//!
//! ```rust,no_run
//! use ladder::migration::{migrate, MigrateTarget, MigrationManager, MigrationRegistry};
//! use ladder::schema::{ColumnOptions, IndexOptions, Table};
//! use ladder::{BoxError, Migration, SharedConnection};
//! use serde_json::Value;
//!
//! pub struct Migration1403185931 {
//!     db: SharedConnection,
//! }
//!
//! impl Migration1403185931 {
//!     pub fn new(db: SharedConnection) -> Self {
//!         Self { db }
//!     }
//! }
//!
//! impl Migration for Migration1403185931 {
//!     fn name(&self) -> &str {
//!         "Create users table"
//!     }
//!
//!     fn apply(&mut self) -> Result<Option<Value>, BoxError> {
//!         Table::new(self.db.clone(), "users")
//!             .add_column("id", "autoincrement", ColumnOptions::new().unsigned())
//!             .add_column("email", "varchar", ColumnOptions::new().limit(255).not_null())
//!             .add_index("PRIMARY", &["id"], IndexOptions::new())
//!             .create()?;
//!         Ok(None)
//!     }
//!
//!     fn rollback(&mut self, _data: Option<Value>) -> Result<(), BoxError> {
//!         Table::new(self.db.clone(), "users").drop()?;
//!         Ok(())
//!     }
//! }
//!
//! # fn run(db: SharedConnection) -> Result<(), ladder::MigrationError> {
//! let mut registry = MigrationRegistry::new();
//! registry.register("app", 1403185931, Migration1403185931::new)?;
//!
//! let mut manager = MigrationManager::new(db, registry);
//! manager.add_system_namespace()?;
//! manager.add_namespace("app", "migrations")?;
//!
//! let report = migrate(&manager, MigrateTarget::Latest, false)?;
//! println!("Applied {} migrations", report.applied.len());
//! # Ok(())
//! # }
//! ```

pub mod build_script;
pub mod error;
pub mod file;
pub mod id;
pub mod manager;
#[allow(clippy::module_inception)]
pub mod migration;
pub mod record;
pub mod registry;
pub mod runner;
pub mod state_table;
pub mod status;
pub mod template;

pub use error::{BoxError, MigrationError};
pub use file::{discover_migration_files, MigrationFile};
pub use id::MigrationId;
pub use manager::{MigrationManager, MigrationSource};
pub use migration::{Migration, MigrationUnit};
pub use record::VersionRecord;
pub use registry::MigrationRegistry;
pub use runner::{migrate, reapply, remove, status, MigrateReport, MigrateTarget};
pub use state_table::{SystemMigration1, VersionTable, SYSTEM_NAMESPACE, VERSION_TABLE};
pub use status::{MigrationStatus, MigrationSummary};
pub use template::{create_configured_migration, create_migration_file};
