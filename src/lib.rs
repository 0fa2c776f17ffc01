//! # Ladder
//!
//! Database migration manager with a MySQL table builder.
//!
//! Migrations are `Migration<digits>.rs` files grouped in namespaces, applied
//! in id order and tracked in the `ladder:migrations` table. Schema changes are
//! written with [`schema::Table`], which buffers column, index and constraint
//! changes and emits them as one `CREATE TABLE` or `ALTER TABLE` statement.
//!
//! The database sits behind the [`Connection`] trait; [`mock::MockConnection`]
//! is an in-memory implementation for tests.

pub mod config;
pub mod connection;
pub mod dialect;
pub mod migration;
pub mod mock;
pub mod schema;

#[cfg(feature = "tracing")]
mod tracing_helpers;

pub use config::{LadderConfig, NamespaceConfig};
pub use connection::{params, Connection, DbError, Params, Row, SharedConnection};
pub use dialect::{Dialect, MySql};
pub use migration::{
    migrate, reapply, remove, status, BoxError, MigrateReport, MigrateTarget, Migration,
    MigrationError, MigrationId, MigrationManager, MigrationRegistry, MigrationStatus,
    MigrationUnit,
};
pub use schema::{SchemaError, Table};
