//! Version table management
//!
//! `ladder:migrations` holds one row per applied migration: `id`, `appliedAt`
//! and the JSON rollback `data`. It is created and dropped by the system
//! migration 1 in the `ladder::system` namespace; everything else only reads
//! and writes rows through [`VersionTable`].

use crate::connection::SharedConnection;
use crate::migration::record::{self, VersionRecord};
use crate::migration::{BoxError, Migration, MigrationError};
use crate::schema::{ColumnOptions, IndexOptions, Table, PRIMARY};
use chrono::NaiveDateTime;
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Name of the version table
pub const VERSION_TABLE: &str = "ladder:migrations";

/// Namespace of Ladder's own migrations
pub const SYSTEM_NAMESPACE: &str = "ladder::system";

/// Ids of the migrations in [`SYSTEM_NAMESPACE`]
pub const SYSTEM_MIGRATION_IDS: &[u64] = &[1];

/// Creates the version table
pub struct SystemMigration1 {
    db: SharedConnection,
}

impl SystemMigration1 {
    pub fn new(db: SharedConnection) -> Self {
        Self { db }
    }
}

impl Migration for SystemMigration1 {
    fn name(&self) -> &str {
        "Ladder internal tables"
    }

    fn apply(&mut self) -> Result<Option<Value>, BoxError> {
        Table::new(self.db.clone(), VERSION_TABLE)
            .add_column("id", "integer", ColumnOptions::new().not_null().unsigned())
            .add_column("appliedAt", "datetime", ColumnOptions::new().not_null())
            .add_column("data", "text", ColumnOptions::new())
            .add_index(PRIMARY, &["id"], IndexOptions::new())
            .create()?;
        Ok(None)
    }

    fn rollback(&mut self, _data: Option<Value>) -> Result<(), BoxError> {
        Table::new(self.db.clone(), VERSION_TABLE).drop()?;
        Ok(())
    }
}

/// Row access to the version table
pub struct VersionTable {
    db: SharedConnection,
}

impl VersionTable {
    pub fn new(db: SharedConnection) -> Self {
        Self { db }
    }

    /// Whether the version table exists
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Database` if the probe fails.
    pub fn exists(&self) -> Result<bool, MigrationError> {
        let (sql, params) = self.db.dialect().table_exists_query(VERSION_TABLE);
        Ok(!self.db.query(&sql, &params)?.is_empty())
    }

    /// Highest applied id, or 0 when the table is missing or empty
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Database` if a query fails.
    pub fn current_id(&self) -> Result<u64, MigrationError> {
        if !self.exists()? {
            return Ok(0);
        }

        let sql = format!(
            "SELECT MAX({}) FROM {}",
            self.quote("id"),
            self.quote(VERSION_TABLE)
        );
        match self.db.query_scalar(&sql, &[])? {
            None | Some(Value::Null) => Ok(0),
            Some(value) => record::parse_id(&value),
        }
    }

    /// `appliedAt` of every recorded id; empty when the table is missing
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Database` if a query fails or
    /// `MigrationError::InvalidRecord` for an unreadable row.
    pub fn applied(&self) -> Result<BTreeMap<u64, NaiveDateTime>, MigrationError> {
        if !self.exists()? {
            return Ok(BTreeMap::new());
        }

        let sql = format!(
            "SELECT {}, {} FROM {}",
            self.quote("id"),
            self.quote("appliedAt"),
            self.quote(VERSION_TABLE)
        );
        self.db
            .query(&sql, &[])?
            .iter()
            .map(|row| VersionRecord::from_row(row).map(|r| (r.id, r.applied_at)))
            .collect()
    }

    /// Stored rollback data for `id`
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Database` if the query fails or
    /// `MigrationError::InvalidPayload` if the data is not JSON.
    pub fn payload(&self, id: u64) -> Result<Option<Value>, MigrationError> {
        let dialect = self.db.dialect();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = {}",
            self.quote("data"),
            self.quote(VERSION_TABLE),
            self.quote("id"),
            dialect.placeholder("id")
        );
        match self
            .db
            .query_scalar(&sql, &[("id".to_string(), json!(id))])?
        {
            Some(value) => record::decode_payload(id, &value),
            None => Ok(None),
        }
    }

    /// Insert the row for a newly applied migration
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Schema` if the insert fails.
    pub fn record(
        &self,
        id: u64,
        applied_at: &NaiveDateTime,
        data: Option<&Value>,
    ) -> Result<(), MigrationError> {
        let data = record::encode_payload(id, data)?;
        Table::new(self.db.clone(), VERSION_TABLE).insert([
            ("id", json!(id)),
            ("appliedAt", json!(record::format_applied_at(applied_at))),
            ("data", data),
        ])?;
        Ok(())
    }

    /// Delete the row for a rolled back migration
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Schema` if the delete fails.
    pub fn forget(&self, id: u64) -> Result<(), MigrationError> {
        Table::new(self.db.clone(), VERSION_TABLE).delete([("id", json!(id))])?;
        Ok(())
    }

    fn quote(&self, identifier: &str) -> String {
        self.db.dialect().quote_identifier(identifier)
    }
}
