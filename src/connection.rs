//! Connection seam shared by the migration manager, migrations and tables.
//!
//! Everything in Ladder talks to the database through the [`Connection`] trait.
//! Connection construction belongs to the application; Ladder only needs a handle
//! that can execute statements with named parameters and return rows.

use crate::dialect::Dialect;
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// A single shared database handle.
///
/// Migration runs are single-threaded, so the handle is reference counted rather
/// than pooled. The same handle is given to the manager, to every migration and to
/// every [`Table`](crate::schema::Table) a migration creates.
pub type SharedConnection = Rc<dyn Connection>;

/// Named statement parameters, in binding order.
///
/// Names are given without the dialect's placeholder prefix (`id`, not `:id`).
pub type Params = [(String, Value)];

/// Connection-level error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The statement was rejected by the database
    #[error("Query error: {0}")]
    QueryError(String),
    /// A returned value could not be converted
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Other execution errors
    #[error("Execution error: {0}")]
    Other(String),
}

/// A result row: column names paired with values, in select-list order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Create a row from `(column, value)` pairs
    pub fn new<I, K>(columns: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Get a value by column name
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Get a value by position
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.columns.get(index).map(|(_, value)| value)
    }

    /// Column names, in order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .columns
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Trait for executing database operations
///
/// Implementations wrap a live driver connection (or, for tests and dry runs,
/// [`MockConnection`](crate::mock::MockConnection)). All calls are blocking.
///
/// # Examples
///
/// ```no_run
/// use ladder::{Connection, DbError};
/// use serde_json::json;
///
/// # fn example(db: &dyn Connection) -> Result<(), DbError> {
/// // Execute a statement
/// let affected = db.execute(
///     "DELETE FROM `users` WHERE `id` = :id",
///     &[("id".to_string(), json!(42))],
/// )?;
///
/// // Query rows
/// let rows = db.query("SELECT `id` FROM `users`", &[])?;
/// let ids: Vec<u64> = rows
///     .iter()
///     .filter_map(|r| r.get("id").and_then(|v| v.as_u64()))
///     .collect();
/// # Ok(())
/// # }
/// ```
pub trait Connection {
    /// SQL dialect spoken by this connection
    fn dialect(&self) -> &dyn Dialect;

    /// Execute a statement and return the number of rows affected
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the statement fails.
    fn execute(&self, sql: &str, params: &Params) -> Result<u64, DbError>;

    /// Execute a query and return all rows
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the query fails.
    fn query(&self, sql: &str, params: &Params) -> Result<Vec<Row>, DbError>;

    /// Id generated by the most recent insert on this connection, if any
    ///
    /// # Errors
    ///
    /// Returns `DbError` if the driver cannot report it.
    fn last_insert_id(&self) -> Result<Option<u64>, DbError>;

    /// Execute a query and return the first column of the first row
    ///
    /// `Ok(None)` when the query returns no rows.
    fn query_scalar(&self, sql: &str, params: &Params) -> Result<Option<Value>, DbError> {
        let rows = self.query(sql, params)?;
        Ok(rows.first().and_then(|row| row.get_index(0)).cloned())
    }
}

/// Build an owned parameter list from `(name, value)` pairs.
pub fn params<I, K, V>(pairs: I) -> Vec<(String, Value)>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
