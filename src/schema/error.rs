//! Schema builder errors

use crate::connection::DbError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A DDL or row statement was rejected by the connection
    #[error("Failed to {operation} `{table}`: {source}")]
    StatementFailure {
        operation: &'static str,
        table: String,
        #[source]
        source: DbError,
    },

    /// `create()`, `alter()` or `update()` with nothing to send
    #[error("Nothing to {statement} for table `{table}`")]
    EmptyStatement {
        statement: &'static str,
        table: String,
    },

    /// A column default with no SQL literal form, such as a NaN float
    #[error("Invalid default for column `{column}` of table `{table}`")]
    InvalidDefault { column: String, table: String },

    /// Unsupported extension or malformed import payload
    #[error("Invalid import: {0}")]
    InvalidImport(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
