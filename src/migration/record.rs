//! `VersionRecord` - Represents rows of the `ladder:migrations` version table

use crate::connection::Row;
use crate::migration::MigrationError;
use chrono::{NaiveDateTime, Timelike, Utc};
use serde_json::Value;

/// Format `appliedAt` is written in
pub const APPLIED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One applied migration
#[derive(Debug, Clone, PartialEq)]
pub struct VersionRecord {
    pub id: u64,
    pub applied_at: NaiveDateTime,
    /// Rollback data; `None` when the migration returned nothing
    pub data: Option<Value>,
}

impl VersionRecord {
    /// Create a `VersionRecord` from a version-table row
    ///
    /// `id` and `appliedAt` are required; `data` is optional so the
    /// `(id, appliedAt)` listing query can be read with the same code.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::InvalidRecord` if a required column is missing
    /// or unparseable, and `MigrationError::InvalidPayload` if `data` is not JSON.
    pub fn from_row(row: &Row) -> Result<Self, MigrationError> {
        let id = parse_id(
            row.get("id")
                .ok_or_else(|| MigrationError::InvalidRecord(format!("missing id in {row}")))?,
        )?;
        let applied_at = parse_applied_at(
            row.get("appliedAt").ok_or_else(|| {
                MigrationError::InvalidRecord(format!("missing appliedAt in {row}"))
            })?,
        )?;
        let data = match row.get("data") {
            Some(value) => decode_payload(id, value)?,
            None => None,
        };

        Ok(Self {
            id,
            applied_at,
            data,
        })
    }
}

/// Read an id column; drivers return integers either as numbers or as text
pub fn parse_id(value: &Value) -> Result<u64, MigrationError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| MigrationError::InvalidRecord(format!("invalid id: {n}"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| MigrationError::InvalidRecord(format!("invalid id: '{s}'"))),
        other => Err(MigrationError::InvalidRecord(format!("invalid id: {other}"))),
    }
}

/// Parse an `appliedAt` value
///
/// Accepts `YYYY-MM-DD HH:MM:SS`, with or without fractional seconds, and the
/// `T`-separated ISO form.
pub fn parse_applied_at(value: &Value) -> Result<NaiveDateTime, MigrationError> {
    let Value::String(text) = value else {
        return Err(MigrationError::InvalidRecord(format!(
            "invalid appliedAt: {value}"
        )));
    };

    // Try different timestamp formats
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .ok_or_else(|| {
            MigrationError::InvalidRecord(format!(
                "Failed to parse timestamp '{text}': unrecognized format"
            ))
        })
}

#[must_use]
pub fn format_applied_at(applied_at: &NaiveDateTime) -> String {
    applied_at.format(APPLIED_AT_FORMAT).to_string()
}

/// Current UTC time truncated to the column's one-second precision
#[must_use]
pub fn now() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Serialize rollback data for the `data` column
///
/// # Errors
///
/// Returns `MigrationError::InvalidPayload` if the value cannot be serialized.
pub fn encode_payload(id: u64, data: Option<&Value>) -> Result<Value, MigrationError> {
    match data {
        None | Some(Value::Null) => Ok(Value::Null),
        Some(value) => serde_json::to_string(value)
            .map(Value::String)
            .map_err(|e| MigrationError::InvalidPayload {
                id,
                reason: e.to_string(),
            }),
    }
}

/// Deserialize the `data` column
///
/// SQL `NULL` and the JSON text `null` both mean no data.
///
/// # Errors
///
/// Returns `MigrationError::InvalidPayload` if the text is not valid JSON.
pub fn decode_payload(id: u64, value: &Value) -> Result<Option<Value>, MigrationError> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => {
            let decoded: Value =
                serde_json::from_str(text).map_err(|e| MigrationError::InvalidPayload {
                    id,
                    reason: e.to_string(),
                })?;
            Ok((!decoded.is_null()).then_some(decoded))
        }
        other => Err(MigrationError::InvalidPayload {
            id,
            reason: format!("expected text, got {other}"),
        }),
    }
}
