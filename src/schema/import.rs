//! Row sources for [`Table::import`](super::Table::import)
//!
//! Accepted shapes:
//! - CSV with a header row; every cell is a string
//! - JSON array of row objects: `[{"id": 1, "name": "Alice"}, ...]`
//! - structured JSON: `{"columns": ["id", "name"], "rows": [[1, "Alice"], ...]}`
//! - columnar JSON: `{"id": [1, 2], "name": ["Alice", "Bob"]}`
//!
//! In all of them a cell holding the literal string `NULL` becomes SQL `NULL`.

use super::error::SchemaError;
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;

/// Cell value that is imported as SQL `NULL`
pub const NULL_SENTINEL: &str = "NULL";

/// One row to insert, columns in source order
pub type ImportRow = Vec<(String, Value)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportFormat {
    Csv,
    Json,
}

impl ImportFormat {
    /// Pick the format from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match extension.as_str() {
            "csv" => Ok(ImportFormat::Csv),
            "json" => Ok(ImportFormat::Json),
            other => Err(SchemaError::InvalidImport(format!(
                "Invalid file extension: {other}"
            ))),
        }
    }
}

fn cell(value: Value) -> Value {
    match value {
        Value::String(s) if s == NULL_SENTINEL => Value::Null,
        other => other,
    }
}

/// Parse CSV with a header row
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ImportRow>, SchemaError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row = headers
            .iter()
            .cloned()
            .zip(record.iter().map(|v| cell(Value::String(v.to_string()))))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Parse any of the JSON shapes
pub fn read_json(text: &str) -> Result<Vec<ImportRow>, SchemaError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(map) => Ok(object_row(map)),
                other => Err(SchemaError::InvalidImport(format!(
                    "row {i} is not an object: {other}"
                ))),
            })
            .collect(),
        Value::Object(map) if map.contains_key("columns") && map.contains_key("rows") => {
            structured_rows(map)
        }
        Value::Object(map) => columnar_rows(map),
        other => Err(SchemaError::InvalidImport(format!(
            "expected an array or object, got {other}"
        ))),
    }
}

fn object_row(map: Map<String, Value>) -> ImportRow {
    map.into_iter().map(|(k, v)| (k, cell(v))).collect()
}

fn structured_rows(mut map: Map<String, Value>) -> Result<Vec<ImportRow>, SchemaError> {
    let columns: Vec<String> = match map.remove("columns") {
        Some(Value::Array(columns)) => columns
            .into_iter()
            .map(|c| match c {
                Value::String(s) => Ok(s),
                other => Err(SchemaError::InvalidImport(format!(
                    "column name is not a string: {other}"
                ))),
            })
            .collect::<Result<_, _>>()?,
        _ => {
            return Err(SchemaError::InvalidImport(
                "\"columns\" must be an array".to_string(),
            ))
        }
    };

    let rows = match map.remove("rows") {
        Some(Value::Array(rows)) => rows,
        _ => {
            return Err(SchemaError::InvalidImport(
                "\"rows\" must be an array".to_string(),
            ))
        }
    };

    rows.into_iter()
        .enumerate()
        .map(|(i, row)| match row {
            Value::Array(values) if values.len() == columns.len() => Ok(columns
                .iter()
                .cloned()
                .zip(values.into_iter().map(cell))
                .collect()),
            Value::Array(values) => Err(SchemaError::InvalidImport(format!(
                "row {i} has {} values for {} columns",
                values.len(),
                columns.len()
            ))),
            other => Err(SchemaError::InvalidImport(format!(
                "row {i} is not an array: {other}"
            ))),
        })
        .collect()
}

fn columnar_rows(map: Map<String, Value>) -> Result<Vec<ImportRow>, SchemaError> {
    let mut columns = Vec::with_capacity(map.len());
    for (name, values) in map {
        match values {
            Value::Array(values) => columns.push((name, values)),
            other => {
                return Err(SchemaError::InvalidImport(format!(
                    "column `{name}` is not an array: {other}"
                )))
            }
        }
    }

    let height = columns.first().map_or(0, |(_, values)| values.len());
    if let Some((name, values)) = columns.iter().find(|(_, v)| v.len() != height) {
        return Err(SchemaError::InvalidImport(format!(
            "column `{name}` has {} values, expected {height}",
            values.len()
        )));
    }

    let mut rows: Vec<ImportRow> = (0..height).map(|_| Vec::with_capacity(columns.len())).collect();
    for (name, values) in columns {
        for (row, value) in rows.iter_mut().zip(values) {
            row.push((name.clone(), cell(value)));
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ImportFormat::from_path(Path::new("users.csv")).expect("csv"),
            ImportFormat::Csv
        );
        assert_eq!(
            ImportFormat::from_path(Path::new("USERS.JSON")).expect("json"),
            ImportFormat::Json
        );

        match ImportFormat::from_path(Path::new("users.invalid")) {
            Err(SchemaError::InvalidImport(msg)) => {
                assert_eq!(msg, "Invalid file extension: invalid")
            }
            other => panic!("Expected InvalidImport, got {other:?}"),
        }
    }

    #[test]
    fn test_csv_with_null_sentinel() {
        let data = "id,name,role\n1,Alice,Developer\n2,Bob,NULL\n";
        let rows = read_csv(data.as_bytes()).expect("valid csv");

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            vec![
                ("id".to_string(), json!("1")),
                ("name".to_string(), json!("Alice")),
                ("role".to_string(), json!("Developer")),
            ]
        );
        assert_eq!(rows[1][2], ("role".to_string(), Value::Null));
    }

    #[test]
    fn test_json_row_objects_keep_column_order() {
        let rows = read_json(r#"[{"name": "Alice", "id": 1}, {"name": "NULL", "id": 2}]"#)
            .expect("valid json");

        assert_eq!(rows[0][0].0, "name");
        assert_eq!(rows[0][1], ("id".to_string(), json!(1)));
        assert_eq!(rows[1][0].1, Value::Null);
    }

    #[test]
    fn test_structured_json() {
        let rows = read_json(r#"{"columns": ["id", "name"], "rows": [[1, "Alice"], [2, "NULL"]]}"#)
            .expect("valid json");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec![("id".to_string(), json!(2)), ("name".to_string(), Value::Null)]);
    }

    #[test]
    fn test_structured_json_rejects_short_rows() {
        let result = read_json(r#"{"columns": ["id", "name"], "rows": [[1]]}"#);
        match result {
            Err(SchemaError::InvalidImport(msg)) => assert!(msg.contains("1 values for 2 columns")),
            other => panic!("Expected InvalidImport, got {other:?}"),
        }
    }

    #[test]
    fn test_columnar_json() {
        let rows = read_json(r#"{"id": [1, 2], "name": ["Alice", "Bob"]}"#).expect("valid json");
        assert_eq!(
            rows,
            vec![
                vec![("id".to_string(), json!(1)), ("name".to_string(), json!("Alice"))],
                vec![("id".to_string(), json!(2)), ("name".to_string(), json!("Bob"))],
            ]
        );
    }

    #[test]
    fn test_columnar_json_rejects_ragged_columns() {
        assert!(matches!(
            read_json(r#"{"id": [1, 2], "name": ["Alice"]}"#),
            Err(SchemaError::InvalidImport(_))
        ));
    }

    #[test]
    fn test_scalar_json_is_rejected() {
        assert!(matches!(read_json("42"), Err(SchemaError::InvalidImport(_))));
    }
}
