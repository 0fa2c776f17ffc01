//! New migration files

use crate::config::LadderConfig;
use crate::migration::MigrationError;
use chrono::Utc;
use std::fs::OpenOptions;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

const TEMPLATE: &str = r#"use ladder::schema::{ColumnOptions, IndexOptions, Table};
use ladder::{BoxError, Migration, SharedConnection};
use serde_json::Value;

pub struct Migration{{ id }} {
    db: SharedConnection,
}

impl Migration{{ id }} {
    pub fn new(db: SharedConnection) -> Self {
        Self { db }
    }
}

impl Migration for Migration{{ id }} {
    fn name(&self) -> &str {
        {{ name }}
    }

    fn apply(&mut self) -> Result<Option<Value>, BoxError> {
        Table::new(self.db.clone(), "table_name")
            .add_column("id", "autoincrement", ColumnOptions::new().unsigned())
            .add_index("PRIMARY", &["id"], IndexOptions::new())
            .create()?;
        Ok(None)
    }

    fn rollback(&mut self, _data: Option<Value>) -> Result<(), BoxError> {
        Table::new(self.db.clone(), "table_name").drop()?;
        Ok(())
    }
}
"#;

/// Source of a new migration named `name`
#[must_use]
pub fn render_migration(id: u64, name: &str) -> String {
    // Debug formatting of a str is a valid Rust string literal
    TEMPLATE
        .replace("{{ id }}", &id.to_string())
        .replace("{{ name }}", &format!("{name:?}"))
}

/// Write `Migration<id>.rs` into `dir`
///
/// `id` defaults to the current Unix timestamp.
///
/// # Errors
///
/// Returns `MigrationError::Io` if `dir` is not a directory or the write
/// fails, and `MigrationError::FileExists` if the file is already there.
pub fn create_migration_file(
    dir: &Path,
    name: &str,
    id: Option<u64>,
) -> Result<PathBuf, MigrationError> {
    if !dir.is_dir() {
        return Err(MigrationError::Io {
            path: dir.to_path_buf(),
            source: io::Error::new(ErrorKind::NotFound, "path does not exist or is not a directory"),
        });
    }

    let id = id.unwrap_or_else(|| u64::try_from(Utc::now().timestamp()).unwrap_or_default());
    let path = dir.join(format!("Migration{id}.rs"));

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|source| match source.kind() {
            ErrorKind::AlreadyExists => MigrationError::FileExists { path: path.clone() },
            _ => MigrationError::Io {
                path: path.clone(),
                source,
            },
        })?;

    file.write_all(render_migration(id, name).as_bytes())
        .map_err(|source| MigrationError::Io {
            path: path.clone(),
            source,
        })?;

    log::info!("Created migration {}", path.display());
    Ok(path)
}

/// Create a migration in a configured namespace
///
/// `namespace` may be omitted when only one is configured.
///
/// # Errors
///
/// Returns `MigrationError::Config` if the namespace cannot be resolved, plus
/// the errors of [`create_migration_file`].
pub fn create_configured_migration(
    config: &LadderConfig,
    namespace: Option<&str>,
    name: &str,
) -> Result<PathBuf, MigrationError> {
    let dir = config.namespace_path(namespace)?;
    create_migration_file(&dir, name, None)
}
