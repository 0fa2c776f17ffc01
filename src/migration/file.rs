//! Migration file discovery

use crate::migration::{MigrationError, MigrationId};
use once_cell::sync::OnceCell;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

static MIGRATION_FILE_PATTERN: OnceCell<Regex> = OnceCell::new();

fn migration_file_pattern() -> Result<&'static Regex, MigrationError> {
    MIGRATION_FILE_PATTERN.get_or_try_init(|| {
        Regex::new(r"^Migration(\d+)\.rs$")
            .map_err(|e| MigrationError::Config(format!("Invalid migration file pattern: {e}")))
    })
}

/// A discovered `Migration<digits>.rs` file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    pub path: PathBuf,
    pub id: MigrationId,
}

impl MigrationFile {
    /// Extract the id from a file name
    ///
    /// Returns `Ok(None)` for names that are not migration files, such as
    /// `mod.rs` or `README.md`.
    ///
    /// # Example
    /// - `Migration000001.rs` → id 1, displayed as `000001`
    pub fn parse_filename(filename: &str) -> Result<Option<MigrationId>, MigrationError> {
        let Some(caps) = migration_file_pattern()?.captures(filename) else {
            return Ok(None);
        };
        match caps.get(1) {
            Some(digits) => digits.as_str().parse().map(Some),
            None => Ok(None),
        }
    }

    /// Struct name the file must define
    #[must_use]
    pub fn type_name(&self) -> String {
        format!("Migration{}", self.id)
    }
}

/// Discover all migration files in a directory
///
/// Non-matching entries and subdirectories are ignored. The result is sorted
/// by id, ascending.
///
/// # Errors
///
/// Returns `MigrationError::Io` if the directory cannot be read, or
/// `MigrationError::InvalidId` if a file's digits overflow a `u64`.
pub fn discover_migration_files(dir: &Path) -> Result<Vec<MigrationFile>, MigrationError> {
    let io_error = |source| MigrationError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        if let Some(id) = MigrationFile::parse_filename(filename)? {
            files.push(MigrationFile { path, id });
        }
    }

    // read_dir order is platform-dependent
    files.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.path.cmp(&b.path)));
    log::debug!("Found {} migration files in {}", files.len(), dir.display());
    Ok(files)
}
