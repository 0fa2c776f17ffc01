//! Build script helper for migration manifest generation
//!
//! Discovery at run time only sees file names; the code for each
//! `Migration<digits>.rs` has to be compiled in. Call [`generate_manifest`]
//! from `build.rs` to write a module that includes every migration file with
//! `#[path]` and registers its constructor:
//!
//! ```rust,no_run
//! // build.rs
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let out_dir = std::env::var("OUT_DIR")?;
//!     ladder::migration::build_script::generate_manifest(
//!         "app",
//!         Path::new("migrations"),
//!         &Path::new(&out_dir).join("app_migrations.rs"),
//!     )?;
//!     println!("cargo:rerun-if-changed=migrations");
//!     Ok(())
//! }
//! ```
//!
//! and in the application:
//!
//! ```rust,ignore
//! mod app_migrations {
//!     include!(concat!(env!("OUT_DIR"), "/app_migrations.rs"));
//! }
//!
//! let mut registry = ladder::MigrationRegistry::new();
//! app_migrations::register(&mut registry)?;
//! ```

use crate::migration::file::{discover_migration_files, MigrationFile};
use crate::migration::MigrationError;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Module name used for a migration file: `migration_<digits>`
#[must_use]
pub fn module_name(file: &MigrationFile) -> String {
    format!("migration_{}", file.id)
}

/// Render the manifest module for `files`
///
/// Paths are written as given; [`generate_manifest`] passes absolute ones so
/// the module can be included from anywhere.
#[must_use]
pub fn render_manifest(namespace: &str, files: &[MigrationFile]) -> String {
    let mut out = String::from("// Auto-generated migration manifest\n");
    out.push_str("// DO NOT EDIT - This file is generated by build script\n\n");
    let _ = writeln!(out, "pub const NAMESPACE: &str = {namespace:?};\n");

    for file in files {
        let path = file.path.to_string_lossy().replace('\\', "/");
        let _ = writeln!(out, "#[path = r#\"{path}\"#]");
        let _ = writeln!(out, "pub mod {};", module_name(file));
    }
    if !files.is_empty() {
        out.push('\n');
    }

    out.push_str("/// Register every migration in this namespace\n");
    out.push_str("#[allow(unused_variables)]\n");
    out.push_str(
        "pub fn register(registry: &mut ::ladder::MigrationRegistry) -> Result<(), ::ladder::MigrationError> {\n",
    );
    for file in files {
        let _ = writeln!(
            out,
            "    registry.register(NAMESPACE, {}, {}::{}::new)?;",
            file.id.value(),
            module_name(file),
            file.type_name()
        );
    }
    out.push_str("    Ok(())\n}\n");
    out
}

/// Scan `dir` and write the manifest module to `output_path`
///
/// Returns the files included, ascending by id.
///
/// # Errors
///
/// Returns `MigrationError::Io` if the directory cannot be read or the output
/// cannot be written, and `MigrationError::DuplicateId` if two files share an
/// id.
pub fn generate_manifest(
    namespace: &str,
    dir: &Path,
    output_path: &Path,
) -> Result<Vec<MigrationFile>, MigrationError> {
    let dir = fs::canonicalize(dir).map_err(|source| MigrationError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let files = discover_migration_files(&dir)?;

    if let Some(pair) = files.windows(2).find(|pair| pair[0].id == pair[1].id) {
        return Err(MigrationError::DuplicateId {
            id: pair[1].id.clone(),
            first: namespace.to_string(),
            second: namespace.to_string(),
        });
    }

    fs::write(output_path, render_manifest(namespace, &files)).map_err(|source| {
        MigrationError::Io {
            path: output_path.to_path_buf(),
            source,
        }
    })?;

    log::info!(
        "Wrote manifest for '{}' with {} migrations to {}",
        namespace,
        files.len(),
        output_path.display()
    );
    Ok(files)
}
