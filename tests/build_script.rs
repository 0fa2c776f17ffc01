//! Manifest generation for `build.rs`

use ladder::migration::build_script::generate_manifest;
use ladder::MigrationError;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/migrations")
}

#[test]
fn test_generate_manifest_for_fixtures() {
    let out = TempDir::new().expect("Failed to create temp dir");
    let output = out.path().join("app_migrations.rs");

    let files = generate_manifest("app", &fixtures(), &output).expect("generate");
    let ids: Vec<u64> = files.iter().map(|f| f.id.value()).collect();
    assert_eq!(ids, vec![10, 20]);

    let manifest = fs::read_to_string(&output).expect("manifest written");
    let dir = fs::canonicalize(fixtures()).expect("canonical path");
    let expected_path = dir.join("Migration000010.rs").to_string_lossy().replace('\\', "/");

    assert!(manifest.starts_with("// Auto-generated migration manifest\n"));
    assert!(manifest.contains(&format!("#[path = r#\"{expected_path}\"#]\npub mod migration_000010;")));
    assert!(manifest.contains("registry.register(NAMESPACE, 10, migration_000010::Migration000010::new)?;"));
    assert!(manifest.contains("registry.register(NAMESPACE, 20, migration_000020::Migration000020::new)?;"));
}

#[test]
fn test_generate_manifest_skips_other_files() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for name in ["Migration5.rs", "README.md", "migration6.rs", "Migration7.rs.bak"] {
        fs::write(dir.path().join(name), "").expect("write");
    }
    fs::create_dir(dir.path().join("Migration8.rs")).expect("mkdir");

    let output = dir.path().join("manifest.rs");
    let files = generate_manifest("app", dir.path(), &output).expect("generate");
    let ids: Vec<u64> = files.iter().map(|f| f.id.value()).collect();
    assert_eq!(ids, vec![5]);
}

#[test]
fn test_generate_manifest_rejects_duplicate_ids() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for name in ["Migration5.rs", "Migration005.rs"] {
        fs::write(dir.path().join(name), "").expect("write");
    }

    let output = dir.path().join("manifest.rs");
    assert!(matches!(
        generate_manifest("app", dir.path(), &output),
        Err(MigrationError::DuplicateId { .. })
    ));
    assert!(!output.exists());
}

#[test]
fn test_generate_manifest_missing_directory() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let output = dir.path().join("manifest.rs");
    assert!(matches!(
        generate_manifest("app", &dir.path().join("missing"), &output),
        Err(MigrationError::Io { .. })
    ));
}
