//! Table builder against the in-memory connection

use ladder::mock::MockConnection;
use ladder::schema::{
    ColumnOptions, ConstraintOptions, IndexOptions, ReferentialAction, SchemaError, Table,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::rc::Rc;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/import")
        .join(name)
}

fn users(db: &Rc<MockConnection>) -> Table {
    let mut table = Table::new(db.clone(), "users");
    table
        .add_column("id", "autoincrement", ColumnOptions::new().unsigned())
        .add_column("name", "varchar", ColumnOptions::new().limit(64).not_null())
        .add_column("role", "varchar", ColumnOptions::new().limit(32))
        .add_index("PRIMARY", &["id"], IndexOptions::new())
        .create()
        .expect("create users");
    table
}

fn column(db: &MockConnection, table: &str, name: &str) -> Vec<Value> {
    db.rows(table)
        .iter()
        .map(|row| row.get(name).cloned().unwrap_or(Value::Null))
        .collect()
}

#[test]
fn test_create_then_alter() {
    let db = Rc::new(MockConnection::new());
    let mut table = users(&db);
    assert!(db.has_table("users"));
    assert!(table.is_clean());

    table
        .add_column("email", "varchar", ColumnOptions::new().limit(255).after("name"))
        .add_index("email", &[], IndexOptions::new().unique())
        .add_constraint(
            &["team_id"],
            "teams",
            &["id"],
            ConstraintOptions::new().on_delete(ReferentialAction::Cascade),
        )
        .drop_column("role")
        .alter()
        .expect("alter");

    let sql = db.executed_sql();
    assert_eq!(
        sql.last().map(String::as_str),
        Some(
            "ALTER TABLE `users`\n    \
             DROP COLUMN `role`,\n    \
             ADD COLUMN `email` VARCHAR(255) AFTER `name`,\n    \
             ADD UNIQUE KEY `email` (`email`),\n    \
             ADD CONSTRAINT `users:team_id::teams:id` FOREIGN KEY (`team_id`) REFERENCES `teams` (`id`) ON DELETE CASCADE"
        )
    );
    assert!(table.is_clean());
}

#[test]
fn test_empty_statements_are_refused() {
    let db = Rc::new(MockConnection::new());
    let mut table = Table::new(db.clone(), "empty");

    assert!(matches!(
        table.create(),
        Err(SchemaError::EmptyStatement { statement: "create", .. })
    ));
    assert!(matches!(
        table.alter(),
        Err(SchemaError::EmptyStatement { statement: "alter", .. })
    ));
    assert!(db.executed_sql().is_empty());
}

#[test]
fn test_failed_create_keeps_buffers() {
    let db = Rc::new(MockConnection::new());
    db.fail_on("CREATE TABLE `users`", "Table 'users' already exists");

    let mut table = Table::new(db.clone(), "users");
    table.add_column("id", "autoincrement", ColumnOptions::new());
    match table.create() {
        Err(err @ SchemaError::StatementFailure { .. }) => {
            assert_eq!(
                err.to_string(),
                "Failed to create table `users`: Query error: Table 'users' already exists"
            );
        }
        Err(other) => panic!("Expected StatementFailure, got {other:?}"),
        Ok(_) => panic!("Expected StatementFailure, got Ok"),
    }
    assert!(!table.is_clean());

    db.clear_failures();
    table.create().expect("retry");
    assert!(db.has_table("users"));
}

#[test]
fn test_import_csv_file() {
    let db = Rc::new(MockConnection::new());
    let mut table = users(&db);

    let count = table.import(fixture("users.csv")).expect("import");
    assert_eq!(count, 2);
    assert_eq!(column(&db, "users", "name"), vec![json!("Alice"), json!("Bob")]);
    // CSV cells stay strings; the NULL sentinel becomes SQL NULL
    assert_eq!(column(&db, "users", "id"), vec![json!("1"), json!("2")]);
    assert_eq!(column(&db, "users", "role"), vec![json!("Developer"), Value::Null]);
}

#[test]
fn test_import_json_files() {
    for name in ["users.json", "users_structured.json"] {
        let db = Rc::new(MockConnection::new());
        let mut table = users(&db);

        assert_eq!(table.import(fixture(name)).expect("import"), 2, "{name}");
        assert_eq!(column(&db, "users", "id"), vec![json!(1), json!(2)], "{name}");
        assert_eq!(
            column(&db, "users", "role"),
            vec![json!("Developer"), Value::Null],
            "{name}"
        );
        assert_eq!(table.last_insert_id(), Some(2), "{name}");
    }
}

#[test]
fn test_import_rejects_unknown_extension() {
    let db = Rc::new(MockConnection::new());
    let mut table = Table::new(db.clone(), "users");

    match table.import("users.xml") {
        Err(SchemaError::InvalidImport(message)) => {
            assert_eq!(message, "Invalid file extension: xml");
        }
        other => panic!("Expected InvalidImport, got {other:?}"),
    }
}

#[test]
fn test_update_and_delete() {
    let db = Rc::new(MockConnection::new());
    let mut table = users(&db);
    table
        .insert([("id", json!(1)), ("name", json!("Alice")), ("role", json!("Developer"))])
        .expect("insert")
        .insert([("id", json!(2)), ("name", json!("Bob")), ("role", json!("Developer"))])
        .expect("insert");
    assert_eq!(table.last_insert_id(), Some(2));

    let updated = table
        .update([("role", "Manager")], [("name", "Bob")])
        .expect("update");
    assert_eq!(updated, 1);
    assert_eq!(
        column(&db, "users", "role"),
        vec![json!("Developer"), json!("Manager")]
    );

    let deleted = table.delete([("role", "Developer")]).expect("delete");
    assert_eq!(deleted, 1);
    assert_eq!(column(&db, "users", "name"), vec![json!("Bob")]);

    table.drop().expect("drop");
    assert!(!db.has_table("users"));
}
