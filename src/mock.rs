//! In-memory [`Connection`] for tests and dry runs.
//!
//! `MockConnection` understands the small statement subset Ladder itself emits
//! (`SHOW TABLES LIKE`, `CREATE TABLE`, `DROP TABLE`, `INSERT`, `UPDATE`,
//! `DELETE` and single-table `SELECT` with an optional `MAX(...)`), keeps a log
//! of every statement with its parameters, and can be told to fail statements
//! containing a given fragment. Anything else (for example `ALTER TABLE`) is
//! logged and accepted without effect.

use crate::connection::{Connection, DbError, Params, Row};
use crate::dialect::{Dialect, MySql};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeMap;

/// A statement as received by the connection
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<(String, Value)>,
}

type StoredRow = Vec<(String, Value)>;

#[derive(Debug, Default)]
struct MockState {
    tables: BTreeMap<String, Vec<StoredRow>>,
    log: Vec<Statement>,
    failures: Vec<(String, String)>,
    last_insert_id: Option<u64>,
    next_insert_id: u64,
}

#[derive(Default)]
struct Outcome {
    affected: u64,
    rows: Vec<Row>,
}

/// In-memory connection speaking the MySQL dialect
#[derive(Debug, Default)]
pub struct MockConnection {
    dialect: MySql,
    state: RefCell<MockState>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every later statement whose SQL contains `fragment`
    pub fn fail_on(&self, fragment: impl Into<String>, message: impl Into<String>) {
        self.state
            .borrow_mut()
            .failures
            .push((fragment.into(), message.into()));
    }

    pub fn clear_failures(&self) {
        self.state.borrow_mut().failures.clear();
    }

    /// Every statement received so far, including failed ones
    pub fn statements(&self) -> Vec<Statement> {
        self.state.borrow().log.clone()
    }

    /// SQL text of every statement received so far
    pub fn executed_sql(&self) -> Vec<String> {
        self.state.borrow().log.iter().map(|s| s.sql.clone()).collect()
    }

    pub fn clear_log(&self) {
        self.state.borrow_mut().log.clear();
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.state.borrow().tables.contains_key(table)
    }

    /// Current contents of `table`, empty if it does not exist
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.state
            .borrow()
            .tables
            .get(table)
            .map(|rows| rows.iter().map(|r| Row::new(r.clone())).collect())
            .unwrap_or_default()
    }

    /// Create `table` directly, bypassing the statement log
    pub fn seed_table(&self, table: &str) {
        self.state
            .borrow_mut()
            .tables
            .entry(table.to_string())
            .or_default();
    }

    /// Append a row directly, creating the table if needed
    pub fn seed_row<I, K>(&self, table: &str, row: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let row = row.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.state
            .borrow_mut()
            .tables
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    fn run(&self, sql: &str, params: &Params) -> Result<Outcome, DbError> {
        let mut state = self.state.borrow_mut();
        state.log.push(Statement {
            sql: sql.to_string(),
            params: params.to_vec(),
        });

        if let Some((_, message)) = state
            .failures
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
        {
            return Err(DbError::QueryError(message.clone()));
        }

        let trimmed = sql.trim();
        if let Some(rest) = trimmed.strip_prefix("SHOW TABLES LIKE ") {
            let table = parse_string_literal(rest)
                .ok_or_else(|| DbError::QueryError(format!("Malformed statement: {sql}")))?;
            let rows = if state.tables.contains_key(&table) {
                vec![Row::new([("table", Value::String(table))])]
            } else {
                Vec::new()
            };
            return Ok(Outcome { affected: 0, rows });
        }

        if let Some(rest) = trimmed.strip_prefix("CREATE TABLE ") {
            let (table, _) = parse_identifier(rest).ok_or_else(|| malformed(sql))?;
            if state.tables.contains_key(&table) {
                return Err(DbError::QueryError(format!("Table '{table}' already exists")));
            }
            state.tables.insert(table, Vec::new());
            return Ok(Outcome::default());
        }

        if let Some(rest) = trimmed.strip_prefix("DROP TABLE ") {
            let (table, _) = parse_identifier(rest).ok_or_else(|| malformed(sql))?;
            if state.tables.remove(&table).is_none() {
                return Err(DbError::QueryError(format!("Unknown table '{table}'")));
            }
            return Ok(Outcome::default());
        }

        if let Some(rest) = trimmed.strip_prefix("INSERT INTO ") {
            return insert(&mut state, sql, rest, params);
        }

        if let Some(rest) = trimmed.strip_prefix("UPDATE ") {
            return update(&mut state, sql, rest, params);
        }

        if let Some(rest) = trimmed.strip_prefix("DELETE FROM ") {
            let (table, rest) = parse_identifier(rest).ok_or_else(|| malformed(sql))?;
            let conditions = parse_where(rest, params).ok_or_else(|| malformed(sql))?;
            let rows = existing_table(&mut state, &table)?;
            let before = rows.len();
            rows.retain(|row| !matches_all(row, &conditions));
            return Ok(Outcome {
                affected: (before - rows.len()) as u64,
                rows: Vec::new(),
            });
        }

        if let Some(rest) = trimmed.strip_prefix("SELECT ") {
            return select(&mut state, sql, rest, params);
        }

        Ok(Outcome::default())
    }
}

impl Connection for MockConnection {
    fn dialect(&self) -> &dyn Dialect {
        &self.dialect
    }

    fn execute(&self, sql: &str, params: &Params) -> Result<u64, DbError> {
        self.run(sql, params).map(|outcome| outcome.affected)
    }

    fn query(&self, sql: &str, params: &Params) -> Result<Vec<Row>, DbError> {
        self.run(sql, params).map(|outcome| outcome.rows)
    }

    fn last_insert_id(&self) -> Result<Option<u64>, DbError> {
        Ok(self.state.borrow().last_insert_id)
    }
}

fn malformed(sql: &str) -> DbError {
    DbError::QueryError(format!("Malformed statement: {sql}"))
}

fn existing_table<'a>(
    state: &'a mut MockState,
    table: &str,
) -> Result<&'a mut Vec<StoredRow>, DbError> {
    state
        .tables
        .get_mut(table)
        .ok_or_else(|| DbError::QueryError(format!("Table '{table}' doesn't exist")))
}

fn insert(state: &mut MockState, sql: &str, rest: &str, params: &Params) -> Result<Outcome, DbError> {
    let (table, rest) = parse_identifier(rest).ok_or_else(|| malformed(sql))?;
    let columns = rest
        .trim_start()
        .strip_prefix('(')
        .and_then(|r| r.split_once(") VALUES"))
        .map(|(list, _)| parse_identifier_list(list))
        .ok_or_else(|| malformed(sql))?
        .ok_or_else(|| malformed(sql))?;

    if columns.len() != params.len() {
        return Err(DbError::QueryError(format!(
            "Column count doesn't match value count: {} columns, {} values",
            columns.len(),
            params.len()
        )));
    }

    let row: StoredRow = columns
        .into_iter()
        .zip(params.iter().map(|(_, v)| v.clone()))
        .collect();

    state.next_insert_id += 1;
    let id = row
        .iter()
        .find(|(c, _)| c == "id")
        .and_then(|(_, v)| v.as_u64())
        .unwrap_or(state.next_insert_id);

    existing_table(state, &table)?.push(row);
    state.last_insert_id = Some(id);

    Ok(Outcome {
        affected: 1,
        rows: Vec::new(),
    })
}

fn update(state: &mut MockState, sql: &str, rest: &str, params: &Params) -> Result<Outcome, DbError> {
    let (table, rest) = parse_identifier(rest).ok_or_else(|| malformed(sql))?;
    let rest = rest.trim_start().strip_prefix("SET ").ok_or_else(|| malformed(sql))?;
    let (set_clause, where_clause) = match rest.split_once(" WHERE ") {
        Some((set, cond)) => (set, format!("WHERE {cond}")),
        None => (rest, String::new()),
    };

    let assignments = parse_assignments(set_clause, ", ", params).ok_or_else(|| malformed(sql))?;
    let conditions = parse_where(&where_clause, params).ok_or_else(|| malformed(sql))?;

    let mut affected = 0;
    for row in existing_table(state, &table)?.iter_mut() {
        if !matches_all(row, &conditions) {
            continue;
        }
        for (column, value) in &assignments {
            match row.iter_mut().find(|(c, _)| c == column) {
                Some((_, v)) => *v = value.clone(),
                None => row.push((column.clone(), value.clone())),
            }
        }
        affected += 1;
    }

    Ok(Outcome {
        affected,
        rows: Vec::new(),
    })
}

fn select(state: &mut MockState, sql: &str, rest: &str, params: &Params) -> Result<Outcome, DbError> {
    let (list, rest) = rest.split_once(" FROM ").ok_or_else(|| malformed(sql))?;
    let (table, rest) = parse_identifier(rest).ok_or_else(|| malformed(sql))?;
    let conditions = parse_where(rest, params).ok_or_else(|| malformed(sql))?;

    let matching: Vec<StoredRow> = existing_table(state, &table)?
        .iter()
        .filter(|row| matches_all(row, &conditions))
        .cloned()
        .collect();

    let list = list.trim();
    if let Some(inner) = list.strip_prefix("MAX(").and_then(|r| r.strip_suffix(')')) {
        let (column, _) = parse_identifier(inner).ok_or_else(|| malformed(sql))?;
        let max = matching
            .iter()
            .filter_map(|row| lookup(row, &column).as_u64())
            .max()
            .map_or(Value::Null, Value::from);
        return Ok(Outcome {
            affected: 0,
            rows: vec![Row::new([(list.to_string(), max)])],
        });
    }

    let rows = if list == "*" {
        matching.into_iter().map(Row::new).collect()
    } else {
        let columns = parse_identifier_list(list).ok_or_else(|| malformed(sql))?;
        matching
            .iter()
            .map(|row| Row::new(columns.iter().map(|c| (c.clone(), lookup(row, c)))))
            .collect()
    };

    Ok(Outcome { affected: 0, rows })
}

fn lookup(row: &StoredRow, column: &str) -> Value {
    row.iter()
        .find(|(c, _)| c == column)
        .map(|(_, v)| v.clone())
        .unwrap_or(Value::Null)
}

fn matches_all(row: &StoredRow, conditions: &[(String, Value)]) -> bool {
    conditions
        .iter()
        .all(|(column, expected)| lookup(row, column) == *expected)
}

/// Parse an optional `WHERE `a` = :p AND ...` clause
fn parse_where(rest: &str, params: &Params) -> Option<Vec<(String, Value)>> {
    let rest = rest.trim();
    if rest.is_empty() {
        return Some(Vec::new());
    }
    let clause = rest.strip_prefix("WHERE ")?;
    parse_assignments(clause, " AND ", params)
}

/// Parse `` `col` = :param `` pairs, resolving each parameter's value
fn parse_assignments(clause: &str, separator: &str, params: &Params) -> Option<Vec<(String, Value)>> {
    clause
        .split(separator)
        .map(|part| {
            let (column, rest) = parse_identifier(part)?;
            let name = rest.trim_start().strip_prefix("= :")?.trim();
            let value = params
                .iter()
                .find(|(p, _)| p == name)
                .map(|(_, v)| v.clone())
                .unwrap_or(Value::Null);
            Some((column, value))
        })
        .collect()
}

fn parse_identifier_list(list: &str) -> Option<Vec<String>> {
    list.split(',')
        .map(|part| parse_identifier(part).map(|(name, _)| name))
        .collect()
}

/// Split a leading backtick-quoted identifier from `s`
fn parse_identifier(s: &str) -> Option<(String, &str)> {
    let rest = s.trim_start().strip_prefix('`')?;
    let mut name = String::new();
    let mut chars = rest.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '`' {
            if let Some(&(_, '`')) = chars.peek() {
                chars.next();
                name.push('`');
                continue;
            }
            return Some((name, &rest[i + 1..]));
        }
        name.push(c);
    }
    None
}

/// Unquote a single-quoted, backslash-escaped literal
fn parse_string_literal(s: &str) -> Option<String> {
    let inner = s.trim().strip_prefix('\'')?.strip_suffix('\'')?;
    let mut value = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            value.push(chars.next()?);
        } else {
            value.push(c);
        }
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::params;
    use serde_json::json;

    #[test]
    fn test_table_lifecycle() {
        let db = MockConnection::new();
        let probe = "SHOW TABLES LIKE 'ladder:migrations'";

        assert!(db.query(probe, &[]).expect("probe").is_empty());

        db.execute("CREATE TABLE `ladder:migrations` (\n    `id` INTEGER\n)", &[])
            .expect("create");
        assert_eq!(db.query(probe, &[]).expect("probe").len(), 1);

        db.execute("DROP TABLE `ladder:migrations`", &[]).expect("drop");
        assert!(!db.has_table("ladder:migrations"));
    }

    #[test]
    fn test_insert_select_delete() {
        let db = MockConnection::new();
        db.seed_table("t");

        for id in [3u64, 7] {
            db.execute(
                "INSERT INTO `t` (`id`, `data`) VALUES (:id, :data)",
                &params([("id", json!(id)), ("data", Value::Null)]),
            )
            .expect("insert");
        }
        assert_eq!(db.last_insert_id().expect("id"), Some(7));

        let max = db.query_scalar("SELECT MAX(`id`) FROM `t`", &[]).expect("max");
        assert_eq!(max, Some(json!(7)));

        let rows = db
            .query(
                "SELECT `data` FROM `t` WHERE `id` = :id",
                &params([("id", json!(3))]),
            )
            .expect("select");
        assert_eq!(rows, vec![Row::new([("data", Value::Null)])]);

        let deleted = db
            .execute("DELETE FROM `t` WHERE `id` = :id", &params([("id", json!(3))]))
            .expect("delete");
        assert_eq!(deleted, 1);
        assert_eq!(db.rows("t").len(), 1);
    }

    #[test]
    fn test_max_of_empty_table_is_null() {
        let db = MockConnection::new();
        db.seed_table("t");
        let max = db.query_scalar("SELECT MAX(`id`) FROM `t`", &[]).expect("max");
        assert_eq!(max, Some(Value::Null));
    }

    #[test]
    fn test_update() {
        let db = MockConnection::new();
        db.seed_row("users", [("id", json!(1)), ("name", json!("Alice"))]);

        let affected = db
            .execute(
                "UPDATE `users` SET `name` = :data_name WHERE `id` = :where_id",
                &params([("data_name", json!("Alicia")), ("where_id", json!(1))]),
            )
            .expect("update");

        assert_eq!(affected, 1);
        assert_eq!(db.rows("users")[0].get("name"), Some(&json!("Alicia")));
    }

    #[test]
    fn test_missing_table_errors() {
        let db = MockConnection::new();
        let err = db
            .query("SELECT `id` FROM `ladder:migrations`", &[])
            .expect_err("table is missing");
        assert_eq!(
            err.to_string(),
            "Query error: Table 'ladder:migrations' doesn't exist"
        );
    }

    #[test]
    fn test_failure_injection_and_log() {
        let db = MockConnection::new();
        db.fail_on("ALTER TABLE", "boom");

        let err = db
            .execute("ALTER TABLE `users`\n    DROP COLUMN `x`", &[])
            .expect_err("injected");
        assert!(matches!(err, DbError::QueryError(ref m) if m == "boom"));

        db.clear_failures();
        db.execute("ALTER TABLE `users`\n    DROP COLUMN `x`", &[])
            .expect("accepted without effect");

        assert_eq!(db.executed_sql().len(), 2);
        db.clear_log();
        assert!(db.statements().is_empty());
    }
}
