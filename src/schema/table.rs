//! Table builder: buffered DDL plus row helpers

use super::column::{Column, ColumnOptions};
use super::constraint::{Constraint, ConstraintOptions};
use super::error::SchemaError;
use super::import::{self, ImportFormat, ImportRow};
use super::index::{Index, IndexOptions};
use crate::connection::{Params, SharedConnection};
use serde_json::Value;
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;

/// Entries keyed by name; re-inserting a name replaces the entry in place.
#[derive(Debug, Clone)]
struct Bucket<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for Bucket<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Bucket<T> {
    fn put(&mut self, name: String, value: T) {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, v)| v)
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
struct Actions<T> {
    add: Bucket<T>,
    alter: Bucket<T>,
    drop: Bucket<T>,
}

impl<T> Default for Actions<T> {
    fn default() -> Self {
        Self {
            add: Bucket::default(),
            alter: Bucket::default(),
            drop: Bucket::default(),
        }
    }
}

impl<T> Actions<T> {
    fn is_empty(&self) -> bool {
        self.add.is_empty() && self.alter.is_empty() && self.drop.is_empty()
    }
}

/// A database table
///
/// Column, index and constraint changes are buffered until
/// [`create`](Self::create) or [`alter`](Self::alter) emits them as a single
/// statement. Row helpers and [`drop`](Self::drop) run immediately.
///
/// ```no_run
/// use ladder::schema::{ColumnOptions, IndexOptions, Table};
/// # fn example(db: ladder::SharedConnection) -> Result<(), ladder::schema::SchemaError> {
/// Table::new(db, "users")
///     .add_column("id", "autoincrement", ColumnOptions::new().unsigned())
///     .add_column("username", "varchar", ColumnOptions::new().limit(32).not_null())
///     .add_index("PRIMARY", &["id"], IndexOptions::new())
///     .add_index("username", &[], IndexOptions::new().unique())
///     .create()?;
/// # Ok(())
/// # }
/// ```
pub struct Table {
    db: SharedConnection,
    name: String,
    columns: Actions<Column>,
    indexes: Actions<Index>,
    constraints: Actions<Constraint>,
    last_insert_id: Option<u64>,
}

impl Table {
    pub fn new(db: SharedConnection, name: impl Into<String>) -> Self {
        Self {
            db,
            name: name.into(),
            columns: Actions::default(),
            indexes: Actions::default(),
            constraints: Actions::default(),
            last_insert_id: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when no column, index or constraint change is buffered
    pub fn is_clean(&self) -> bool {
        self.columns.is_empty() && self.indexes.is_empty() && self.constraints.is_empty()
    }

    pub fn add_column(
        &mut self,
        name: &str,
        column_type: &str,
        options: ColumnOptions,
    ) -> &mut Self {
        self.columns
            .add
            .put(name.to_string(), Column::new(name, column_type, options));
        self
    }

    pub fn alter_column(
        &mut self,
        name: &str,
        column_type: &str,
        options: ColumnOptions,
    ) -> &mut Self {
        self.columns
            .alter
            .put(name.to_string(), Column::new(name, column_type, options));
        self
    }

    pub fn drop_column(&mut self, name: &str) -> &mut Self {
        self.columns
            .drop
            .put(name.to_string(), Column::new(name, "", ColumnOptions::new()));
        self
    }

    /// Buffer an index; an empty `columns` indexes the column named `name`
    pub fn add_index(&mut self, name: &str, columns: &[&str], options: IndexOptions) -> &mut Self {
        let index = if columns.is_empty() {
            Index::new(name, [name], options)
        } else {
            Index::new(name, columns.iter().copied(), options)
        };
        self.indexes.add.put(name.to_string(), index);
        self
    }

    pub fn drop_index(&mut self, name: &str) -> &mut Self {
        self.indexes.drop.put(
            name.to_string(),
            Index::new(name, Vec::<String>::new(), IndexOptions::new()),
        );
        self
    }

    /// Buffer a foreign key; unnamed constraints get [`Constraint::default_name`]
    pub fn add_constraint(
        &mut self,
        columns: &[&str],
        reference_table: &str,
        reference_columns: &[&str],
        options: ConstraintOptions,
    ) -> &mut Self {
        let name = options.name.clone().unwrap_or_else(|| {
            Constraint::default_name(&self.name, columns, reference_table, reference_columns)
        });
        let constraint = Constraint::new(
            name.clone(),
            columns,
            reference_table,
            reference_columns,
            &options,
        );
        self.constraints.add.put(name, constraint);
        self
    }

    /// Drop the constraint an unnamed [`add_constraint`](Self::add_constraint)
    /// with the same definition would have created
    pub fn drop_constraint(
        &mut self,
        columns: &[&str],
        reference_table: &str,
        reference_columns: &[&str],
    ) -> &mut Self {
        let name = Constraint::default_name(&self.name, columns, reference_table, reference_columns);
        self.drop_constraint_by_name(&name)
    }

    pub fn drop_constraint_by_name(&mut self, name: &str) -> &mut Self {
        self.constraints.drop.put(
            name.to_string(),
            Constraint::new(name, &[], "", &[], &ConstraintOptions::new()),
        );
        self
    }

    /// `CREATE TABLE` for the buffered additions: columns, then indexes, then constraints
    pub fn create_sql(&self) -> String {
        let elements: Vec<String> = self
            .columns
            .add
            .values()
            .map(Column::create_sql)
            .chain(self.indexes.add.values().map(Index::create_sql))
            .chain(self.constraints.add.values().map(Constraint::create_sql))
            .collect();

        format!(
            "CREATE TABLE {} (\n    {}\n)",
            self.quoted_name(),
            elements.join(",\n    ")
        )
    }

    /// `ALTER TABLE` for everything buffered
    ///
    /// Fragment order is fixed regardless of call order: drop column, alter
    /// column, add column, drop index, add index, drop constraint, add
    /// constraint.
    pub fn alter_sql(&self) -> String {
        let elements: Vec<String> = self
            .columns
            .drop
            .values()
            .map(Column::drop_sql)
            .chain(self.columns.alter.values().map(Column::alter_sql))
            .chain(self.columns.add.values().map(Column::add_sql))
            .chain(self.indexes.drop.values().map(Index::drop_sql))
            .chain(self.indexes.add.values().map(Index::add_sql))
            .chain(self.constraints.drop.values().map(Constraint::drop_sql))
            .chain(self.constraints.add.values().map(Constraint::add_sql))
            .collect();

        format!(
            "ALTER TABLE {}\n    {}",
            self.quoted_name(),
            elements.join(",\n    ")
        )
    }

    /// Execute `CREATE TABLE` and clear the buffers
    pub fn create(&mut self) -> Result<&mut Self, SchemaError> {
        if self.columns.add.is_empty() {
            return Err(SchemaError::EmptyStatement {
                statement: "create",
                table: self.name.clone(),
            });
        }

        self.check_defaults()?;
        let sql = self.create_sql();
        self.run("create table", &sql, &[])?;
        self.clear();
        Ok(self)
    }

    /// Execute `ALTER TABLE` and clear the buffers
    pub fn alter(&mut self) -> Result<&mut Self, SchemaError> {
        if self.is_clean() {
            return Err(SchemaError::EmptyStatement {
                statement: "alter",
                table: self.name.clone(),
            });
        }

        self.check_defaults()?;
        let sql = self.alter_sql();
        self.run("alter table", &sql, &[])?;
        self.clear();
        Ok(self)
    }

    /// Execute `DROP TABLE` immediately; buffers are left alone
    pub fn drop(&mut self) -> Result<&mut Self, SchemaError> {
        let sql = format!("DROP TABLE {}", self.quoted_name());
        self.run("drop table", &sql, &[])?;
        Ok(self)
    }

    /// Insert one row and remember the generated id
    pub fn insert<I, K, V>(&mut self, data: I) -> Result<&mut Self, SchemaError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let data: Vec<(String, Value)> = data
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let (sql, params) = {
            let dialect = self.db.dialect();
            let mut columns = Vec::with_capacity(data.len());
            let mut placeholders = Vec::with_capacity(data.len());
            let mut params = Vec::with_capacity(data.len());
            let mut names = ParamNames::default();
            for (column, value) in data {
                let param = names.claim("", &column);
                columns.push(dialect.quote_identifier(&column));
                placeholders.push(dialect.placeholder(&param));
                params.push((param, value));
            }
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                dialect.quote_identifier(&self.name),
                columns.join(", "),
                placeholders.join(", ")
            );
            (sql, params)
        };

        self.run("insert into", &sql, &params)?;
        let id = self
            .db
            .last_insert_id()
            .map_err(|source| self.failure("insert into", source))?;
        self.last_insert_id = id;
        Ok(self)
    }

    /// Update rows matching every `where` pair; returns the affected row count
    ///
    /// SET values bind as `data_<column>` and WHERE values as `where_<column>`,
    /// so the same column may appear on both sides. An empty `data` is refused
    /// with [`SchemaError::EmptyStatement`].
    pub fn update<D, W, K, V, K2, V2>(&mut self, data: D, conditions: W) -> Result<u64, SchemaError>
    where
        D: IntoIterator<Item = (K, V)>,
        W: IntoIterator<Item = (K2, V2)>,
        K: Into<String>,
        V: Into<Value>,
        K2: Into<String>,
        V2: Into<Value>,
    {
        let data: Vec<(String, Value)> = data
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if data.is_empty() {
            return Err(SchemaError::EmptyStatement {
                statement: "update",
                table: self.name.clone(),
            });
        }

        let dialect = self.db.dialect();
        let mut params = Vec::new();
        let mut names = ParamNames::default();

        let assignments: Vec<String> = data
            .into_iter()
            .map(|(column, value)| {
                let param = names.claim("data_", &column);
                let sql = format!(
                    "{} = {}",
                    dialect.quote_identifier(&column),
                    dialect.placeholder(&param)
                );
                params.push((param, value));
                sql
            })
            .collect();

        let where_clause = self.where_clause("where_", conditions, &mut names, &mut params);
        let sql = format!(
            "UPDATE {} SET {}{}",
            dialect.quote_identifier(&self.name),
            assignments.join(", "),
            where_clause
        );

        self.run("update", &sql, &params)
    }

    /// Delete rows matching every `where` pair; returns the affected row count
    pub fn delete<W, K, V>(&mut self, conditions: W) -> Result<u64, SchemaError>
    where
        W: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut params = Vec::new();
        let where_clause =
            self.where_clause("", conditions, &mut ParamNames::default(), &mut params);
        let sql = format!(
            "DELETE FROM {}{}",
            self.db.dialect().quote_identifier(&self.name),
            where_clause
        );

        self.run("delete from", &sql, &params)
    }

    /// Id reported by the connection after the most recent [`insert`](Self::insert)
    pub fn last_insert_id(&self) -> Option<u64> {
        self.last_insert_id
    }

    /// Insert every row of a `.csv` or `.json` file; returns the row count
    ///
    /// See [`import`](super::import) for the accepted shapes.
    pub fn import(&mut self, path: impl AsRef<Path>) -> Result<usize, SchemaError> {
        let path = path.as_ref();
        let format = ImportFormat::from_path(path)?;
        let io_error = |source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        };

        let rows = match format {
            ImportFormat::Csv => import::read_csv(File::open(path).map_err(io_error)?)?,
            ImportFormat::Json => import::read_json(&std::fs::read_to_string(path).map_err(io_error)?)?,
        };

        log::debug!("Importing {} rows into `{}` from {}", rows.len(), self.name, path.display());
        self.insert_rows(rows)
    }

    /// Insert rows parsed from CSV text with a header row
    pub fn import_csv(&mut self, data: &str) -> Result<usize, SchemaError> {
        let rows = import::read_csv(data.as_bytes())?;
        self.insert_rows(rows)
    }

    /// Insert rows parsed from any accepted JSON shape
    pub fn import_json(&mut self, data: &str) -> Result<usize, SchemaError> {
        let rows = import::read_json(data)?;
        self.insert_rows(rows)
    }

    fn insert_rows(&mut self, rows: Vec<ImportRow>) -> Result<usize, SchemaError> {
        let count = rows.len();
        for row in rows {
            self.insert(row)?;
        }
        Ok(count)
    }

    fn where_clause<W, K, V>(
        &self,
        prefix: &str,
        conditions: W,
        names: &mut ParamNames,
        params: &mut Vec<(String, Value)>,
    ) -> String
    where
        W: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let dialect = self.db.dialect();
        let parts: Vec<String> = conditions
            .into_iter()
            .map(|(k, v)| {
                let column = k.into();
                let param = names.claim(prefix, &column);
                let sql = format!(
                    "{} = {}",
                    dialect.quote_identifier(&column),
                    dialect.placeholder(&param)
                );
                params.push((param, v.into()));
                sql
            })
            .collect();

        if parts.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", parts.join(" AND "))
        }
    }

    fn check_defaults(&self) -> Result<(), SchemaError> {
        let invalid = self
            .columns
            .add
            .values()
            .chain(self.columns.alter.values())
            .find(|column| {
                column
                    .options()
                    .default
                    .as_ref()
                    .is_some_and(|value| !value.is_representable())
            });

        match invalid {
            Some(column) => Err(SchemaError::InvalidDefault {
                column: column.name().to_string(),
                table: self.name.clone(),
            }),
            None => Ok(()),
        }
    }

    fn quoted_name(&self) -> String {
        self.db.dialect().quote_identifier(&self.name)
    }

    fn run(&self, operation: &'static str, sql: &str, params: &Params) -> Result<u64, SchemaError> {
        #[cfg(feature = "tracing")]
        let _span = crate::tracing_helpers::execute_statement_span(sql).entered();

        log::debug!("Executing on `{}`: {}", self.name, sql);
        self.db
            .execute(sql, params)
            .map_err(|source| self.failure(operation, source))
    }

    fn failure(&self, operation: &'static str, source: crate::connection::DbError) -> SchemaError {
        SchemaError::StatementFailure {
            operation,
            table: self.name.clone(),
            source,
        }
    }

    fn clear(&mut self) {
        self.columns = Actions::default();
        self.indexes = Actions::default();
        self.constraints = Actions::default();
    }
}

/// Placeholder names handed out for one statement
///
/// A name is `prefix` plus the column with any character outside
/// `[A-Za-z0-9_]` replaced by `_`. When two columns sanitize to the same name
/// the later one gets a `_2`, `_3`, ... suffix.
#[derive(Debug, Default)]
struct ParamNames {
    used: HashSet<String>,
}

impl ParamNames {
    fn claim(&mut self, prefix: &str, column: &str) -> String {
        let base = param_name(prefix, column);
        let mut name = base.clone();
        let mut suffix = 2;
        while self.used.contains(&name) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        self.used.insert(name.clone());
        name
    }
}

fn param_name(prefix: &str, column: &str) -> String {
    let mut name = String::with_capacity(prefix.len() + column.len());
    name.push_str(prefix);
    name.extend(
        column
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' }),
    );
    name
}
