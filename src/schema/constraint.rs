//! Foreign key constraints

use crate::dialect::{Dialect, MySql};
use std::fmt;

/// `ON DELETE` / `ON UPDATE` action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferentialAction {
    Restrict,
    Cascade,
    SetNull,
    NoAction,
    SetDefault,
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sql = match self {
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::SetDefault => "SET DEFAULT",
        };
        f.write_str(sql)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintOptions {
    /// Explicit name; otherwise [`Constraint::default_name`] is used
    pub name: Option<String>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
}

impl ConstraintOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }
}

/// A `FOREIGN KEY` constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    name: String,
    columns: Vec<String>,
    reference_table: String,
    reference_columns: Vec<String>,
    on_delete: Option<ReferentialAction>,
    on_update: Option<ReferentialAction>,
}

impl Constraint {
    /// Create a constraint with an explicit name
    ///
    /// `options.name` is ignored here; [`Table`](super::Table) resolves it.
    pub fn new(
        name: impl Into<String>,
        columns: &[&str],
        reference_table: impl Into<String>,
        reference_columns: &[&str],
        options: &ConstraintOptions,
    ) -> Self {
        Self {
            name: name.into(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            reference_table: reference_table.into(),
            reference_columns: reference_columns.iter().map(|c| c.to_string()).collect(),
            on_delete: options.on_delete,
            on_update: options.on_update,
        }
    }

    /// Deterministic name derived from the definition:
    /// `table:col1,col2::refTable:ref1,ref2`
    ///
    /// Adding a constraint without a name and dropping it by the same
    /// definition resolve to this identifier.
    pub fn default_name(
        table: &str,
        columns: &[&str],
        reference_table: &str,
        reference_columns: &[&str],
    ) -> String {
        format!(
            "{}:{}::{}:{}",
            table,
            columns.join(","),
            reference_table,
            reference_columns.join(",")
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create_sql(&self) -> String {
        let quote_all = |names: &[String]| {
            names
                .iter()
                .map(|c| MySql.quote_identifier(c))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut sql = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            MySql.quote_identifier(&self.name),
            quote_all(&self.columns),
            MySql.quote_identifier(&self.reference_table),
            quote_all(&self.reference_columns)
        );

        if let Some(action) = self.on_delete {
            sql.push_str(&format!(" ON DELETE {action}"));
        }
        if let Some(action) = self.on_update {
            sql.push_str(&format!(" ON UPDATE {action}"));
        }

        sql
    }

    pub fn add_sql(&self) -> String {
        format!("ADD {}", self.create_sql())
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP FOREIGN KEY {}", MySql.quote_identifier(&self.name))
    }
}
