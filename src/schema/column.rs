//! Column definitions and their DDL fragments

use crate::dialect::{quote_mysql_string, Dialect, MySql};
use std::fmt;

/// Column type that lowers to `INTEGER … NOT NULL AUTO_INCREMENT`
pub const AUTOINCREMENT: &str = "autoincrement";

/// Value of a column `DEFAULT` clause
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Emitted bare
    Integer(i64),
    /// Emitted bare; must be finite
    Float(f64),
    /// Emitted single-quoted
    String(String),
    /// Emitted verbatim, e.g. `CURRENT_TIMESTAMP`
    Expression(String),
}

impl DefaultValue {
    /// Raw SQL expression default
    pub fn expression(sql: impl Into<String>) -> Self {
        DefaultValue::Expression(sql.into())
    }

    /// Whether the value can be written as a SQL literal; NaN and infinities cannot
    pub fn is_representable(&self) -> bool {
        match self {
            DefaultValue::Float(v) => v.is_finite(),
            _ => true,
        }
    }

    fn to_sql(&self) -> String {
        match self {
            DefaultValue::Integer(v) => v.to_string(),
            DefaultValue::Float(v) => v.to_string(),
            DefaultValue::String(v) => quote_mysql_string(v),
            DefaultValue::Expression(v) => v.clone(),
        }
    }
}

impl From<i64> for DefaultValue {
    fn from(value: i64) -> Self {
        DefaultValue::Integer(value)
    }
}

impl From<i32> for DefaultValue {
    fn from(value: i32) -> Self {
        DefaultValue::Integer(i64::from(value))
    }
}

impl From<u32> for DefaultValue {
    fn from(value: u32) -> Self {
        DefaultValue::Integer(i64::from(value))
    }
}

impl From<bool> for DefaultValue {
    fn from(value: bool) -> Self {
        DefaultValue::Integer(i64::from(value))
    }
}

impl From<f64> for DefaultValue {
    fn from(value: f64) -> Self {
        DefaultValue::Float(value)
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        DefaultValue::String(value.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        DefaultValue::String(value)
    }
}

/// Options for a [`Column`]
///
/// Columns are nullable unless [`not_null`](Self::not_null) is called.
///
/// ```
/// use ladder::schema::ColumnOptions;
///
/// let opts = ColumnOptions::new().limit(30).not_null().default("guest");
/// assert!(!opts.nullable);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnOptions {
    /// Parenthesised length, e.g. `30` or `10,2`
    pub limit: Option<String>,
    /// Enumerated values for `ENUM`/`SET` columns; ignored when `limit` is set
    pub values: Vec<String>,
    pub unsigned: bool,
    pub nullable: bool,
    pub default: Option<DefaultValue>,
    /// Place the column first; wins over `after`
    pub first: bool,
    pub after: Option<String>,
    /// New name, used by `ALTER` to emit `CHANGE COLUMN`
    pub rename: Option<String>,
}

impl Default for ColumnOptions {
    fn default() -> Self {
        Self {
            limit: None,
            values: Vec::new(),
            unsigned: false,
            nullable: true,
            default: None,
            first: false,
            after: None,
            rename: None,
        }
    }
}

impl ColumnOptions {
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    pub fn limit(mut self, limit: impl fmt::Display) -> Self {
        self.limit = Some(limit.to_string());
        self
    }

    pub fn values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn default(mut self, value: impl Into<DefaultValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn first(mut self) -> Self {
        self.first = true;
        self
    }

    pub fn after(mut self, column: impl Into<String>) -> Self {
        self.after = Some(column.into());
        self
    }

    pub fn rename(mut self, new_name: impl Into<String>) -> Self {
        self.rename = Some(new_name.into());
        self
    }
}

/// A table column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    column_type: String,
    options: ColumnOptions,
}

impl Column {
    pub fn new(
        name: impl Into<String>,
        column_type: impl Into<String>,
        options: ColumnOptions,
    ) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> &str {
        &self.column_type
    }

    pub fn options(&self) -> &ColumnOptions {
        &self.options
    }

    /// Fragment used inside `CREATE TABLE`
    pub fn create_sql(&self) -> String {
        format!("{} {}", MySql.quote_identifier(&self.name), self.definition())
    }

    /// Fragment used by `ALTER TABLE` to add the column
    pub fn add_sql(&self) -> String {
        format!("ADD COLUMN {}", self.create_sql())
    }

    /// Fragment used by `ALTER TABLE` to modify the column
    ///
    /// A `rename` option produces `CHANGE COLUMN old new …`, otherwise
    /// `MODIFY COLUMN …`.
    pub fn alter_sql(&self) -> String {
        match &self.options.rename {
            Some(new_name) => format!(
                "CHANGE COLUMN {} {} {}",
                MySql.quote_identifier(&self.name),
                MySql.quote_identifier(new_name),
                self.definition()
            ),
            None => format!("MODIFY COLUMN {}", self.create_sql()),
        }
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP COLUMN {}", MySql.quote_identifier(&self.name))
    }

    fn is_autoincrement(&self) -> bool {
        self.column_type.eq_ignore_ascii_case(AUTOINCREMENT)
    }

    fn definition(&self) -> String {
        let options = &self.options;
        let autoincrement = self.is_autoincrement();

        let mut sql = if autoincrement {
            "INTEGER".to_string()
        } else {
            self.column_type.to_uppercase()
        };

        if let Some(limit) = &options.limit {
            sql.push_str(&format!("({limit})"));
        } else if !options.values.is_empty() {
            let values: Vec<String> = options
                .values
                .iter()
                .map(|v| quote_mysql_string(v))
                .collect();
            sql.push_str(&format!("({})", values.join(", ")));
        }

        if options.unsigned {
            sql.push_str(" UNSIGNED");
        }

        // MySQL makes AUTO_INCREMENT columns NOT NULL anyway; say so explicitly.
        if !options.nullable || autoincrement {
            sql.push_str(" NOT NULL");
        }

        if autoincrement {
            sql.push_str(" AUTO_INCREMENT");
        }

        if let Some(default) = &options.default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default.to_sql());
        }

        if options.first {
            sql.push_str(" FIRST");
        } else if let Some(after) = &options.after {
            sql.push_str(&format!(" AFTER {}", MySql.quote_identifier(after)));
        }

        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_autoincrement() {
        let column = Column::new("id", "autoincrement", ColumnOptions::new().unsigned());
        assert_eq!(
            column.create_sql(),
            "`id` INTEGER UNSIGNED NOT NULL AUTO_INCREMENT"
        );
    }

    #[test]
    fn test_unsigned() {
        let column = Column::new("userId", "integer", ColumnOptions::new().unsigned());
        assert_eq!(column.create_sql(), "`userId` INTEGER UNSIGNED");
    }

    #[test]
    fn test_limit() {
        let column = Column::new("username", "varchar", ColumnOptions::new().limit(30).not_null());
        assert_eq!(column.create_sql(), "`username` VARCHAR(30) NOT NULL");
    }

    #[test]
    fn test_decimal_limit() {
        let column = Column::new("price", "decimal", ColumnOptions::new().limit("10,2"));
        assert_eq!(column.create_sql(), "`price` DECIMAL(10,2)");
    }

    #[test]
    fn test_enum_values_are_quoted() {
        let column = Column::new(
            "usertype",
            "enum",
            ColumnOptions::new().values(["standard", "admin", "quote'string"]),
        );
        assert_eq!(
            column.create_sql(),
            "`usertype` ENUM('standard', 'admin', 'quote\\'string')"
        );
    }

    #[test]
    fn test_limit_wins_over_values() {
        let column = Column::new(
            "code",
            "char",
            ColumnOptions::new().limit(2).values(["a", "b"]),
        );
        assert_eq!(column.create_sql(), "`code` CHAR(2)");
    }

    #[test]
    fn test_string_default_is_escaped() {
        let column = Column::new("t", "varchar", ColumnOptions::new().limit(30).default("O'Brien"));
        assert_eq!(column.create_sql(), "`t` VARCHAR(30) DEFAULT 'O\\'Brien'");
    }

    #[test]
    fn test_falsy_integer_default() {
        let column = Column::new(
            "admin",
            "tinyint",
            ColumnOptions::new().not_null().unsigned().default(0),
        );
        assert_eq!(
            column.create_sql(),
            "`admin` TINYINT UNSIGNED NOT NULL DEFAULT 0"
        );
    }

    #[test]
    fn test_falsy_string_default() {
        let column = Column::new(
            "usergroup",
            "varchar",
            ColumnOptions::new().not_null().limit(30).default(""),
        );
        assert_eq!(column.create_sql(), "`usergroup` VARCHAR(30) NOT NULL DEFAULT ''");
    }

    #[test]
    fn test_expression_default() {
        let column = Column::new(
            "createdAt",
            "timestamp",
            ColumnOptions::new()
                .not_null()
                .default(DefaultValue::expression("CURRENT_TIMESTAMP")),
        );
        assert_eq!(
            column.create_sql(),
            "`createdAt` TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP"
        );
    }

    #[test]
    fn test_first_and_after() {
        let first = Column::new("notes", "text", ColumnOptions::new().first());
        assert_eq!(first.create_sql(), "`notes` TEXT FIRST");

        let after = Column::new("notes", "text", ColumnOptions::new().after("usertype"));
        assert_eq!(after.create_sql(), "`notes` TEXT AFTER `usertype`");

        let both = Column::new("notes", "text", ColumnOptions::new().after("usertype").first());
        assert_eq!(both.create_sql(), "`notes` TEXT FIRST");
    }

    #[test]
    fn test_alter() {
        let column = Column::new("notes", "varchar", ColumnOptions::new().limit(30));
        assert_eq!(column.alter_sql(), "MODIFY COLUMN `notes` VARCHAR(30)");
    }

    #[test]
    fn test_alter_rename() {
        let column = Column::new(
            "notes",
            "varchar",
            ColumnOptions::new().limit(30).rename("shortnotes"),
        );
        assert_eq!(
            column.alter_sql(),
            "CHANGE COLUMN `notes` `shortnotes` VARCHAR(30)"
        );
    }

    #[test]
    fn test_add_and_drop() {
        let column = Column::new("age", "integer", ColumnOptions::new().unsigned());
        assert_eq!(column.add_sql(), "ADD COLUMN `age` INTEGER UNSIGNED");

        let column = Column::new("notes", "", ColumnOptions::new());
        assert_eq!(column.drop_sql(), "DROP COLUMN `notes`");
    }

    #[test]
    fn test_default_representable() {
        assert!(DefaultValue::from(1.5).is_representable());
        assert!(DefaultValue::from("NaN").is_representable());
        assert!(!DefaultValue::from(f64::NAN).is_representable());
        assert!(!DefaultValue::from(f64::NEG_INFINITY).is_representable());
    }
}
