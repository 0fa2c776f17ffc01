//! SQL dialect seam.
//!
//! The schema builder renders MySQL DDL (the reference dialect). Everything the
//! manager and the row helpers need beyond that, namely identifier and string
//! quoting, placeholder syntax and the table-existence probe, goes through
//! [`Dialect`] so a connection for another engine can supply its own.

use serde_json::Value;

/// Dialect-specific SQL pieces
pub trait Dialect {
    /// Human-readable name, used in log output
    fn name(&self) -> &'static str;

    /// Quote an identifier (table or column name)
    fn quote_identifier(&self, identifier: &str) -> String;

    /// Quote a string literal
    fn quote_string(&self, value: &str) -> String;

    /// Placeholder for a named parameter
    fn placeholder(&self, name: &str) -> String {
        format!(":{name}")
    }

    /// Statement and parameters that return at least one row iff `table` exists
    fn table_exists_query(&self, table: &str) -> (String, Vec<(String, Value)>);
}

/// MySQL / MariaDB
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        format!("`{}`", identifier.replace('`', "``"))
    }

    fn quote_string(&self, value: &str) -> String {
        quote_mysql_string(value)
    }

    fn table_exists_query(&self, table: &str) -> (String, Vec<(String, Value)>) {
        // SHOW TABLES does not accept bound parameters.
        (format!("SHOW TABLES LIKE {}", self.quote_string(table)), Vec::new())
    }
}

/// Single-quote a string using MySQL backslash escaping.
pub(crate) fn quote_mysql_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '\'' => quoted.push_str("\\'"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mysql_quoting() {
        let d = MySql;
        assert_eq!(d.quote_identifier("users"), "`users`");
        assert_eq!(d.quote_identifier("odd`name"), "`odd``name`");
        assert_eq!(d.quote_string("O'Brien"), "'O\\'Brien'");
        assert_eq!(d.quote_string("back\\slash"), "'back\\\\slash'");
        assert_eq!(d.placeholder("data_id"), ":data_id");
        assert_eq!(d.name(), "mysql");
    }

    #[test]
    fn test_mysql_table_exists_query() {
        let (sql, params) = MySql.table_exists_query("ladder:migrations");
        assert_eq!(sql, "SHOW TABLES LIKE 'ladder:migrations'");
        assert!(params.is_empty());
    }
}
