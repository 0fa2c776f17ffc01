//! Table indexes

use crate::dialect::{Dialect, MySql};

/// Reserved index name for the primary key
pub const PRIMARY: &str = "PRIMARY";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexOptions {
    pub unique: bool,
}

impl IndexOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// A primary key, unique key or plain key over one or more columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    name: String,
    columns: Vec<String>,
    options: IndexOptions,
}

impl Index {
    pub fn new<I, S>(name: impl Into<String>, columns: I, options: IndexOptions) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_primary(&self) -> bool {
        self.name == PRIMARY
    }

    pub fn create_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|c| MySql.quote_identifier(c))
            .collect();
        let columns = columns.join(", ");

        if self.is_primary() {
            format!("PRIMARY KEY ({columns})")
        } else if self.options.unique {
            format!("UNIQUE KEY {} ({columns})", MySql.quote_identifier(&self.name))
        } else {
            format!("KEY {} ({columns})", MySql.quote_identifier(&self.name))
        }
    }

    pub fn add_sql(&self) -> String {
        format!("ADD {}", self.create_sql())
    }

    pub fn drop_sql(&self) -> String {
        if self.is_primary() {
            "DROP PRIMARY KEY".to_string()
        } else {
            format!("DROP KEY {}", MySql.quote_identifier(&self.name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary() {
        let index = Index::new(PRIMARY, ["id"], IndexOptions::new());
        assert_eq!(index.create_sql(), "PRIMARY KEY (`id`)");
    }

    #[test]
    fn test_primary_ignores_unique() {
        let index = Index::new(PRIMARY, ["a", "b"], IndexOptions::new().unique());
        assert_eq!(index.create_sql(), "PRIMARY KEY (`a`, `b`)");
    }

    #[test]
    fn test_unique() {
        let index = Index::new("id", ["id"], IndexOptions::new().unique());
        assert_eq!(index.create_sql(), "UNIQUE KEY `id` (`id`)");
    }

    #[test]
    fn test_index() {
        let index = Index::new("id", ["id"], IndexOptions::new());
        assert_eq!(index.create_sql(), "KEY `id` (`id`)");
        assert_eq!(index.add_sql(), "ADD KEY `id` (`id`)");
    }

    #[test]
    fn test_drop() {
        let primary = Index::new(PRIMARY, Vec::<String>::new(), IndexOptions::new());
        assert_eq!(primary.drop_sql(), "DROP PRIMARY KEY");

        let index = Index::new("id", Vec::<String>::new(), IndexOptions::new());
        assert_eq!(index.drop_sql(), "DROP KEY `id`");
    }
}
