use ladder::schema::{ColumnOptions, Table};
use ladder::{BoxError, Migration, SharedConnection};
use serde_json::Value;

pub struct Migration000020 {
    db: SharedConnection,
}

impl Migration000020 {
    pub fn new(db: SharedConnection) -> Self {
        Self { db }
    }
}

impl Migration for Migration000020 {
    fn name(&self) -> &str {
        "Add email to users"
    }

    fn apply(&mut self) -> Result<Option<Value>, BoxError> {
        Table::new(self.db.clone(), "users")
            .add_column(
                "email",
                "varchar",
                ColumnOptions::new().limit(255).nullable(true).after("name"),
            )
            .alter()?;
        Ok(None)
    }

    fn rollback(&mut self, _data: Option<Value>) -> Result<(), BoxError> {
        Table::new(self.db.clone(), "users").drop_column("email").alter()?;
        Ok(())
    }
}
