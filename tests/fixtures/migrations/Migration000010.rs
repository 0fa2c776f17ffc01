use ladder::schema::{ColumnOptions, IndexOptions, Table};
use ladder::{BoxError, Migration, SharedConnection};
use serde_json::{json, Value};

pub struct Migration000010 {
    db: SharedConnection,
}

impl Migration000010 {
    pub fn new(db: SharedConnection) -> Self {
        Self { db }
    }
}

impl Migration for Migration000010 {
    fn name(&self) -> &str {
        "Create users with a first user"
    }

    fn apply(&mut self) -> Result<Option<Value>, BoxError> {
        let mut users = Table::new(self.db.clone(), "users");
        users
            .add_column("id", "autoincrement", ColumnOptions::new().unsigned())
            .add_column("name", "varchar", ColumnOptions::new().limit(64).not_null())
            .add_index("PRIMARY", &["id"], IndexOptions::new())
            .create()?;

        let id = users
            .insert([("name", "Alice")])?
            .last_insert_id()
            .ok_or("no insert id reported")?;

        Ok(Some(json!({ "userId": id })))
    }

    fn rollback(&mut self, data: Option<Value>) -> Result<(), BoxError> {
        let id = data
            .as_ref()
            .and_then(|d| d.get("userId"))
            .and_then(Value::as_u64)
            .ok_or("missing userId in migration data")?;

        let mut users = Table::new(self.db.clone(), "users");
        users.delete([("id", id)])?;
        users.drop()?;
        Ok(())
    }
}
