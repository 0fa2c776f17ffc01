//! Migration constructors keyed by namespace and id
//!
//! Discovery finds `Migration<digits>.rs` files on disk; the registry supplies
//! the code for each one. Fill it by hand with [`MigrationRegistry::register`]
//! or from a module generated at build time by
//! [`build_script::generate_manifest`](crate::migration::build_script::generate_manifest).

use crate::connection::SharedConnection;
use crate::migration::{Migration, MigrationError};
use std::collections::BTreeMap;

type Constructor = Box<dyn Fn(SharedConnection) -> Box<dyn Migration>>;

struct Entry {
    constructor: Constructor,
    system: bool,
}

/// Registry of migration constructors
#[derive(Default)]
pub struct MigrationRegistry {
    entries: BTreeMap<(String, u64), Entry>,
}

impl MigrationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the constructor for `Migration<id>` in `namespace`
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::AlreadyRegistered` if the pair is already taken.
    pub fn register<M, F>(
        &mut self,
        namespace: &str,
        id: u64,
        constructor: F,
    ) -> Result<&mut Self, MigrationError>
    where
        M: Migration + 'static,
        F: Fn(SharedConnection) -> M + 'static,
    {
        self.insert(namespace, id, constructor, false)
    }

    pub(crate) fn register_system<M, F>(
        &mut self,
        namespace: &str,
        id: u64,
        constructor: F,
    ) -> Result<&mut Self, MigrationError>
    where
        M: Migration + 'static,
        F: Fn(SharedConnection) -> M + 'static,
    {
        self.insert(namespace, id, constructor, true)
    }

    fn insert<M, F>(
        &mut self,
        namespace: &str,
        id: u64,
        constructor: F,
        system: bool,
    ) -> Result<&mut Self, MigrationError>
    where
        M: Migration + 'static,
        F: Fn(SharedConnection) -> M + 'static,
    {
        let key = (namespace.to_string(), id);
        if self.entries.contains_key(&key) {
            return Err(MigrationError::AlreadyRegistered {
                namespace: namespace.to_string(),
                id,
            });
        }

        self.entries.insert(
            key,
            Entry {
                constructor: Box::new(move |db| Box::new(constructor(db)) as Box<dyn Migration>),
                system,
            },
        );
        Ok(self)
    }

    #[must_use]
    pub fn is_registered(&self, namespace: &str, id: u64) -> bool {
        self.entries.contains_key(&(namespace.to_string(), id))
    }

    /// Registered ids for `namespace`, ascending
    #[must_use]
    pub fn ids(&self, namespace: &str) -> Vec<u64> {
        self.entries
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, id)| *id)
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build the migration and report whether it is system-managed
    pub(crate) fn construct(
        &self,
        namespace: &str,
        id: u64,
        db: SharedConnection,
    ) -> Option<(Box<dyn Migration>, bool)> {
        self.entries
            .get(&(namespace.to_string(), id))
            .map(|entry| ((entry.constructor)(db), entry.system))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::BoxError;
    use crate::mock::MockConnection;
    use serde_json::Value;
    use std::rc::Rc;

    struct Noop;

    impl Migration for Noop {
        fn name(&self) -> &str {
            "noop"
        }

        fn apply(&mut self) -> Result<Option<Value>, BoxError> {
            Ok(None)
        }

        fn rollback(&mut self, _data: Option<Value>) -> Result<(), BoxError> {
            Ok(())
        }
    }

    #[test]
    fn test_register_and_construct() {
        let mut registry = MigrationRegistry::new();
        registry
            .register("app", 2, |_| Noop)
            .expect("first registration")
            .register("app", 1, |_| Noop)
            .expect("second registration");

        assert_eq!(registry.ids("app"), vec![1, 2]);
        assert!(registry.ids("other").is_empty());

        let db: SharedConnection = Rc::new(MockConnection::new());
        let (migration, system) = registry.construct("app", 1, db).expect("registered");
        assert_eq!(migration.name(), "noop");
        assert!(!system);
    }

    #[test]
    fn test_register_duplicate() {
        let mut registry = MigrationRegistry::new();
        registry.register("app", 1, |_| Noop).expect("first registration");

        match registry.register("app", 1, |_| Noop) {
            Err(MigrationError::AlreadyRegistered { namespace, id }) => {
                assert_eq!(namespace, "app");
                assert_eq!(id, 1);
            }
            Err(other) => panic!("Expected AlreadyRegistered, got {other:?}"),
            Ok(_) => panic!("Expected AlreadyRegistered, got Ok"),
        }

        // Same id in another namespace is fine
        registry.register("other", 1, |_| Noop).expect("other namespace");
        assert_eq!(registry.len(), 2);
    }
}
