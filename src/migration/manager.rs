//! `MigrationManager`: discovery, ordering and apply/rollback bookkeeping

use crate::config::LadderConfig;
use crate::connection::SharedConnection;
use crate::migration::file::discover_migration_files;
use crate::migration::record;
use crate::migration::state_table::{
    SystemMigration1, VersionTable, SYSTEM_MIGRATION_IDS, SYSTEM_NAMESPACE,
};
use crate::migration::{MigrationError, MigrationId, MigrationRegistry, MigrationUnit};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

#[cfg(feature = "tracing")]
use crate::tracing_helpers;

/// Where a namespace's migrations come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationSource {
    /// A directory of `Migration<digits>.rs` files
    Directory(PathBuf),
    /// Ids compiled into the crate, e.g. Ladder's own system migrations
    Embedded(Vec<u64>),
}

/// Tracks and applies migrations across registered namespaces
///
/// Every query re-reads the sources and the version table; the manager keeps
/// no applied-state of its own.
///
/// # Example
///
/// ```rust,no_run
/// use ladder::{MigrationManager, MigrationRegistry, SharedConnection};
///
/// # fn example(db: SharedConnection, registry: MigrationRegistry) -> Result<(), ladder::MigrationError> {
/// let mut manager = MigrationManager::new(db, registry);
/// manager.add_system_namespace()?.add_namespace("app", "migrations")?;
///
/// for mut migration in manager.get_available_migrations()? {
///     manager.apply_migration(&mut migration)?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct MigrationManager {
    db: SharedConnection,
    registry: MigrationRegistry,
    paths: Vec<(String, MigrationSource)>,
    root_path: PathBuf,
}

impl MigrationManager {
    /// Create a manager with no namespaces
    ///
    /// Relative paths resolve against the working directory until
    /// [`set_root_path`](Self::set_root_path) says otherwise.
    pub fn new(db: SharedConnection, registry: MigrationRegistry) -> Self {
        Self {
            db,
            registry,
            paths: Vec::new(),
            root_path: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Create a manager from configuration
    ///
    /// The system namespace is registered first, then every configured
    /// namespace in order.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::DuplicateNamespace` if the configuration lists
    /// a namespace twice or reuses the system namespace.
    pub fn bootstrap(
        db: SharedConnection,
        registry: MigrationRegistry,
        config: &LadderConfig,
    ) -> Result<Self, MigrationError> {
        let mut manager = Self::new(db, registry);
        manager.set_root_path(config.root());
        manager.add_system_namespace()?;
        for ns in &config.migrations {
            manager.add_namespace(&ns.namespace, ns.path.clone())?;
        }

        log::info!(
            "Migration manager ready with {} namespaces (root {}, dialect {})",
            manager.paths.len(),
            manager.root_path.display(),
            manager.db.dialect().name()
        );
        Ok(manager)
    }

    pub fn set_root_path(&mut self, root_path: impl Into<PathBuf>) -> &mut Self {
        self.root_path = root_path.into();
        self
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn connection(&self) -> &SharedConnection {
        &self.db
    }

    pub fn registry(&self) -> &MigrationRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut MigrationRegistry {
        &mut self.registry
    }

    /// Registered namespaces, in registration order
    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &MigrationSource)> {
        self.paths.iter().map(|(ns, source)| (ns.as_str(), source))
    }

    /// Register a directory of migrations
    ///
    /// The path is checked at discovery time, not here.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::DuplicateNamespace` if `namespace` is already
    /// registered; the first registration is kept.
    pub fn add_namespace(
        &mut self,
        namespace: &str,
        path: impl Into<PathBuf>,
    ) -> Result<&mut Self, MigrationError> {
        self.add_source(namespace, MigrationSource::Directory(path.into()))
    }

    /// Register Ladder's own migrations, which create the version table
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::DuplicateNamespace` if called twice.
    pub fn add_system_namespace(&mut self) -> Result<&mut Self, MigrationError> {
        self.add_source(
            SYSTEM_NAMESPACE,
            MigrationSource::Embedded(SYSTEM_MIGRATION_IDS.to_vec()),
        )?;
        if !self.registry.is_registered(SYSTEM_NAMESPACE, 1) {
            self.registry
                .register_system(SYSTEM_NAMESPACE, 1, SystemMigration1::new)?;
        }
        Ok(self)
    }

    fn add_source(
        &mut self,
        namespace: &str,
        source: MigrationSource,
    ) -> Result<&mut Self, MigrationError> {
        if self.paths.iter().any(|(ns, _)| ns == namespace) {
            return Err(MigrationError::DuplicateNamespace(namespace.to_string()));
        }
        log::debug!("Registered namespace '{namespace}': {source:?}");
        self.paths.push((namespace.to_string(), source));
        Ok(self)
    }

    fn version_table(&self) -> VersionTable {
        VersionTable::new(self.db.clone())
    }

    /// Whether the version table exists
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Database` if the probe fails.
    pub fn has_migrations_table(&self) -> Result<bool, MigrationError> {
        self.version_table().exists()
    }

    /// Highest applied id; 0 when nothing is applied or the table is missing
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Database` if a query fails.
    pub fn get_current_migration_id(&self) -> Result<u64, MigrationError> {
        self.version_table().current_id()
    }

    /// Every discovered migration, ascending by id, with applied state attached
    ///
    /// # Errors
    ///
    /// Returns discovery errors (`MissingPath`, `InvalidPath`, `NotRegistered`,
    /// `DuplicateId`) and version-table query errors.
    pub fn get_all_migrations(&self) -> Result<BTreeMap<MigrationId, MigrationUnit>, MigrationError> {
        self.discover()
    }

    /// Migration with the highest id
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::NoMigrations` if nothing was discovered.
    pub fn get_latest_migration(&self) -> Result<MigrationUnit, MigrationError> {
        self.discover()?
            .pop_last()
            .map(|(_, unit)| unit)
            .ok_or(MigrationError::NoMigrations)
    }

    /// # Errors
    ///
    /// Returns `MigrationError::NoSuchMigration` for an unknown id.
    pub fn get_migration_by_id(&self, id: u64) -> Result<MigrationUnit, MigrationError> {
        self.discover()?
            .remove(&id)
            .ok_or(MigrationError::NoSuchMigration(id))
    }

    /// Migrations not yet applied, ascending
    ///
    /// # Errors
    ///
    /// See [`get_all_migrations`](Self::get_all_migrations).
    pub fn get_available_migrations(&self) -> Result<Vec<MigrationUnit>, MigrationError> {
        Ok(self
            .discover()?
            .into_values()
            .filter(|unit| !unit.is_applied())
            .collect())
    }

    /// Whether any migration is not yet applied
    ///
    /// Compares discovered ids with the version table without constructing or
    /// ordering the migrations.
    ///
    /// # Errors
    ///
    /// See [`get_all_migrations`](Self::get_all_migrations).
    pub fn has_available_migrations(&self) -> Result<bool, MigrationError> {
        let ids = self.discover_ids()?;
        let applied = self.version_table().applied()?;
        Ok(ids.iter().any(|(_, id)| !applied.contains_key(&id.value())))
    }

    /// Applied migrations, newest first
    ///
    /// # Errors
    ///
    /// See [`get_all_migrations`](Self::get_all_migrations).
    pub fn get_applied_migrations(&self) -> Result<Vec<MigrationUnit>, MigrationError> {
        Ok(self
            .discover()?
            .into_values()
            .rev()
            .filter(MigrationUnit::is_applied)
            .collect())
    }

    /// Whether any migration is applied
    ///
    /// Compares discovered ids with the version table without constructing or
    /// ordering the migrations.
    ///
    /// # Errors
    ///
    /// See [`get_all_migrations`](Self::get_all_migrations).
    pub fn has_applied_migrations(&self) -> Result<bool, MigrationError> {
        let ids = self.discover_ids()?;
        let applied = self.version_table().applied()?;
        Ok(ids.iter().any(|(_, id)| applied.contains_key(&id.value())))
    }

    /// Apply one migration and record it
    ///
    /// Runs `apply()`, then inserts the version row with the current time and
    /// the returned rollback data, then marks the unit applied. The two steps
    /// are not wrapped in a transaction.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::ApplyFailed` if the migration fails; no row is
    /// written and the unit is untouched. Returns `MigrationError::Schema` if
    /// the version row cannot be written.
    pub fn apply_migration(&self, unit: &mut MigrationUnit) -> Result<(), MigrationError> {
        #[cfg(feature = "tracing")]
        let _span =
            tracing_helpers::apply_migration_span(unit.id(), unit.name(), unit.namespace())
                .entered();

        log::info!("Applying migration {} ({})", unit.id(), unit.name());

        let data = unit.apply().map_err(|source| MigrationError::ApplyFailed {
            id: unit.id().clone(),
            name: unit.name().to_string(),
            source,
        })?;

        let applied_at = record::now();
        self.version_table()
            .record(unit.id().value(), &applied_at, data.as_ref())?;
        unit.set_applied_at(Some(applied_at));

        log::debug!("Migration {} applied at {}", unit.id(), applied_at);
        Ok(())
    }

    /// Roll back one migration and forget it
    ///
    /// Reads the stored rollback data (none if the version table is missing),
    /// runs `rollback(data)`, deletes the row if the version table still
    /// exists, then clears the unit's applied state.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::RollbackFailed` if the migration fails; the row
    /// and the unit are untouched. Returns `MigrationError::Schema` if the row
    /// cannot be deleted; the unit still reports itself applied.
    pub fn rollback_migration(&self, unit: &mut MigrationUnit) -> Result<(), MigrationError> {
        #[cfg(feature = "tracing")]
        let _span =
            tracing_helpers::rollback_migration_span(unit.id(), unit.name(), unit.namespace())
                .entered();

        log::info!("Rolling back migration {} ({})", unit.id(), unit.name());

        let versions = self.version_table();
        let id = unit.id().value();
        let data = if versions.exists()? {
            versions.payload(id)?
        } else {
            None
        };

        unit.rollback(data)
            .map_err(|source| MigrationError::RollbackFailed {
                id: unit.id().clone(),
                name: unit.name().to_string(),
                source,
            })?;

        // Rolling back the system migration drops the table itself
        if versions.exists()? {
            versions.forget(id)?;
        }

        unit.set_applied_at(None);
        Ok(())
    }

    fn resolve(&self, namespace: &str, path: &Path) -> Result<PathBuf, MigrationError> {
        if path.as_os_str().is_empty() {
            return Err(MigrationError::MissingPath {
                namespace: namespace.to_string(),
            });
        }

        let dir = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_path.join(path)
        };

        if !dir.is_dir() {
            return Err(MigrationError::InvalidPath {
                namespace: namespace.to_string(),
                path: dir,
            });
        }
        Ok(dir)
    }

    /// Every discovered `(namespace, id)`, in source order
    ///
    /// Checks paths, duplicate ids and registrations without constructing
    /// any migration.
    fn discover_ids(&self) -> Result<Vec<(&str, MigrationId)>, MigrationError> {
        let mut seen: HashMap<u64, &str> = HashMap::new();
        let mut found = Vec::new();

        for (namespace, source) in &self.paths {
            let ids: Vec<MigrationId> = match source {
                MigrationSource::Directory(path) => {
                    let dir = self.resolve(namespace, path)?;
                    discover_migration_files(&dir)?
                        .into_iter()
                        .map(|file| file.id)
                        .collect()
                }
                MigrationSource::Embedded(ids) => {
                    ids.iter().copied().map(MigrationId::new).collect()
                }
            };

            for id in ids {
                if let Some(first) = seen.insert(id.value(), namespace) {
                    return Err(MigrationError::DuplicateId {
                        id,
                        first: first.to_string(),
                        second: namespace.clone(),
                    });
                }
                if !self.registry.is_registered(namespace, id.value()) {
                    return Err(MigrationError::NotRegistered {
                        namespace: namespace.clone(),
                        id,
                    });
                }
                found.push((namespace.as_str(), id));
            }
        }

        Ok(found)
    }

    fn discover(&self) -> Result<BTreeMap<MigrationId, MigrationUnit>, MigrationError> {
        let mut units: BTreeMap<MigrationId, MigrationUnit> = BTreeMap::new();

        for (namespace, id) in self.discover_ids()? {
            let (migration, system) = self
                .registry
                .construct(namespace, id.value(), self.db.clone())
                .ok_or_else(|| MigrationError::NotRegistered {
                    namespace: namespace.to_string(),
                    id: id.clone(),
                })?;

            units.insert(id.clone(), MigrationUnit::new(id, namespace, system, migration));
        }

        let applied = self.version_table().applied()?;
        for unit in units.values_mut() {
            if let Some(applied_at) = applied.get(&unit.id().value()) {
                unit.set_applied_at(Some(*applied_at));
            }
        }

        log::debug!(
            "Discovered {} migrations across {} namespaces, {} applied",
            units.len(),
            self.paths.len(),
            applied.len()
        );
        Ok(units)
    }
}
