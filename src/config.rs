//! Ladder configuration.
//!
//! Settings come from `config/ladder.toml` (optional) and `LADDER__*`
//! environment variables:
//!
//! ```toml
//! root_path = "/srv/app"
//!
//! [[migrations]]
//! namespace = "app"
//! path = "migrations"
//! ```

use crate::migration::MigrationError;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file location, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/ladder.toml";

/// One migrations directory
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NamespaceConfig {
    pub namespace: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct LadderConfig {
    /// Directories, in registration order
    #[serde(default)]
    pub migrations: Vec<NamespaceConfig>,
    /// Base for relative migration paths; defaults to the working directory
    #[serde(default)]
    pub root_path: Option<PathBuf>,
}

fn environment() -> Environment {
    Environment::with_prefix("LADDER").separator("__")
}

impl LadderConfig {
    /// Load from `config/ladder.toml`, falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load from `path` (optional) plus environment variables.
    ///
    /// An unreadable or malformed file is logged and skipped; environment
    /// variables are still applied.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(environment());

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                if path.exists() {
                    log::warn!(
                        "Failed to load config file {}, falling back to env: {}",
                        path.display(),
                        err
                    );
                }
                Config::builder()
                    .add_source(environment())
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                        ))
                    })?
            }
        };

        settings.try_deserialize::<LadderConfig>().map_err(|e| {
            ConfigError::Message(format!("Ladder configuration is invalid: {e}"))
        })
    }

    /// Base directory for relative paths
    #[must_use]
    pub fn root(&self) -> PathBuf {
        match &self.root_path {
            Some(root) => root.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Pick the namespace a new migration file goes into
    ///
    /// With one configured namespace `namespace` may be omitted; with several
    /// it must name one of them.
    ///
    /// # Errors
    ///
    /// Returns `MigrationError::Config` if no namespace matches.
    pub fn resolve_namespace(
        &self,
        namespace: Option<&str>,
    ) -> Result<&NamespaceConfig, MigrationError> {
        match (namespace, self.migrations.as_slice()) {
            (_, []) => Err(MigrationError::Config(
                "No migration namespaces configured".to_string(),
            )),
            (None, [only]) => Ok(only),
            (None, all) => Err(MigrationError::Config(format!(
                "Several namespaces are configured, choose one of: {}",
                all.iter()
                    .map(|ns| ns.namespace.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
            (Some(name), all) => all
                .iter()
                .find(|ns| ns.namespace == name)
                .ok_or_else(|| MigrationError::Config(format!("Unknown namespace '{name}'"))),
        }
    }

    /// Directory for `namespace`, resolved against [`root`](Self::root)
    ///
    /// # Errors
    ///
    /// See [`resolve_namespace`](Self::resolve_namespace).
    pub fn namespace_path(&self, namespace: Option<&str>) -> Result<PathBuf, MigrationError> {
        let ns = self.resolve_namespace(namespace)?;
        Ok(if ns.path.is_absolute() {
            ns.path.clone()
        } else {
            self.root().join(&ns.path)
        })
    }
}
