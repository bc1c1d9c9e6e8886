use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{OrmError, Result};

const DEFAULT_PRIMARY_KEY: &str = "id";

/// ORM configuration parsed from a TOML file.
///
/// The schema assumption is a single-column primary key per table, named
/// conventionally. The conventional name defaults to `id`; this
/// configuration makes it explicit and overridable per table.
#[derive(Debug, Clone, Deserialize)]
pub struct OrmConfig {
    /// Primary-key column name used for tables without an explicit entry.
    #[serde(default = "default_primary_key")]
    pub primary_key: String,
    /// Per-table overrides, keyed by table name.
    #[serde(default)]
    pub tables: HashMap<String, TableConfig>,
}

/// Per-table configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TableConfig {
    pub primary_key: Option<String>,
}

fn default_primary_key() -> String {
    DEFAULT_PRIMARY_KEY.to_string()
}

impl Default for OrmConfig {
    fn default() -> Self {
        OrmConfig {
            primary_key: default_primary_key(),
            tables: HashMap::new(),
        }
    }
}

impl OrmConfig {
    /// Loads configuration from a TOML file at the given path.
    ///
    /// # Arguments
    ///
    /// * `path` - The file path to the TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns `OrmError::Io` if the file cannot be read and
    /// `OrmError::Config` if its contents do not parse.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<OrmConfig> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| OrmError::Config(e.to_string()))
    }

    /// The conventional location of the configuration file, under the
    /// platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("litorm").join("litorm.toml"))
    }

    /// The primary-key column name for the given table.
    pub fn primary_key_for(&self, table: &str) -> &str {
        self.tables
            .get(table)
            .and_then(|t| t.primary_key.as_deref())
            .unwrap_or(&self.primary_key)
    }
}
