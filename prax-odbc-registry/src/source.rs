//! Where the driver inventory text comes from.
//!
//! The system inventory path is read from `ODBCSYSINSTINI` and falls back to
//! `/etc/odbcinst.ini`. The path is resolved every time the inventory is loaded, so a
//! registry reset picks up environment changes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{RegistryError, RegistryResult};

/// Environment variable naming the driver inventory file.
pub const INVENTORY_ENV_VAR: &str = "ODBCSYSINSTINI";

/// Inventory path used when the environment variable is not set.
pub const DEFAULT_INVENTORY_PATH: &str = "/etc/odbcinst.ini";

/// Source for environment variables.
pub trait EnvSource: Send + Sync {
    /// Get an environment variable value.
    fn get(&self, name: &str) -> Option<String>;
}

/// Default environment source using std::env.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Environment source backed by a HashMap.
#[derive(Debug, Clone, Default)]
pub struct MapEnvSource {
    vars: HashMap<String, String>,
}

impl MapEnvSource {
    /// Create a new map-based environment source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a variable.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSource for MapEnvSource {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Something that can produce the text of a driver inventory.
pub trait InventorySource: Send + Sync {
    /// Load the full inventory contents.
    fn load(&self) -> RegistryResult<String>;
}

/// Inventory at a fixed path.
#[derive(Debug, Clone)]
pub struct FileInventory {
    path: PathBuf,
}

impl FileInventory {
    /// Create a source reading the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the inventory path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InventorySource for FileInventory {
    fn load(&self) -> RegistryResult<String> {
        read_inventory(&self.path)
    }
}

/// Inventory whose path is resolved from the environment on every load.
#[derive(Debug, Clone, Default)]
pub struct EnvInventory<S: EnvSource = StdEnvSource> {
    env: S,
}

impl EnvInventory<StdEnvSource> {
    /// Create a source using the process environment.
    pub fn new() -> Self {
        Self { env: StdEnvSource }
    }
}

impl<S: EnvSource> EnvInventory<S> {
    /// Create a source with a custom environment.
    pub fn with_env(env: S) -> Self {
        Self { env }
    }

    /// Resolve the inventory path.
    ///
    /// An unset variable falls back to the default path; a variable set to an empty
    /// string is a configuration error.
    pub fn resolve_path(&self) -> RegistryResult<PathBuf> {
        let path = self
            .env
            .get(INVENTORY_ENV_VAR)
            .unwrap_or_else(|| DEFAULT_INVENTORY_PATH.to_string());

        if path.trim().is_empty() {
            return Err(RegistryError::config("No ODBCINST file defined."));
        }

        Ok(PathBuf::from(path))
    }
}

impl<S: EnvSource> InventorySource for EnvInventory<S> {
    fn load(&self) -> RegistryResult<String> {
        let path = self.resolve_path()?;
        read_inventory(&path)
    }
}

/// Inventory held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    contents: String,
}

impl StaticInventory {
    /// Create a source returning the given text.
    pub fn new(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
        }
    }
}

impl InventorySource for StaticInventory {
    fn load(&self) -> RegistryResult<String> {
        Ok(self.contents.clone())
    }
}

fn read_inventory(path: &Path) -> RegistryResult<String> {
    let location = path.display().to_string();

    let is_file = std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false);
    if !is_file {
        return Err(RegistryError::config(format!(
            "ODBCINST file [{}] does not exist or is not readable.",
            location
        )));
    }

    debug!(path = %location, "Loading ODBC driver inventory");

    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => RegistryError::config(format!(
            "ODBCINST file [{}] does not exist or is not readable.",
            location
        )),
        _ => RegistryError::Io {
            path: location.clone(),
            source: e,
        },
    })
}
