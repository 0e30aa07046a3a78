//! Memoized views over the installed ODBC drivers.
//!
//! Every view is computed lazily and stored in the injected [`CacheStore`]. Passing
//! `reset = true` to an accessor deletes that view's entry before recomputing it, and
//! the reset is forwarded to the views it is derived from:
//!
//! ```text
//! names_for_protocol ──► driver_map ──► all_drivers ──► inventory source
//!       driver_names ─────────────────► all_drivers
//! ```
//!
//! Resetting `all_drivers` alone leaves derived views untouched; use
//! [`DriverRegistry::invalidate_all`] when every view must be rebuilt.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{CacheKey, CacheStore, CachedValue, MemoryStore};
use crate::driver::{DriverEntry, DriverMap, Protocol, group_by_protocol};
use crate::error::{RegistryError, RegistryResult};
use crate::parser::parse;
use crate::source::{EnvInventory, InventorySource};

/// Installed driver lookups backed by a cache store.
pub struct DriverRegistry {
    source: Box<dyn InventorySource>,
    store: Arc<dyn CacheStore>,
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverRegistry").finish_non_exhaustive()
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DriverRegistry {
    /// Registry reading the system inventory into the process-wide store.
    pub fn new() -> Self {
        Self::with_parts(EnvInventory::new(), MemoryStore::global())
    }

    /// Registry with a custom inventory source and cache store.
    pub fn with_parts<S>(source: S, store: Arc<dyn CacheStore>) -> Self
    where
        S: InventorySource + 'static,
    {
        Self {
            source: Box::new(source),
            store,
        }
    }

    /// Get the cache store.
    pub fn store(&self) -> &dyn CacheStore {
        &*self.store
    }

    /// Every classified driver, in inventory order.
    pub fn all_drivers(&self, reset: bool) -> RegistryResult<Arc<Vec<DriverEntry>>> {
        self.remember(
            CacheKey::all_drivers(),
            reset,
            CachedValue::Drivers,
            |value| match value {
                CachedValue::Drivers(drivers) => Some(drivers),
                _ => None,
            },
            || {
                let contents = self.source.load()?;
                Ok(Arc::new(parse(&contents)))
            },
        )
    }

    /// Names of every classified driver.
    pub fn driver_names(&self, reset: bool) -> RegistryResult<Arc<Vec<String>>> {
        self.remember(
            CacheKey::driver_names(),
            reset,
            CachedValue::Names,
            as_names,
            || {
                let drivers = self.all_drivers(reset)?;
                Ok(Arc::new(drivers.iter().map(|d| d.name.clone()).collect()))
            },
        )
    }

    /// Drivers grouped by protocol.
    pub fn driver_map(&self, reset: bool) -> RegistryResult<Arc<DriverMap>> {
        self.remember(
            CacheKey::driver_map(),
            reset,
            CachedValue::Map,
            |value| match value {
                CachedValue::Map(map) => Some(map),
                _ => None,
            },
            || {
                let drivers = self.all_drivers(reset)?;
                Ok(Arc::new(group_by_protocol(&drivers)))
            },
        )
    }

    /// Names of the drivers registered for one protocol.
    pub fn names_for_protocol(
        &self,
        protocol: Protocol,
        reset: bool,
    ) -> RegistryResult<Arc<Vec<String>>> {
        self.remember(
            CacheKey::protocol(protocol),
            reset,
            CachedValue::Names,
            as_names,
            || {
                let map = self.driver_map(reset)?;
                let names = map
                    .get(&protocol)
                    .map(|group| group.iter().map(|d| d.name.clone()).collect())
                    .unwrap_or_default();
                Ok(Arc::new(names))
            },
        )
    }

    /// The first driver registered for a protocol.
    pub fn default_for_protocol(&self, protocol: Protocol) -> RegistryResult<String> {
        self.names_for_protocol(protocol, false)?
            .first()
            .cloned()
            .ok_or_else(|| RegistryError::missing_driver(protocol))
    }

    /// Check whether a driver is registered, optionally within one protocol.
    pub fn driver_exists(
        &self,
        name: &str,
        protocol: Option<Protocol>,
        reset: bool,
    ) -> RegistryResult<bool> {
        let names = match protocol {
            Some(protocol) => self.names_for_protocol(protocol, reset)?,
            None => self.driver_names(reset)?,
        };
        Ok(names.iter().any(|n| n == name))
    }

    /// Default SQL Server driver.
    pub fn default_sqlserver_driver(&self) -> RegistryResult<String> {
        self.default_for_protocol(Protocol::SqlServer)
    }

    /// Default MySQL driver.
    pub fn default_mysql_driver(&self) -> RegistryResult<String> {
        self.default_for_protocol(Protocol::MySql)
    }

    /// Default PostgreSQL driver.
    pub fn default_postgres_driver(&self) -> RegistryResult<String> {
        self.default_for_protocol(Protocol::Postgres)
    }

    /// Default SQLite driver.
    ///
    /// The inventory parser never classifies SQLite drivers, so this fails unless a
    /// custom store was seeded with SQLite names.
    pub fn default_sqlite_driver(&self) -> RegistryResult<String> {
        self.default_for_protocol(Protocol::Sqlite)
    }

    /// SQL Server driver names.
    pub fn sqlserver_drivers(&self) -> RegistryResult<Arc<Vec<String>>> {
        self.names_for_protocol(Protocol::SqlServer, false)
    }

    /// MySQL driver names.
    pub fn mysql_drivers(&self) -> RegistryResult<Arc<Vec<String>>> {
        self.names_for_protocol(Protocol::MySql, false)
    }

    /// PostgreSQL driver names.
    pub fn postgres_drivers(&self) -> RegistryResult<Arc<Vec<String>>> {
        self.names_for_protocol(Protocol::Postgres, false)
    }

    /// SQLite driver names.
    pub fn sqlite_drivers(&self) -> RegistryResult<Arc<Vec<String>>> {
        self.names_for_protocol(Protocol::Sqlite, false)
    }

    /// Drop every cached view, including per-protocol name lists.
    pub fn invalidate_all(&self) {
        let mut keys = vec![
            CacheKey::all_drivers(),
            CacheKey::driver_names(),
            CacheKey::driver_map(),
        ];
        keys.extend(Protocol::ALL.into_iter().map(CacheKey::protocol));

        let removed = keys.iter().filter(|key| self.store.delete(key)).count();
        debug!(removed, "Invalidated ODBC driver cache");
    }

    fn remember<T: Clone>(
        &self,
        key: CacheKey,
        reset: bool,
        wrap: fn(T) -> CachedValue,
        unwrap: fn(CachedValue) -> Option<T>,
        mut compute: impl FnMut() -> RegistryResult<T>,
    ) -> RegistryResult<T> {
        if reset {
            debug!(key = %key, "Resetting cached driver view");
            self.store.delete(&key);
        }

        let value = self.store.remember(&key, &mut || compute().map(wrap))?;
        match unwrap(value) {
            Some(value) => Ok(value),
            None => {
                warn!(key = %key, "Cached driver view has an unexpected shape, recomputing");
                let value = compute()?;
                self.store.set(&key, wrap(value.clone()));
                Ok(value)
            }
        }
    }
}

fn as_names(value: CachedValue) -> Option<Arc<Vec<String>>> {
    match value {
        CachedValue::Names(names) => Some(names),
        _ => None,
    }
}
