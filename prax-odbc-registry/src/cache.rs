//! Cache store abstraction used to memoize driver lookups.
//!
//! The registry never owns its cache directly. A [`CacheStore`] is injected so the
//! same store can be shared process-wide, swapped for an external cache, or replaced
//! by [`NoopStore`] in tests.
//!
//! # Examples
//!
//! ```rust
//! use prax_odbc_registry::cache::{CacheKey, CacheStore, CachedValue, MemoryStore};
//! use std::sync::Arc;
//!
//! let store = MemoryStore::new();
//! let key = CacheKey::drivers("list");
//! assert_eq!(key.as_str(), "odbc:drivers:list");
//!
//! let names = Arc::new(vec!["ODBC Driver 18 for SQL Server".to_string()]);
//! store.set(&key, CachedValue::Names(names));
//! assert!(store.contains(&key));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use tracing::trace;

use crate::driver::{DriverEntry, DriverMap, Protocol};
use crate::error::RegistryResult;

/// A cache key of the form `prefix:namespace:identifier`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    prefix: String,
    namespace: String,
    identifier: String,
}

impl CacheKey {
    /// Create a new cache key under the `odbc` prefix.
    pub fn new(namespace: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            prefix: "odbc".to_string(),
            namespace: namespace.into(),
            identifier: identifier.into(),
        }
    }

    /// Create a key in the `drivers` namespace.
    pub fn drivers(identifier: impl Into<String>) -> Self {
        Self::new("drivers", identifier)
    }

    /// Key for the raw parse result.
    pub fn all_drivers() -> Self {
        Self::drivers("all")
    }

    /// Key for the flat list of driver names.
    pub fn driver_names() -> Self {
        Self::drivers("list")
    }

    /// Key for the protocol grouping.
    pub fn driver_map() -> Self {
        Self::drivers("map")
    }

    /// Key for the names of one protocol.
    pub fn protocol(protocol: Protocol) -> Self {
        Self::drivers(protocol.as_str())
    }

    /// Get the full key string.
    pub fn as_str(&self) -> String {
        let mut key = String::with_capacity(
            self.prefix.len() + self.namespace.len() + self.identifier.len() + 2,
        );
        key.push_str(&self.prefix);
        key.push(':');
        key.push_str(&self.namespace);
        key.push(':');
        key.push_str(&self.identifier);
        key
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.prefix, self.namespace, self.identifier)
    }
}

/// A value memoized by the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedValue {
    /// Parsed driver entries.
    Drivers(Arc<Vec<DriverEntry>>),
    /// Driver names.
    Names(Arc<Vec<String>>),
    /// Entries grouped by protocol.
    Map(Arc<DriverMap>),
}

/// Key/value cache the registry memoizes into.
///
/// Implementations must be safe to share between threads. Consistency guarantees
/// (last write wins, no cross-process coherency) are the implementation's own.
pub trait CacheStore: Send + Sync {
    /// Get a value.
    fn get(&self, key: &CacheKey) -> Option<CachedValue>;

    /// Store a value, replacing any previous one.
    fn set(&self, key: &CacheKey, value: CachedValue);

    /// Delete a value. Returns whether something was removed.
    fn delete(&self, key: &CacheKey) -> bool;

    /// Remove every value.
    fn clear(&self);

    /// Check if a key is present.
    fn contains(&self, key: &CacheKey) -> bool {
        self.get(key).is_some()
    }

    /// Return the cached value or compute, store and return it.
    ///
    /// A failing producer stores nothing.
    fn remember(
        &self,
        key: &CacheKey,
        producer: &mut dyn FnMut() -> RegistryResult<CachedValue>,
    ) -> RegistryResult<CachedValue> {
        if let Some(value) = self.get(key) {
            trace!(key = %key, "Cache hit");
            return Ok(value);
        }

        trace!(key = %key, "Cache miss");
        let value = producer()?;
        self.set(key, value.clone());
        Ok(value)
    }
}

impl<T: CacheStore + ?Sized> CacheStore for Arc<T> {
    fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        (**self).get(key)
    }

    fn set(&self, key: &CacheKey, value: CachedValue) {
        (**self).set(key, value)
    }

    fn delete(&self, key: &CacheKey) -> bool {
        (**self).delete(key)
    }

    fn clear(&self) {
        (**self).clear()
    }
}

/// Statistics for the in-memory store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of values currently cached.
    pub cached_count: usize,
}

impl CacheStats {
    /// Get the cache hit rate.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Process-local in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, CachedValue>>,
    stats: RwLock<CacheStats>,
}

static GLOBAL_STORE: LazyLock<Arc<MemoryStore>> = LazyLock::new(|| Arc::new(MemoryStore::new()));

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The store shared by every registry created with [`DriverRegistry::new`].
    ///
    /// [`DriverRegistry::new`]: crate::registry::DriverRegistry::new
    pub fn global() -> Arc<MemoryStore> {
        Arc::clone(&GLOBAL_STORE)
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.read().clone();
        stats.cached_count = self.entries.read().len();
        stats
    }

    /// Get the number of cached values.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        let value = self.entries.read().get(&key.as_str()).cloned();
        let mut stats = self.stats.write();
        if value.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        value
    }

    fn set(&self, key: &CacheKey, value: CachedValue) {
        self.entries.write().insert(key.as_str(), value);
    }

    fn delete(&self, key: &CacheKey) -> bool {
        self.entries.write().remove(&key.as_str()).is_some()
    }

    fn clear(&self) {
        self.entries.write().clear();
    }
}

/// A store that never retains anything; every lookup recomputes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl CacheStore for NoopStore {
    fn get(&self, _key: &CacheKey) -> Option<CachedValue> {
        None
    }

    fn set(&self, _key: &CacheKey, _value: CachedValue) {}

    fn delete(&self, _key: &CacheKey) -> bool {
        false
    }

    fn clear(&self) {}
}
