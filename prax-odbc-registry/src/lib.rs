//! # prax-odbc-registry
//!
//! Installed ODBC driver discovery for Prax.
//!
//! This crate provides:
//! - Locating and reading the system driver inventory (`odbcinst.ini`)
//! - Classifying inventory sections into protocol families
//! - Memoized driver views behind an injectable cache store
//!
//! ## Example
//!
//! ```rust,ignore
//! use prax_odbc_registry::{DriverRegistry, Protocol};
//!
//! let registry = DriverRegistry::new();
//! let driver = registry.default_for_protocol(Protocol::SqlServer)?;
//! assert!(registry.driver_exists(&driver, Some(Protocol::SqlServer), false)?);
//! ```

pub mod cache;
pub mod driver;
pub mod error;
pub mod parser;
pub mod registry;
pub mod source;

pub use cache::{CacheKey, CacheStats, CacheStore, CachedValue, MemoryStore, NoopStore};
pub use driver::{DriverEntry, DriverMap, Protocol, group_by_protocol};
pub use error::{RegistryError, RegistryResult};
pub use parser::{classify, parse};
pub use registry::DriverRegistry;
pub use source::{
    DEFAULT_INVENTORY_PATH, EnvInventory, EnvSource, FileInventory, INVENTORY_ENV_VAR,
    InventorySource, MapEnvSource, StaticInventory, StdEnvSource,
};
