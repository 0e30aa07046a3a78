//! # Prax ODBC
//!
//! Connect Prax to relational databases through installed ODBC drivers.
//!
//! Prax ODBC provides:
//! - Discovery and classification of the drivers listed in `odbcinst.ini`
//! - Cached driver lookups with explicit invalidation
//! - SQL Server DSN rendering from a typed or TOML configuration
//! - A SQL Server driver with post-connect session setup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use prax_odbc::prelude::*;
//!
//! prax_odbc::logging::init();
//!
//! let registry = Arc::new(DriverRegistry::new());
//! let config = ConnectionConfig::from_file("odbc.toml")?;
//!
//! let mut driver = ProtocolDriver::new(Protocol::SqlServer, config, registry, OdbcApiConnector);
//! if driver.enabled()? {
//!     driver.connect()?;
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod logging;

/// Installed driver discovery and caching.
pub mod registry {
    pub use prax_odbc_registry::*;
}

/// Connection configuration, DSN rendering and protocol drivers.
pub mod driver {
    pub use prax_odbc_driver::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    #[cfg(feature = "odbc")]
    pub use crate::driver::OdbcApiConnector;
    pub use crate::driver::{
        ConnectionConfig, Connector, NativeConnection, OdbcDriver, OdbcError, ProtocolDriver,
        SqlServerDriver, build_dsn,
    };
    pub use crate::registry::{DriverRegistry, MemoryStore, Protocol, RegistryError};
}

// Re-export key types at the crate root
pub use prax_odbc_driver::{ConnectionConfig, DriverResult, OdbcError};
pub use prax_odbc_registry::{DriverRegistry, Protocol, RegistryError, RegistryResult};
