//! # prax-odbc-driver
//!
//! ODBC-bridged database drivers for Prax.
//!
//! This crate provides:
//! - Connection configuration loaded from TOML or built in code
//! - Protocol-correct DSN rendering with per-option renames and value encodings
//! - A SQL Server driver that resolves an installed ODBC driver, connects and runs
//!   post-connect setup
//! - Disabled placeholders for MySQL, PostgreSQL and SQLite
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use prax_odbc_driver::{ConnectionConfig, OdbcApiConnector, OdbcDriver, SqlServerDriver};
//! use prax_odbc_registry::DriverRegistry;
//!
//! let config = ConnectionConfig::builder()
//!     .host("db1")
//!     .database("orders")
//!     .username("app")
//!     .password("secret")
//!     .setting("NOCOUNT", "ON")
//!     .build();
//!
//! let mut driver = SqlServerDriver::new(config, Arc::new(DriverRegistry::new()), OdbcApiConnector);
//! driver.connect()?;
//! println!("connected to SQL Server {}", driver.version()?);
//! ```

pub mod adapter;
pub mod compiler;
pub mod config;
pub mod connection;
pub mod dsn;
pub mod error;
pub mod post_connect;

pub use adapter::{ConnectionState, OdbcDriver, ProtocolDriver, SqlServerDriver, UnsupportedDriver};
pub use compiler::{NoOutputCompiler, QueryCompiler, SqlServerCompiler, compiler_for};
pub use config::{
    Authentication, ConnectionConfig, ConnectionConfigBuilder, KeyStoreAuthentication,
    OptionValue, QuotedId,
};
#[cfg(feature = "odbc")]
pub use connection::{OdbcApiConnection, OdbcApiConnector};
pub use connection::{Connector, Credentials, NativeConnection};
pub use dsn::{DsnProfile, build_dsn};
pub use error::{DriverResult, OdbcError};
pub use post_connect::PostConnectExecutor;
