//! Error types for driver inventory loading and lookups.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

use crate::driver::Protocol;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur while reading the driver inventory or resolving drivers.
#[derive(Error, Debug, Diagnostic)]
pub enum RegistryError {
    /// The inventory location is missing, not a file, or not readable.
    #[error("configuration error: {message}")]
    #[diagnostic(code(prax::odbc::config_error))]
    Config { message: String },

    /// The inventory file exists but could not be loaded.
    #[error("ODBCINST file [{path}] could not be loaded")]
    #[diagnostic(code(prax::odbc::io_error))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// No driver is registered for the requested protocol.
    #[error("no drivers found for {protocol} protocol")]
    #[diagnostic(
        code(prax::odbc::missing_driver),
        help("install an ODBC driver for {protocol} and register it in odbcinst.ini")
    )]
    MissingDriver { protocol: Protocol },
}

impl RegistryError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing driver error for a protocol.
    pub fn missing_driver(protocol: Protocol) -> Self {
        Self::MissingDriver { protocol }
    }

    /// Check if this error comes from the inventory configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Io { .. })
    }

    /// Check if this is a missing driver error.
    pub fn is_missing_driver(&self) -> bool {
        matches!(self, Self::MissingDriver { .. })
    }
}
