//! Error types for ODBC driver operations.

use prax_odbc_registry::RegistryError;
use thiserror::Error;

/// Result type for ODBC driver operations.
pub type DriverResult<T> = Result<T, OdbcError>;

/// Errors that can occur while preparing or opening an ODBC connection.
#[derive(Error, Debug)]
pub enum OdbcError {
    /// The driver inventory could not be located or loaded.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// No usable driver for the requested protocol or driver name.
    #[error("missing driver: {0}")]
    MissingDriver(String),

    /// A statement or attribute assignment failed on an open connection.
    #[error("execution error in `{statement}`: {message}")]
    Execution {
        /// The statement or attribute that failed.
        statement: String,
        /// The failure reported by the connection.
        message: String,
    },

    /// Connection configuration file could not be parsed.
    #[error("invalid connection config: {0}")]
    Toml(#[from] toml::de::Error),

    /// Connection configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Error raised by the native ODBC layer.
    #[cfg(feature = "odbc")]
    #[error("odbc error: {0}")]
    Native(#[from] odbc_api::Error),
}

impl OdbcError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a missing driver error.
    pub fn missing_driver(message: impl Into<String>) -> Self {
        Self::MissingDriver(message.into())
    }

    /// Create an execution error.
    pub fn execution(statement: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            statement: statement.into(),
            message: message.into(),
        }
    }

    /// Check if this is a configuration error.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Toml(_) | Self::Io { .. })
    }

    /// Check if this is a missing driver error.
    pub fn is_missing_driver(&self) -> bool {
        matches!(self, Self::MissingDriver(_))
    }

    /// Check if this error came from an open connection.
    pub fn is_execution(&self) -> bool {
        match self {
            Self::Execution { .. } => true,
            #[cfg(feature = "odbc")]
            Self::Native(_) => true,
            _ => false,
        }
    }
}

impl From<RegistryError> for OdbcError {
    fn from(err: RegistryError) -> Self {
        if err.is_missing_driver() {
            OdbcError::MissingDriver(err.to_string())
        } else {
            OdbcError::Configuration(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prax_odbc_registry::Protocol;

    #[test]
    fn test_error_creation() {
        let err = OdbcError::configuration("No ODBCINST file defined.");
        assert!(err.is_configuration());

        let err = OdbcError::missing_driver("Unable to find ODBC driver [Foo] for connection.");
        assert!(err.is_missing_driver());

        let err = OdbcError::execution("SET NOCOUNT ON", "syntax error");
        assert!(err.is_execution());
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_from_registry_error() {
        let err: OdbcError = RegistryError::missing_driver(Protocol::SqlServer).into();
        assert!(err.is_missing_driver());
        assert!(err.to_string().contains("sqlserver"));

        let err: OdbcError = RegistryError::config("No ODBCINST file defined.").into();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_error_display() {
        let err = OdbcError::execution("SET LANGUAGE x", "unknown language");
        assert_eq!(
            err.to_string(),
            "execution error in `SET LANGUAGE x`: unknown language"
        );
    }
}
