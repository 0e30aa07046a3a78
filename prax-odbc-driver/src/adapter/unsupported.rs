//! Protocols without a working ODBC implementation.

use prax_odbc_registry::Protocol;
use tracing::debug;

use super::OdbcDriver;
use crate::error::{DriverResult, OdbcError};

/// Driver for a protocol that cannot be used through ODBC yet.
///
/// Always disabled. Every connection attempt fails with a missing driver error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedDriver {
    protocol: Protocol,
}

impl UnsupportedDriver {
    /// Create a driver for `protocol`.
    pub fn new(protocol: Protocol) -> Self {
        Self { protocol }
    }

    fn unavailable(&self) -> OdbcError {
        OdbcError::missing_driver(format!(
            "{} connections through ODBC are not supported",
            self.protocol
        ))
    }
}

impl OdbcDriver for UnsupportedDriver {
    fn protocol(&self) -> Protocol {
        self.protocol
    }

    fn supported(&self) -> bool {
        false
    }

    fn enabled(&self) -> DriverResult<bool> {
        Ok(false)
    }

    fn connect(&mut self) -> DriverResult<()> {
        debug!(protocol = %self.protocol, "Refusing unsupported ODBC protocol");
        Err(self.unavailable())
    }

    fn disconnect(&mut self) {}

    fn is_connected(&self) -> bool {
        false
    }

    fn version(&mut self) -> DriverResult<String> {
        Err(self.unavailable())
    }
}
