//! Protocol drivers.
//!
//! Each protocol reachable through ODBC has a driver implementing [`OdbcDriver`].
//! Only SQL Server has a working implementation; the other protocols are represented
//! by [`UnsupportedDriver`], which reports itself disabled and refuses to connect.

mod sqlserver;
mod unsupported;

use std::sync::Arc;

use prax_odbc_registry::{DriverRegistry, Protocol};

use crate::config::ConnectionConfig;
use crate::connection::Connector;
use crate::error::DriverResult;

pub use sqlserver::{ConnectionState, SqlServerDriver, VERSION_QUERY};
pub use unsupported::UnsupportedDriver;

/// Connection lifecycle shared by every protocol driver.
pub trait OdbcDriver {
    /// Protocol this driver connects to.
    fn protocol(&self) -> Protocol;

    /// Whether this protocol has a working implementation.
    fn supported(&self) -> bool {
        self.protocol().is_supported()
    }

    /// Whether the driver can be selected on this host.
    ///
    /// Fails when the driver inventory cannot be read.
    fn enabled(&self) -> DriverResult<bool>;

    /// Open the connection. A no-op when already connected.
    fn connect(&mut self) -> DriverResult<()>;

    /// Drop the connection, if any.
    fn disconnect(&mut self);

    /// Check if a connection is open.
    fn is_connected(&self) -> bool;

    /// Server product version, connecting first if needed.
    fn version(&mut self) -> DriverResult<String>;
}

/// A driver for any protocol.
pub enum ProtocolDriver<C: Connector> {
    /// SQL Server.
    SqlServer(SqlServerDriver<C>),
    /// A protocol without a working implementation.
    Unsupported(UnsupportedDriver),
}

impl<C: Connector> ProtocolDriver<C> {
    /// Create the driver for `protocol`.
    pub fn new(
        protocol: Protocol,
        config: ConnectionConfig,
        registry: Arc<DriverRegistry>,
        connector: C,
    ) -> Self {
        match protocol {
            Protocol::SqlServer => {
                Self::SqlServer(SqlServerDriver::new(config, registry, connector))
            }
            other => Self::Unsupported(UnsupportedDriver::new(other)),
        }
    }

    fn inner(&self) -> &dyn OdbcDriver {
        match self {
            Self::SqlServer(driver) => driver,
            Self::Unsupported(driver) => driver,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn OdbcDriver {
        match self {
            Self::SqlServer(driver) => driver,
            Self::Unsupported(driver) => driver,
        }
    }
}

impl<C: Connector> OdbcDriver for ProtocolDriver<C> {
    fn protocol(&self) -> Protocol {
        self.inner().protocol()
    }

    fn enabled(&self) -> DriverResult<bool> {
        self.inner().enabled()
    }

    fn connect(&mut self) -> DriverResult<()> {
        self.inner_mut().connect()
    }

    fn disconnect(&mut self) {
        self.inner_mut().disconnect()
    }

    fn is_connected(&self) -> bool {
        self.inner().is_connected()
    }

    fn version(&mut self) -> DriverResult<String> {
        self.inner_mut().version()
    }
}
