//! SQL Server over ODBC.

use std::sync::Arc;

use prax_odbc_registry::{DriverRegistry, Protocol};
use tracing::{debug, info, warn};

use super::OdbcDriver;
use crate::compiler::{QueryCompiler, compiler_for};
use crate::config::ConnectionConfig;
use crate::connection::{Connector, Credentials, NativeConnection, ODBC_PREFIX};
use crate::dsn::build_dsn;
use crate::error::{DriverResult, OdbcError};
use crate::post_connect::PostConnectExecutor;

/// Query used to read the server product version.
pub const VERSION_QUERY: &str = "SELECT SERVERPROPERTY('ProductVersion') as VERSION";

/// Lifecycle state of a driver's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No connection attempted yet, or explicitly disconnected.
    #[default]
    Disconnected,
    /// Connection open and post-connect setup complete.
    Connected,
    /// The last connection attempt failed.
    Failed,
}

/// SQL Server driver.
///
/// Resolves an installed SQL Server ODBC driver, renders the DSN, opens the native
/// connection and runs post-connect setup. The connection is owned by this driver.
pub struct SqlServerDriver<C: Connector> {
    config: ConnectionConfig,
    registry: Arc<DriverRegistry>,
    connector: C,
    executor: PostConnectExecutor,
    connection: Option<C::Connection>,
    state: ConnectionState,
    version: Option<String>,
}

impl<C: Connector> SqlServerDriver<C> {
    /// Create a disconnected driver.
    pub fn new(config: ConnectionConfig, registry: Arc<DriverRegistry>, connector: C) -> Self {
        Self {
            config,
            registry,
            connector,
            executor: PostConnectExecutor::new(),
            connection: None,
            state: ConnectionState::Disconnected,
            version: None,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Get the connector.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Get the current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Get the open connection.
    pub fn connection_mut(&mut self) -> Option<&mut C::Connection> {
        self.connection.as_mut()
    }

    /// Name of the ODBC driver this connection will use.
    ///
    /// An explicitly configured driver must be installed; otherwise the first
    /// installed SQL Server driver is used.
    pub fn resolve_driver(&self) -> DriverResult<String> {
        match self.config.driver() {
            Some(name) => {
                if self.registry.driver_exists(&name, None, false)? {
                    Ok(name)
                } else {
                    Err(OdbcError::missing_driver(format!(
                        "Unable to find ODBC driver [{}] for connection.",
                        name
                    )))
                }
            }
            None => Ok(self.registry.default_sqlserver_driver()?),
        }
    }

    /// Render the DSN for this connection, with the driver resolved.
    pub fn dsn(&self) -> DriverResult<String> {
        let driver = self.resolve_driver()?;
        debug!(driver = %driver, "Resolved SQL Server ODBC driver");

        let mut config = self.config.clone();
        config.set_option("driver", driver);
        Ok(build_dsn(&config))
    }

    /// Compiler for this connection's `useInsertOutput` setting.
    pub fn new_compiler(&self) -> Box<dyn QueryCompiler> {
        compiler_for(self.config.use_insert_output)
    }

    fn open(&self) -> DriverResult<C::Connection> {
        let dsn = format!("{}{}", ODBC_PREFIX, self.dsn()?);
        let credentials =
            Credentials::new(self.config.username.clone(), self.config.password.clone());
        let mut conn = self.connector.open(&dsn, &credentials)?;
        self.executor.run(&mut conn, &self.config)?;
        Ok(conn)
    }
}

impl<C: Connector> OdbcDriver for SqlServerDriver<C> {
    fn protocol(&self) -> Protocol {
        Protocol::SqlServer
    }

    fn enabled(&self) -> DriverResult<bool> {
        if !self.connector.is_available() {
            return Ok(false);
        }
        Ok(!self.registry.sqlserver_drivers()?.is_empty())
    }

    fn connect(&mut self) -> DriverResult<()> {
        if self.connection.is_some() {
            return Ok(());
        }

        match self.open() {
            Ok(conn) => {
                info!(host = %self.config.host_or_default(), "Connected to SQL Server over ODBC");
                self.connection = Some(conn);
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "SQL Server connection failed");
                self.state = ConnectionState::Failed;
                Err(e)
            }
        }
    }

    fn disconnect(&mut self) {
        if self.connection.take().is_some() {
            debug!("Disconnected from SQL Server");
        }
        self.state = ConnectionState::Disconnected;
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn version(&mut self) -> DriverResult<String> {
        if let Some(version) = &self.version {
            return Ok(version.clone());
        }

        self.connect()?;
        let conn = self
            .connection
            .as_mut()
            .ok_or_else(|| OdbcError::execution(VERSION_QUERY, "not connected"))?;
        let version = conn.query_scalar(VERSION_QUERY)?.unwrap_or_default();
        self.version = Some(version.clone());
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::tests::{FakeConnector, INVENTORY, registry};
    use prax_odbc_registry::{FileInventory, MemoryStore};
    use pretty_assertions::assert_eq;

    fn driver(config: ConnectionConfig) -> SqlServerDriver<FakeConnector> {
        SqlServerDriver::new(config, registry(INVENTORY), FakeConnector::default())
    }

    #[test]
    fn test_connect_uses_default_driver() {
        let mut driver = driver(ConnectionConfig::builder().host("db1").build());
        driver.connect().unwrap();

        assert_eq!(driver.state(), ConnectionState::Connected);
        let opened = driver.connector().opened.borrow();
        assert_eq!(opened.len(), 1);
        assert!(opened[0].0.starts_with("odbc:Server=db1,1433;"));
        assert!(opened[0].0.contains("Driver=ODBC Driver 17 for SQL Server"));
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut driver = driver(ConnectionConfig::default());
        driver.connect().unwrap();
        driver.connect().unwrap();
        assert_eq!(driver.connector().opened.borrow().len(), 1);
    }

    #[test]
    fn test_explicit_driver_must_exist() {
        let mut driver = driver(ConnectionConfig::builder().driver("FreeTDS").build());
        let err = driver.connect().unwrap_err();

        assert!(err.is_missing_driver());
        assert!(err.to_string().contains("Unable to find ODBC driver [FreeTDS]"));
        assert_eq!(driver.state(), ConnectionState::Failed);
        assert!(driver.connector().opened.borrow().is_empty());
    }

    #[test]
    fn test_explicit_driver_is_used() {
        let config = ConnectionConfig::builder()
            .driver("ODBC Driver 18 for SQL Server")
            .build();
        let driver = driver(config);
        assert!(driver.dsn().unwrap().contains("Driver=ODBC Driver 18 for SQL Server"));
    }

    #[test]
    fn test_no_sqlserver_driver_installed() {
        let inventory = "[MySQL ODBC 8.0 Unicode Driver]\nDescription=MySQL\n";
        let mut driver = SqlServerDriver::new(
            ConnectionConfig::default(),
            registry(inventory),
            FakeConnector::default(),
        );

        assert!(driver.connect().unwrap_err().is_missing_driver());
        assert!(!driver.enabled().unwrap());
    }

    #[test]
    fn test_credentials_passed_separately() {
        let config = ConnectionConfig::builder()
            .username("sa")
            .password("secret")
            .build();
        let mut driver = driver(config);
        driver.connect().unwrap();

        let opened = driver.connector().opened.borrow();
        assert!(!opened[0].0.contains("secret"));
        assert_eq!(
            opened[0].1,
            Credentials::new(Some("sa".into()), Some("secret".into()))
        );
    }

    #[test]
    fn test_post_connect_runs_before_connected() {
        let config = ConnectionConfig::builder()
            .init("SET ANSI_NULLS ON")
            .setting("NOCOUNT", "ON")
            .build();
        let mut driver = driver(config);
        driver.connect().unwrap();

        let conn = driver.connection_mut().unwrap();
        assert_eq!(conn.calls, vec!["exec:SET ANSI_NULLS ON", "exec:SET NOCOUNT ON"]);
    }

    #[test]
    fn test_post_connect_failure_fails_connect() {
        let connector = FakeConnector {
            fail_on: Some("SET NOCOUNT ON".to_string()),
            ..FakeConnector::default()
        };
        let config = ConnectionConfig::builder().setting("NOCOUNT", "ON").build();
        let mut driver = SqlServerDriver::new(config, registry(INVENTORY), connector);

        assert!(driver.connect().unwrap_err().is_execution());
        assert!(!driver.is_connected());
        assert_eq!(driver.state(), ConnectionState::Failed);
    }

    #[test]
    fn test_failed_connect_can_retry() {
        let mut driver = driver(ConnectionConfig::default());
        driver.connector().refuse.set(true);
        assert!(driver.connect().is_err());

        driver.connector().refuse.set(false);
        driver.connect().unwrap();
        assert_eq!(driver.state(), ConnectionState::Connected);
        assert_eq!(driver.connector().opened.borrow().len(), 2);
    }

    #[test]
    fn test_version_connects_and_caches() {
        let mut driver = driver(ConnectionConfig::default());
        assert!(!driver.is_connected());

        assert_eq!(driver.version().unwrap(), "16.0.1000.6");
        assert_eq!(driver.version().unwrap(), "16.0.1000.6");

        assert!(driver.is_connected());
        assert_eq!(driver.connection_mut().unwrap().queries, 1);
    }

    #[test]
    fn test_enabled_requires_transport() {
        let connector = FakeConnector {
            available: false,
            ..FakeConnector::default()
        };
        let offline =
            SqlServerDriver::new(ConnectionConfig::default(), registry(INVENTORY), connector);
        assert!(!offline.enabled().unwrap());
        assert!(driver(ConnectionConfig::default()).enabled().unwrap());
    }

    #[test]
    fn test_enabled_surfaces_inventory_errors() {
        let registry = Arc::new(DriverRegistry::with_parts(
            FileInventory::new("/nonexistent/odbcinst.ini"),
            Arc::new(MemoryStore::new()),
        ));
        let driver = SqlServerDriver::new(
            ConnectionConfig::default(),
            registry,
            FakeConnector::default(),
        );

        let err = driver.enabled().unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("/nonexistent/odbcinst.ini"));
    }

    #[test]
    fn test_new_compiler_follows_insert_output() {
        let keep = driver(ConnectionConfig::default());
        assert!(
            keep.new_compiler()
                .build_insert_part("t", &["a"])
                .ends_with("OUTPUT INSERTED.*")
        );

        let trimmed = driver(ConnectionConfig::builder().use_insert_output(false).build());
        assert_eq!(
            trimmed.new_compiler().build_insert_part("t", &["a"]),
            "INSERT INTO t (a)"
        );
    }

    #[test]
    fn test_disconnect_resets_state() {
        let mut driver = driver(ConnectionConfig::default());
        driver.connect().unwrap();
        driver.disconnect();
        assert_eq!(driver.state(), ConnectionState::Disconnected);
        driver.connect().unwrap();
        assert_eq!(driver.connector().opened.borrow().len(), 2);
    }
}
