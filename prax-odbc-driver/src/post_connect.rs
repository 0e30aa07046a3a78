//! Session setup run against a freshly opened connection.

use tracing::{debug, warn};

use crate::config::ConnectionConfig;
use crate::connection::NativeConnection;
use crate::error::{DriverResult, OdbcError};

/// Runs `init` statements, then `SET` settings, then native attributes.
///
/// The first failure aborts the sequence. Steps that already ran are not undone.
/// A setting with a null value is rejected before anything is sent for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostConnectExecutor;

impl PostConnectExecutor {
    /// Create a new executor.
    pub fn new() -> Self {
        Self
    }

    /// Run every configured step against `conn`.
    pub fn run<C>(&self, conn: &mut C, config: &ConnectionConfig) -> DriverResult<()>
    where
        C: NativeConnection + ?Sized,
    {
        for command in &config.init {
            debug!(statement = %command, "Running init statement");
            conn.exec(command).inspect_err(|e| {
                warn!(statement = %command, error = %e, "Init statement failed");
            })?;
        }

        for (key, value) in &config.settings {
            if value.is_null() {
                warn!(setting = %key, "Session setting has no value");
                return Err(OdbcError::execution(
                    format!("SET {key}"),
                    "session setting has no value",
                ));
            }
            let statement = format!("SET {} {}", key, value);
            debug!(statement = %statement, "Applying session setting");
            conn.exec(&statement).inspect_err(|e| {
                warn!(statement = %statement, error = %e, "Session setting failed");
            })?;
        }

        for (key, value) in &config.attributes {
            debug!(attribute = %key, "Setting connection attribute");
            conn.set_attribute(key, value).inspect_err(|e| {
                warn!(attribute = %key, error = %e, "Connection attribute failed");
            })?;
        }

        Ok(())
    }
}
