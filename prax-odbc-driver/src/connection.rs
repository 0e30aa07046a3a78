//! Native ODBC connection seam.
//!
//! The drivers in this crate never speak a wire protocol. They prepare a DSN and hand
//! it to a [`Connector`], which opens a [`NativeConnection`] through the host's ODBC
//! driver manager. With the `odbc` feature, [`OdbcApiConnector`] provides one backed
//! by `odbc-api`.

use std::borrow::Cow;

use crate::config::OptionValue;
use crate::error::DriverResult;

/// Prefix marking a DSN for the ODBC transport.
pub const ODBC_PREFIX: &str = "odbc:";

/// An open native connection.
pub trait NativeConnection {
    /// Execute a statement, discarding any result.
    fn exec(&mut self, sql: &str) -> DriverResult<()>;

    /// Assign a native connection attribute.
    fn set_attribute(&mut self, key: &str, value: &OptionValue) -> DriverResult<()>;

    /// Run a query and return the first column of the first row.
    fn query_scalar(&mut self, sql: &str) -> DriverResult<Option<String>>;
}

/// Login credentials passed to the native layer alongside the DSN.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Login name.
    pub username: Option<String>,
    /// Login password.
    pub password: Option<String>,
}

impl Credentials {
    /// Create credentials.
    pub fn new(username: Option<String>, password: Option<String>) -> Self {
        Self { username, password }
    }
}

/// Opens native connections.
pub trait Connector {
    /// Connection type produced by this connector.
    type Connection: NativeConnection;

    /// Check whether the ODBC transport is usable on this host.
    fn is_available(&self) -> bool;

    /// Open a connection for an `odbc:`-prefixed DSN.
    fn open(&self, dsn: &str, credentials: &Credentials) -> DriverResult<Self::Connection>;
}

/// Remove the `odbc:` transport prefix, if present.
pub fn strip_prefix(dsn: &str) -> &str {
    dsn.strip_prefix(ODBC_PREFIX).unwrap_or(dsn)
}

/// Quote a connection string value as `{...}` when it would otherwise split the string.
///
/// A closing brace inside the value is doubled.
pub fn quote_value(value: &str) -> Cow<'_, str> {
    let needs_quoting = value.contains([';', '{', '}'])
        || value.starts_with(char::is_whitespace)
        || value.ends_with(char::is_whitespace);
    if needs_quoting {
        Cow::Owned(format!("{{{}}}", value.replace('}', "}}")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Append `UID`/`PWD` to a connection string unless it already carries them.
pub fn with_credentials(connection_string: &str, credentials: &Credentials) -> String {
    let lowered = connection_string.to_ascii_lowercase();
    let has_key = |key: &str| {
        lowered
            .split(';')
            .any(|part| part.trim_start().starts_with(key))
    };

    let mut parts = vec![connection_string.trim_end_matches(';').to_string()];
    if let Some(username) = credentials.username.as_ref().filter(|_| !has_key("uid=")) {
        parts.push(format!("UID={}", quote_value(username)));
    }
    if let Some(password) = credentials.password.as_ref().filter(|_| !has_key("pwd=")) {
        parts.push(format!("PWD={}", quote_value(password)));
    }
    parts.join(";")
}

#[cfg(feature = "odbc")]
pub use native::{OdbcApiConnection, OdbcApiConnector};

#[cfg(feature = "odbc")]
mod native {
    use std::sync::OnceLock;

    use odbc_api::{Connection, ConnectionOptions, Cursor, Environment};
    use tracing::debug;

    use super::{Connector, Credentials, NativeConnection, strip_prefix, with_credentials};
    use crate::config::OptionValue;
    use crate::error::{DriverResult, OdbcError};

    static ODBC_ENV: OnceLock<Environment> = OnceLock::new();

    fn environment() -> DriverResult<&'static Environment> {
        if let Some(env) = ODBC_ENV.get() {
            return Ok(env);
        }
        let env = Environment::new()?;
        Ok(ODBC_ENV.get_or_init(|| env))
    }

    /// Connector backed by the system ODBC driver manager.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct OdbcApiConnector;

    impl Connector for OdbcApiConnector {
        type Connection = OdbcApiConnection;

        fn is_available(&self) -> bool {
            environment().is_ok()
        }

        fn open(&self, dsn: &str, credentials: &Credentials) -> DriverResult<OdbcApiConnection> {
            let env = environment()?;
            let connection_string = with_credentials(strip_prefix(dsn), credentials);
            let conn = env
                .connect_with_connection_string(&connection_string, ConnectionOptions::default())?;
            debug!(
                dbms = conn.database_management_system_name().ok().as_deref(),
                "Opened ODBC connection"
            );
            Ok(OdbcApiConnection { conn })
        }
    }

    /// Connection opened by [`OdbcApiConnector`].
    pub struct OdbcApiConnection {
        conn: Connection<'static>,
    }

    impl NativeConnection for OdbcApiConnection {
        fn exec(&mut self, sql: &str) -> DriverResult<()> {
            self.conn.execute(sql, ())?;
            Ok(())
        }

        fn set_attribute(&mut self, key: &str, value: &OptionValue) -> DriverResult<()> {
            match key.to_ascii_lowercase().as_str() {
                "autocommit" => Ok(self.conn.set_autocommit(value.is_truthy())?),
                _ => Err(OdbcError::execution(key, "unsupported connection attribute")),
            }
        }

        fn query_scalar(&mut self, sql: &str) -> DriverResult<Option<String>> {
            let Some(mut cursor) = self.conn.execute(sql, ())? else {
                return Ok(None);
            };
            let Some(mut row) = cursor.next_row()? else {
                return Ok(None);
            };

            let mut buf = Vec::new();
            if !row.get_text(1, &mut buf)? {
                return Ok(None);
            }
            String::from_utf8(buf)
                .map(Some)
                .map_err(|e| OdbcError::execution(sql, e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strip_prefix() {
        assert_eq!(strip_prefix("odbc:Server=db1;"), "Server=db1;");
        assert_eq!(strip_prefix("Server=db1;"), "Server=db1;");
    }

    #[test]
    fn test_with_credentials_appends() {
        let creds = Credentials::new(Some("sa".into()), Some("pw".into()));
        assert_eq!(
            with_credentials("Server=db1;Database=master", &creds),
            "Server=db1;Database=master;UID=sa;PWD=pw"
        );
    }

    #[test]
    fn test_with_credentials_keeps_existing() {
        let creds = Credentials::new(Some("sa".into()), Some("pw".into()));
        assert_eq!(
            with_credentials("Server=db1;uid=app;", &creds),
            "Server=db1;uid=app;PWD=pw"
        );
    }

    #[test]
    fn test_credentials_are_brace_quoted() {
        let creds = Credentials::new(Some("sa".into()), Some("p;Database=evil".into()));
        assert_eq!(
            with_credentials("Server=db1;Database=master", &creds),
            "Server=db1;Database=master;UID=sa;PWD={p;Database=evil}"
        );
    }

    #[test]
    fn test_quote_value() {
        assert_eq!(quote_value("plain"), "plain");
        assert_eq!(quote_value("a}b"), "{a}}b}");
        assert_eq!(quote_value("{x"), "{{x}");
        assert_eq!(quote_value(" padded"), "{ padded}");
    }

    #[test]
    fn test_without_credentials() {
        assert_eq!(
            with_credentials("Server=db1;", &Credentials::default()),
            "Server=db1"
        );
    }
}
