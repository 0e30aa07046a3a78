//! Connection configuration for ODBC-bridged drivers.
//!
//! A [`ConnectionConfig`] keeps protocol options in a loosely typed, ordered map so
//! it can be filled from a `toml` document as well as from the typed
//! [`ConnectionConfigBuilder`]. Options are resolved against a protocol's option
//! schema when the DSN is built (see [`crate::dsn`]).
//!
//! ```toml
//! host = "db1"
//! username = "app"
//! password = "${DB_PASSWORD}"
//! database = "orders"
//! encrypt = true
//! init = ["SET ANSI_NULLS ON"]
//!
//! [settings]
//! NOCOUNT = "ON"
//! ```

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use prax_odbc_registry::{EnvSource, StdEnvSource};
use regex_lite::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{DriverResult, OdbcError};

static ENV_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("environment reference pattern"));

/// A single configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    /// Explicitly unset. Overrides any schema default.
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Free text.
    Text(String),
}

impl OptionValue {
    /// Check if the value is unset.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Truthiness used when a value feeds a flag.
    ///
    /// Text is false when empty, `"0"`, `"false"`, `"no"` or `"off"` (case-insensitive).
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Text(s) => {
                let s = s.trim();
                !(s.is_empty()
                    || s == "0"
                    || s.eq_ignore_ascii_case("false")
                    || s.eq_ignore_ascii_case("no")
                    || s.eq_ignore_ascii_case("off"))
            }
        }
    }

    /// Render the value as it appears in a connection string or statement.
    ///
    /// Booleans render as `1`/`0`. Returns `None` for [`OptionValue::Null`].
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
            Self::Int(i) => Some(i.to_string()),
            Self::Text(s) => Some(s.clone()),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render().unwrap_or_default())
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u16> for OptionValue {
    fn from(value: u16) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<OptionValue>> From<Option<T>> for OptionValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// SQL Server quoted identifier mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuotedId {
    /// SQL-92 quoting rules.
    #[default]
    Sql92,
    /// Legacy Transact-SQL quoting rules.
    Legacy,
}

impl QuotedId {
    /// Numeric code sent in the DSN.
    pub fn code(&self) -> i64 {
        match self {
            Self::Sql92 => 1,
            Self::Legacy => 0,
        }
    }
}

impl From<QuotedId> for OptionValue {
    fn from(value: QuotedId) -> Self {
        Self::Int(value.code())
    }
}

/// SQL Server authentication mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Authentication {
    /// SQL Server login and password.
    #[default]
    SqlPassword,
    /// Azure Active Directory login and password.
    ActiveDirectoryPassword,
    /// Azure managed service identity.
    ActiveDirectoryMsi,
    /// Azure service principal.
    ActiveDirectoryServicePrincipal,
}

impl Authentication {
    /// Keyword sent in the DSN.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlPassword => "SqlPassword",
            Self::ActiveDirectoryPassword => "ActiveDirectoryPassword",
            Self::ActiveDirectoryMsi => "ActiveDirectoryMsi",
            Self::ActiveDirectoryServicePrincipal => "ActiveDirectoryServicePrincipal",
        }
    }
}

impl From<Authentication> for OptionValue {
    fn from(value: Authentication) -> Self {
        Self::Text(value.as_str().to_string())
    }
}

/// Key store authentication mode for Always Encrypted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStoreAuthentication {
    /// Key vault user and password.
    KeyVaultPassword,
    /// Key vault client secret.
    KeyVaultClientSecret,
}

impl KeyStoreAuthentication {
    /// Keyword sent in the DSN.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KeyVaultPassword => "KeyVaultPassword",
            Self::KeyVaultClientSecret => "KeyVaultClientSecret",
        }
    }
}

impl From<KeyStoreAuthentication> for OptionValue {
    fn from(value: KeyStoreAuthentication) -> Self {
        Self::Text(value.as_str().to_string())
    }
}

/// Per-connection configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Server host (default: `localhost`).
    #[serde(default)]
    pub host: Option<String>,

    /// Login name, passed to the native connection alongside the DSN.
    #[serde(default)]
    pub username: Option<String>,

    /// Login password, passed to the native connection alongside the DSN.
    #[serde(default)]
    pub password: Option<String>,

    /// Raw statements run right after connecting.
    #[serde(default, deserialize_with = "string_or_list")]
    pub init: Vec<String>,

    /// Session settings applied as `SET key value`.
    #[serde(default)]
    pub settings: IndexMap<String, OptionValue>,

    /// Native connection attributes.
    #[serde(default)]
    pub attributes: IndexMap<String, OptionValue>,

    /// Keep the `OUTPUT INSERTED.*` clause on generated inserts.
    #[serde(default = "default_true")]
    pub use_insert_output: bool,

    /// Protocol options, keyed by their configuration name.
    #[serde(flatten)]
    pub options: IndexMap<String, OptionValue>,
}

fn default_true() -> bool {
    true
}

fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::One(command) => vec![command],
        StringOrList::Many(commands) => commands,
    })
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: None,
            username: None,
            password: None,
            init: Vec::new(),
            settings: IndexMap::new(),
            attributes: IndexMap::new(),
            use_insert_output: true,
            options: IndexMap::new(),
        }
    }
}

impl ConnectionConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ConnectionConfigBuilder {
        ConnectionConfigBuilder::new()
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> DriverResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| OdbcError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> DriverResult<Self> {
        Self::from_str_with_env(content, &StdEnvSource)
    }

    /// Parse configuration from a TOML string, expanding `${VAR}` from `env`.
    pub fn from_str_with_env(content: &str, env: &dyn EnvSource) -> DriverResult<Self> {
        let expanded = expand_env_vars(content, env);
        Ok(toml::from_str(&expanded)?)
    }

    /// Get a protocol option.
    pub fn option(&self, key: &str) -> Option<&OptionValue> {
        self.options.get(key)
    }

    /// Set a protocol option.
    pub fn set_option(&mut self, key: impl Into<String>, value: impl Into<OptionValue>) {
        self.options.insert(key.into(), value.into());
    }

    /// Get the host, falling back to `localhost`.
    pub fn host_or_default(&self) -> &str {
        self.host.as_deref().unwrap_or("localhost")
    }

    /// The explicitly configured driver name, if any.
    pub fn driver(&self) -> Option<String> {
        self.option("driver")
            .and_then(OptionValue::render)
            .filter(|name| !name.is_empty())
    }
}

/// Expand environment variables in the format `${VAR_NAME}`.
///
/// Unknown variables are left untouched.
fn expand_env_vars(content: &str, env: &dyn EnvSource) -> String {
    ENV_REFERENCE
        .replace_all(content, |caps: &regex_lite::Captures<'_>| {
            env.get(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Builder for [`ConnectionConfig`].
#[derive(Debug, Default)]
pub struct ConnectionConfigBuilder {
    config: ConnectionConfig,
}

impl ConnectionConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = Some(host.into());
        self
    }

    /// Set the login name.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self
    }

    /// Set the login password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Append a statement to run after connecting.
    pub fn init(mut self, command: impl Into<String>) -> Self {
        self.config.init.push(command.into());
        self
    }

    /// Add a `SET` session setting.
    pub fn setting(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.config.settings.insert(key.into(), value.into());
        self
    }

    /// Add a native connection attribute.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.config.attributes.insert(key.into(), value.into());
        self
    }

    /// Keep or suppress `OUTPUT INSERTED.*` on generated inserts.
    pub fn use_insert_output(mut self, enabled: bool) -> Self {
        self.config.use_insert_output = enabled;
        self
    }

    /// Set any protocol option by name.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.config.set_option(key, value);
        self
    }

    /// Force an option to null so neither it nor its default reaches the DSN.
    pub fn unset(self, key: impl Into<String>) -> Self {
        self.option(key, OptionValue::Null)
    }

    /// Set the application name.
    pub fn app(self, app: impl Into<String>) -> Self {
        self.option("app", app.into())
    }

    /// Set the server port.
    pub fn port(self, port: u16) -> Self {
        self.option("port", port)
    }

    /// Set the named instance.
    pub fn instance(self, instance: impl Into<String>) -> Self {
        self.option("instance", instance.into())
    }

    /// Declare a read-only application intent.
    pub fn read_only(self, read_only: bool) -> Self {
        self.option("readOnly", read_only)
    }

    /// Set the database name.
    pub fn database(self, database: impl Into<String>) -> Self {
        self.option("database", database.into())
    }

    /// Encrypt the connection.
    pub fn encrypt(self, encrypt: bool) -> Self {
        self.option("encrypt", encrypt)
    }

    /// Enable multiple active result sets.
    pub fn multiple_active_result_sets(self, enabled: bool) -> Self {
        self.option("multipleActiveResultSets", enabled)
    }

    /// Set an access token.
    pub fn access_token(self, token: impl Into<String>) -> Self {
        self.option("accessToken", token.into())
    }

    /// Enable Always Encrypted column encryption.
    pub fn column_encryption(self, enabled: bool) -> Self {
        self.option("columnEncryption", enabled)
    }

    /// Set the authentication mode.
    pub fn authentication(self, mode: Authentication) -> Self {
        self.option("authentication", mode)
    }

    /// Enable driver connection pooling.
    pub fn connection_pooling(self, enabled: bool) -> Self {
        self.option("connectionPooling", enabled)
    }

    /// Set the number of reconnect attempts.
    pub fn connect_retry_count(self, count: u32) -> Self {
        self.option("connectRetryCount", count)
    }

    /// Set the seconds between reconnect attempts.
    pub fn connect_retry_interval(self, seconds: u32) -> Self {
        self.option("connectRetryInterval", seconds)
    }

    /// Set the ODBC driver name.
    pub fn driver(self, driver: impl Into<String>) -> Self {
        self.option("driver", driver.into())
    }

    /// Set the mirroring failover partner.
    pub fn failover_partner(self, partner: impl Into<String>) -> Self {
        self.option("failoverPartner", partner.into())
    }

    /// Set the key store authentication mode.
    pub fn key_store_authentication(self, mode: KeyStoreAuthentication) -> Self {
        self.option("keyStoreAuthentication", mode)
    }

    /// Set the key store principal id.
    pub fn key_store_principal_id(self, id: impl Into<String>) -> Self {
        self.option("keyStorePrincipalId", id.into())
    }

    /// Set the key store secret.
    pub fn key_store_secret(self, secret: impl Into<String>) -> Self {
        self.option("keyStoreSecret", secret.into())
    }

    /// Set the session language.
    pub fn language(self, language: impl Into<String>) -> Self {
        self.option("language", language.into())
    }

    /// Set the login timeout in seconds.
    pub fn login_timeout(self, seconds: u32) -> Self {
        self.option("loginTimeout", seconds)
    }

    /// Enable multi-subnet failover.
    pub fn multi_subnet_failover(self, enabled: bool) -> Self {
        self.option("multiSubnetFailover", enabled)
    }

    /// Set the quoted identifier mode.
    pub fn quoted_id(self, mode: QuotedId) -> Self {
        self.option("quotedId", mode)
    }

    /// Trust the server certificate.
    pub fn trust_server_certificate(self, trust: bool) -> Self {
        self.option("trustServerCertificate", trust)
    }

    /// Set the workstation id.
    pub fn wsid(self, wsid: impl Into<String>) -> Self {
        self.option("wsid", wsid.into())
    }

    /// Build the configuration.
    pub fn build(self) -> ConnectionConfig {
        self.config
    }
}
