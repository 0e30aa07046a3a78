//! DSN rendering.
//!
//! A [`DsnProfile`] is the ordered option schema of one protocol. Rendering merges the
//! caller's options over the schema defaults, folds `instance` and `port` into the
//! server token, then emits every remaining non-null option in schema order.

use tracing::debug;

use crate::config::{ConnectionConfig, OptionValue};

/// How an option's value is written into the DSN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Rendered as-is. Booleans become `1`/`0`.
    Passthrough,
    /// Coerced to `1`/`0` by truthiness.
    Flag,
    /// Coerced to `yes`/`no` by truthiness.
    YesNo,
    /// Coerced to `ReadOnly`/`ReadWrite` by truthiness.
    Intent,
    /// Appended to the server token as `host\instance`.
    Instance,
    /// Appended to the server token as `host,port`.
    Port,
}

impl Encoding {
    fn encode(self, value: &OptionValue) -> Option<String> {
        if value.is_null() {
            return None;
        }
        let pick = |yes: &str, no: &str| Some(if value.is_truthy() { yes } else { no }.to_string());
        match self {
            Self::Flag => pick("1", "0"),
            Self::YesNo => pick("yes", "no"),
            Self::Intent => pick("ReadOnly", "ReadWrite"),
            Self::Passthrough | Self::Instance | Self::Port => value.render(),
        }
    }

    fn folds_into_server(self) -> bool {
        matches!(self, Self::Instance | Self::Port)
    }
}

/// Schema default for an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    /// No default; omitted unless configured.
    None,
    /// Boolean default.
    Bool(bool),
    /// Integer default.
    Int(i64),
    /// Text default.
    Text(&'static str),
}

impl DefaultValue {
    fn to_value(self) -> OptionValue {
        match self {
            Self::None => OptionValue::Null,
            Self::Bool(b) => OptionValue::Bool(b),
            Self::Int(i) => OptionValue::Int(i),
            Self::Text(s) => OptionValue::Text(s.to_string()),
        }
    }
}

/// One entry of a protocol's option schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionSpec {
    /// Configuration key.
    pub key: &'static str,
    /// Value used when the caller does not configure the key.
    pub default: DefaultValue,
    /// Keyword emitted in the DSN.
    pub dsn_key: &'static str,
    /// Value encoding.
    pub encoding: Encoding,
}

const fn opt(
    key: &'static str,
    default: DefaultValue,
    dsn_key: &'static str,
    encoding: Encoding,
) -> OptionSpec {
    OptionSpec {
        key,
        default,
        dsn_key,
        encoding,
    }
}

/// SQL Server option schema, in emission order.
pub const SQLSERVER_OPTIONS: &[OptionSpec] = &[
    opt("app", DefaultValue::None, "app", Encoding::Passthrough),
    opt("port", DefaultValue::Int(1433), "Port", Encoding::Port),
    opt("instance", DefaultValue::None, "Instance", Encoding::Instance),
    opt("readOnly", DefaultValue::Bool(false), "ApplicationIntent", Encoding::Intent),
    opt("database", DefaultValue::Text("master"), "Database", Encoding::Passthrough),
    opt("encrypt", DefaultValue::Bool(false), "Encrypt", Encoding::Flag),
    opt(
        "multipleActiveResultSets",
        DefaultValue::Bool(false),
        "MultipleActiveResultSets",
        Encoding::Flag,
    ),
    opt("accessToken", DefaultValue::None, "AccessToken", Encoding::Passthrough),
    opt("columnEncryption", DefaultValue::Bool(false), "ColumnEncryption", Encoding::Flag),
    opt(
        "authentication",
        DefaultValue::Text("SqlPassword"),
        "Authentication",
        Encoding::Passthrough,
    ),
    opt("connectionPooling", DefaultValue::Bool(true), "ConnectionPooling", Encoding::Flag),
    opt("connectRetryCount", DefaultValue::Int(1), "ConnectRetryCount", Encoding::Passthrough),
    opt(
        "connectRetryInterval",
        DefaultValue::Int(10),
        "ConnectRetryInterval",
        Encoding::Passthrough,
    ),
    opt("driver", DefaultValue::None, "Driver", Encoding::Passthrough),
    opt("failoverPartner", DefaultValue::None, "Failover_Partner", Encoding::Passthrough),
    opt(
        "keyStoreAuthentication",
        DefaultValue::None,
        "KeyStoreAuthentication",
        Encoding::Passthrough,
    ),
    opt(
        "keyStorePrincipalId",
        DefaultValue::None,
        "KeyStorePrincipalId",
        Encoding::Passthrough,
    ),
    opt("keyStoreSecret", DefaultValue::None, "KeyStoreSecret", Encoding::Passthrough),
    opt("language", DefaultValue::None, "Language", Encoding::Passthrough),
    opt("loginTimeout", DefaultValue::None, "LoginTimeout", Encoding::Passthrough),
    opt("multiSubnetFailover", DefaultValue::Bool(false), "MultiSubnetFailover", Encoding::YesNo),
    opt("quotedId", DefaultValue::Int(1), "QuotedId", Encoding::Passthrough),
    opt(
        "trustServerCertificate",
        DefaultValue::Bool(false),
        "TrustServerCertificate",
        Encoding::Flag,
    ),
    opt("wsid", DefaultValue::None, "wsid", Encoding::Passthrough),
];

/// The option schema and server keyword of one protocol.
#[derive(Debug, Clone, Copy)]
pub struct DsnProfile {
    /// Keyword that carries the server token.
    pub server_key: &'static str,
    /// Ordered option schema.
    pub options: &'static [OptionSpec],
}

/// SQL Server DSN profile.
pub const SQLSERVER: DsnProfile = DsnProfile {
    server_key: "Server",
    options: SQLSERVER_OPTIONS,
};

impl DsnProfile {
    /// Look up an option by configuration key.
    pub fn spec(&self, key: &str) -> Option<&'static OptionSpec> {
        self.options.iter().find(|spec| spec.key == key)
    }

    /// Resolve an option: the configured value if present (including explicit null),
    /// otherwise the schema default.
    pub fn resolve(&self, config: &ConnectionConfig, spec: &OptionSpec) -> OptionValue {
        config
            .option(spec.key)
            .cloned()
            .unwrap_or_else(|| spec.default.to_value())
    }

    /// Render the DSN for `config`.
    ///
    /// Options outside the schema are ignored.
    pub fn build(&self, config: &ConnectionConfig) -> String {
        let mut server = config.host_or_default().to_string();
        let mut body = Vec::with_capacity(self.options.len());

        // host\instance,port regardless of where either sits in the schema
        let folded = |encoding: Encoding| {
            self.options
                .iter()
                .filter(|spec| spec.encoding == encoding)
                .filter_map(|spec| spec.encoding.encode(&self.resolve(config, spec)))
                .find(|encoded| !encoded.is_empty())
        };
        if let Some(instance) = folded(Encoding::Instance) {
            server.push('\\');
            server.push_str(&instance);
        }
        if let Some(port) = folded(Encoding::Port) {
            server.push(',');
            server.push_str(&port);
        }

        for spec in self.options {
            if spec.encoding.folds_into_server() {
                continue;
            }
            let value = self.resolve(config, spec);
            if let Some(encoded) = spec.encoding.encode(&value) {
                body.push(format!("{}={}", spec.dsn_key, encoded));
            }
        }

        let dsn = if body.is_empty() {
            format!("{}={};", self.server_key, server)
        } else {
            format!("{}={};{}", self.server_key, server, body.join(";"))
        };
        debug!(options = body.len(), length = dsn.len(), "Built ODBC DSN");
        dsn
    }
}

/// Render a SQL Server DSN.
pub fn build_dsn(config: &ConnectionConfig) -> String {
    SQLSERVER.build(config)
}
