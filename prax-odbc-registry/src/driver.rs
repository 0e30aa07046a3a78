//! Installed driver descriptions and protocol families.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Database family reached through an ODBC driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// Microsoft SQL Server.
    #[serde(alias = "mssql")]
    SqlServer,
    /// MySQL / MariaDB.
    MySql,
    /// PostgreSQL.
    #[serde(alias = "postgresql")]
    Postgres,
    /// SQLite.
    #[serde(alias = "sqlite3")]
    Sqlite,
}

impl Protocol {
    /// All protocols, in classification priority order followed by SQLite.
    pub const ALL: [Protocol; 4] = [
        Protocol::SqlServer,
        Protocol::MySql,
        Protocol::Postgres,
        Protocol::Sqlite,
    ];

    /// Get the protocol name as used in cache keys and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SqlServer => "sqlserver",
            Self::MySql => "mysql",
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Whether a working ODBC connection path exists for this protocol.
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::SqlServer)
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlserver" | "mssql" => Ok(Self::SqlServer),
            "mysql" => Ok(Self::MySql),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            other => Err(format!("unknown protocol: {}", other)),
        }
    }
}

/// A classified driver found in the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DriverEntry {
    /// Section name, e.g. `ODBC Driver 18 for SQL Server`.
    pub name: String,
    /// Remainder of the `Description=` line.
    pub description: String,
    /// Protocol family the driver speaks.
    pub protocol: Protocol,
    /// Version captured from the name (SQL Server drivers only).
    pub version: Option<String>,
}

impl DriverEntry {
    /// Create a new entry without a version.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        protocol: Protocol,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            protocol,
            version: None,
        }
    }

    /// Attach a version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Drivers grouped by protocol, in first-seen order.
pub type DriverMap = IndexMap<Protocol, Vec<DriverEntry>>;

/// Group entries by protocol.
///
/// Within a protocol a repeated name replaces the earlier entry in place.
pub fn group_by_protocol(entries: &[DriverEntry]) -> DriverMap {
    let mut map = DriverMap::new();
    for entry in entries {
        let group = map.entry(entry.protocol).or_default();
        match group.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry.clone(),
            None => group.push(entry.clone()),
        }
    }
    map
}
