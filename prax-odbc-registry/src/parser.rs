//! Parser for `odbcinst.ini` driver inventories.
//!
//! Only sections whose header is immediately followed by a `Description=` line are
//! recognized. Anything else in the file is ignored, so this is deliberately not a
//! general INI parser.

use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::{debug, trace};

use crate::driver::{DriverEntry, Protocol};

static SECTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)\[(?P<name>.*)\]\r?\nDescription=(?P<description>.*)")
        .expect("driver section pattern is valid")
});

static SQLSERVER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(SQL\sNative\sClient|ODBC\sDriver\s(?P<version>[.0-9]+)\sfor\sSQL\sServer)")
        .expect("sql server driver pattern is valid")
});

/// Classify a driver name into a protocol family.
///
/// Patterns are tried in priority order: SQL Server, then MySQL, then PostgreSQL.
/// Returns the protocol and, for versioned SQL Server drivers, the captured version.
/// Unrecognized names yield `None`.
pub fn classify(name: &str) -> Option<(Protocol, Option<String>)> {
    if let Some(caps) = SQLSERVER_PATTERN.captures(name) {
        let version = caps
            .name("version")
            .map(|m| m.as_str())
            .filter(|v| !v.is_empty())
            .map(String::from);
        return Some((Protocol::SqlServer, version));
    }

    let lowered = name.to_lowercase();
    if lowered.contains("mysql") {
        Some((Protocol::MySql, None))
    } else if lowered.contains("postgresql") {
        Some((Protocol::Postgres, None))
    } else {
        None
    }
}

/// Parse the contents of a driver inventory into classified entries.
///
/// Entries keep file order. Unclassified drivers are dropped.
pub fn parse(contents: &str) -> Vec<DriverEntry> {
    let mut drivers = Vec::new();

    for caps in SECTION_PATTERN.captures_iter(contents) {
        let name = &caps["name"];
        let description = caps["description"].trim_end_matches('\r');

        let Some((protocol, version)) = classify(name) else {
            trace!(driver = %name, "Skipping unclassified ODBC driver");
            continue;
        };

        drivers.push(DriverEntry {
            name: name.to_string(),
            description: description.to_string(),
            protocol,
            version,
        });
    }

    debug!(count = drivers.len(), "Parsed ODBC driver inventory");
    drivers
}
