//! Integration tests for driver discovery.
//!
//! These tests read inventory files from disk and exercise the cached views the
//! way a connecting driver does.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use prax_odbc::registry::{
    CacheStore, EnvInventory, FileInventory, InventorySource, MapEnvSource, MemoryStore,
    NoopStore, RegistryResult,
};
use prax_odbc::{DriverRegistry, Protocol};

const INVENTORY: &str = "\
[ODBC Drivers]
ODBC Driver 18 for SQL Server=Installed

[ODBC Driver 18 for SQL Server]
Description=Microsoft ODBC Driver 18 for SQL Server
Driver=/opt/microsoft/msodbcsql18/lib64/libmsodbcsql-18.3.so.2.1
UsageCount=1

[SQL Native Client]
Description=Legacy SQL Server client
Driver=/usr/lib/libsqlncli.so

[MySQL ODBC 8.0 Unicode Driver]
Description=MySQL Connector/ODBC
Driver=/usr/lib/x86_64-linux-gnu/odbc/libmyodbc8w.so

[PostgreSQL Unicode]
Description=PostgreSQL ODBC driver (Unicode version)
Driver=psqlodbcw.so

[Generic Text Driver]
Description=Reads CSV files
";

fn inventory_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create inventory file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write inventory file");
    file
}

fn file_registry(file: &tempfile::NamedTempFile) -> DriverRegistry {
    DriverRegistry::with_parts(FileInventory::new(file.path()), Arc::new(MemoryStore::new()))
}

/// Test classification across a realistic inventory
#[test]
fn test_inventory_from_disk() {
    let file = inventory_file(INVENTORY);
    let registry = file_registry(&file);

    let map = registry.driver_map(false).unwrap();
    let names = |protocol: Protocol| -> Vec<String> {
        map.get(&protocol)
            .map(|group| group.iter().map(|d| d.name.clone()).collect())
            .unwrap_or_default()
    };

    assert_eq!(
        names(Protocol::SqlServer),
        vec!["ODBC Driver 18 for SQL Server", "SQL Native Client"]
    );
    assert_eq!(names(Protocol::MySql), vec!["MySQL ODBC 8.0 Unicode Driver"]);
    assert_eq!(names(Protocol::Postgres), vec!["PostgreSQL Unicode"]);
    assert!(names(Protocol::Sqlite).is_empty());

    let sqlserver = &map[&Protocol::SqlServer];
    assert_eq!(sqlserver[0].version.as_deref(), Some("18"));
    assert_eq!(sqlserver[1].version, None);
}

/// Test that unrecognized drivers never surface
#[test]
fn test_unrecognized_drivers_hidden() {
    let file = inventory_file(INVENTORY);
    let registry = file_registry(&file);

    assert!(
        !registry
            .driver_exists("Generic Text Driver", None, false)
            .unwrap()
    );
    assert!(
        !registry
            .driver_names(false)
            .unwrap()
            .iter()
            .any(|name| name == "ODBC Drivers")
    );
}

/// Test inventory path resolution through the environment
#[test]
fn test_env_inventory_path() {
    let file = inventory_file(INVENTORY);
    let env = MapEnvSource::new().set("ODBCSYSINSTINI", file.path().display().to_string());
    let registry = DriverRegistry::with_parts(
        EnvInventory::with_env(env),
        Arc::new(MemoryStore::new()),
    );

    assert_eq!(
        registry.default_sqlserver_driver().unwrap(),
        "ODBC Driver 18 for SQL Server"
    );
}

/// Test configuration errors for bad inventory paths
#[test]
fn test_bad_inventory_paths() {
    let empty = MapEnvSource::new().set("ODBCSYSINSTINI", "");
    let registry =
        DriverRegistry::with_parts(EnvInventory::with_env(empty), Arc::new(MemoryStore::new()));
    let err = registry.all_drivers(false).unwrap_err();
    assert!(err.is_configuration());

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("odbcinst.ini");
    let registry =
        DriverRegistry::with_parts(FileInventory::new(&missing), Arc::new(MemoryStore::new()));
    let err = registry.default_sqlserver_driver().unwrap_err();
    assert!(err.is_configuration());
    assert!(!err.is_missing_driver());
}

/// Test that the cache is transparent and avoids re-reading the file
#[test]
fn test_cache_transparency_and_reuse() {
    struct Counting {
        inner: FileInventory,
        loads: Arc<AtomicUsize>,
    }

    impl InventorySource for Counting {
        fn load(&self) -> RegistryResult<String> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            self.inner.load()
        }
    }

    let file = inventory_file(INVENTORY);
    let loads = Arc::new(AtomicUsize::new(0));
    let store = Arc::new(MemoryStore::new());
    let cached = DriverRegistry::with_parts(
        Counting {
            inner: FileInventory::new(file.path()),
            loads: Arc::clone(&loads),
        },
        store.clone(),
    );
    let uncached = DriverRegistry::with_parts(FileInventory::new(file.path()), Arc::new(NoopStore));

    for protocol in Protocol::ALL {
        assert_eq!(
            cached.names_for_protocol(protocol, false).unwrap(),
            uncached.names_for_protocol(protocol, false).unwrap()
        );
    }
    cached.driver_names(false).unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 1);

    cached.names_for_protocol(Protocol::SqlServer, true).unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 2);

    let stats = store.stats();
    assert!(stats.hits > 0);
    assert!(stats.misses > 0);
    assert!(store.contains(&prax_odbc::registry::CacheKey::protocol(Protocol::Postgres)));
}

/// Test that a changed inventory is only seen after invalidation
#[test]
fn test_invalidate_all_picks_up_changes() {
    let file = inventory_file(INVENTORY);
    let registry = file_registry(&file);
    assert_eq!(registry.sqlserver_drivers().unwrap().len(), 2);

    std::fs::write(
        file.path(),
        "[ODBC Driver 17 for SQL Server]\nDescription=Microsoft ODBC Driver 17\n",
    )
    .unwrap();
    assert_eq!(registry.sqlserver_drivers().unwrap().len(), 2);

    registry.invalidate_all();
    assert_eq!(
        *registry.sqlserver_drivers().unwrap(),
        vec!["ODBC Driver 17 for SQL Server".to_string()]
    );
    assert!(registry.mysql_drivers().unwrap().is_empty());
}
