//! Integration tests for connection configuration.
//!
//! These tests verify that TOML files and the builder produce the same DSNs and
//! that option handling matches the SQL Server option schema.

use std::io::Write;

use pretty_assertions::assert_eq;
use prax_odbc::driver::{
    Authentication, KeyStoreAuthentication, OptionValue, QuotedId, build_dsn,
};
use prax_odbc::registry::MapEnvSource;
use prax_odbc::ConnectionConfig;

/// Test that a TOML file and the builder agree
#[test]
fn test_file_matches_builder() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        host = "db1"
        port = 1500
        app = "billing"
        readOnly = true
        database = "ledger"
        authentication = "ActiveDirectoryPassword"
        multiSubnetFailover = true
        quotedId = 0
        wsid = "ws-01"
        "#
    )
    .unwrap();

    let from_file = ConnectionConfig::from_file(file.path()).unwrap();
    let built = ConnectionConfig::builder()
        .host("db1")
        .port(1500)
        .app("billing")
        .read_only(true)
        .database("ledger")
        .authentication(Authentication::ActiveDirectoryPassword)
        .multi_subnet_failover(true)
        .quoted_id(QuotedId::Legacy)
        .wsid("ws-01")
        .build();

    assert_eq!(build_dsn(&from_file), build_dsn(&built));
    assert_eq!(
        build_dsn(&built),
        "Server=db1,1500;app=billing;ApplicationIntent=ReadOnly;Database=ledger;Encrypt=0;\
         MultipleActiveResultSets=0;ColumnEncryption=0;Authentication=ActiveDirectoryPassword;\
         ConnectionPooling=1;ConnectRetryCount=1;ConnectRetryInterval=10;\
         MultiSubnetFailover=yes;QuotedId=0;TrustServerCertificate=0;wsid=ws-01"
    );
}

/// Test the Always Encrypted key store options
#[test]
fn test_key_store_options() {
    let config = ConnectionConfig::builder()
        .column_encryption(true)
        .key_store_authentication(KeyStoreAuthentication::KeyVaultClientSecret)
        .key_store_principal_id("principal")
        .key_store_secret("vault-secret")
        .build();

    let dsn = build_dsn(&config);
    assert!(dsn.contains(
        "ColumnEncryption=1;Authentication=SqlPassword;ConnectionPooling=1;\
         ConnectRetryCount=1;ConnectRetryInterval=10;\
         KeyStoreAuthentication=KeyVaultClientSecret;KeyStorePrincipalId=principal;\
         KeyStoreSecret=vault-secret;"
    ));
}

/// Test secrets pulled from the environment
#[test]
fn test_env_expansion_in_file_contents() {
    let env = MapEnvSource::new()
        .set("ODBC_HOST", "prod-db")
        .set("ODBC_TOKEN", "tok123");
    let config = ConnectionConfig::from_str_with_env(
        r#"
        host = "${ODBC_HOST}"
        accessToken = "${ODBC_TOKEN}"
        "#,
        &env,
    )
    .unwrap();

    let dsn = build_dsn(&config);
    assert!(dsn.starts_with("Server=prod-db,1433;"));
    assert!(dsn.contains(";AccessToken=tok123;"));
}

/// Test that explicitly unset options drop their defaults
#[test]
fn test_unset_defaults() {
    let config = ConnectionConfig::builder()
        .unset("port")
        .unset("database")
        .unset("authentication")
        .unset("quotedId")
        .unset("encrypt")
        .unset("readOnly")
        .unset("multiSubnetFailover")
        .build();

    let dsn = build_dsn(&config);
    assert!(dsn.starts_with("Server=localhost;"));
    assert!(!dsn.contains("Database="));
    assert!(!dsn.contains("Authentication="));
    assert!(!dsn.contains("QuotedId="));
    assert!(!dsn.contains("Encrypt="));
    assert!(!dsn.contains("ApplicationIntent="));
    assert!(!dsn.contains("MultiSubnetFailover="));
}

/// Test post-connect hooks parsed from TOML
#[test]
fn test_hooks_from_toml() {
    let config = ConnectionConfig::from_str(
        r#"
        init = "SET XACT_ABORT ON"

        [settings]
        DATEFORMAT = "ymd"
        LOCK_TIMEOUT = 1000

        [attributes]
        autocommit = false
        "#,
    )
    .unwrap();

    assert_eq!(config.init, vec!["SET XACT_ABORT ON".to_string()]);
    assert_eq!(
        config.settings.get("LOCK_TIMEOUT"),
        Some(&OptionValue::Int(1000))
    );
    assert_eq!(
        config.attributes.get("autocommit"),
        Some(&OptionValue::Bool(false))
    );
    assert!(config.options.is_empty());
}
