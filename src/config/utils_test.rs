use crate::config::{StorageConfig, constants::LOG_FILE_PATH};

use super::*;

#[test]
fn test_load_configuration() {
    let config = load_configuration("./testdata/config.toml").expect("failed to load config");

    assert_eq!(config.general.verbose, true);

    let log = &config.log;
    assert_eq!(log.level.as_deref(), Some("debug"));
    let log_filters = log.filters.as_deref().unwrap_or_default();
    assert_eq!(log_filters.len(), 1);
    assert_eq!(log_filters[0].module.as_deref(), Some("storage"));
    assert_eq!(log_filters[0].level.as_deref(), Some("trace"));

    let log_file = &log.file;
    assert_eq!(log_file.path, "/var/logs/convodesk.log");
    assert_eq!(log_file.append, true);

    let storage = &config.storage;
    match storage {
        StorageConfig::Sqlite(sqlite) => {
            assert_eq!(
                sqlite.path.as_deref(),
                Some("/var/lib/convodesk/conversations.db")
            );
        }
    }
}

#[test]
fn test_load_configuration_with_some_default_fields() {
    let config =
        load_configuration("./testdata/config_with_default.toml").expect("failed to load config");

    assert_eq!(config.general.verbose, false);

    let log = &config.log;
    assert_eq!(log.level.as_deref(), Some("info"));
    assert_eq!(log.file.path, LOG_FILE_PATH);
    assert_eq!(log.file.append, false);

    match &config.storage {
        StorageConfig::Sqlite(sqlite) => assert_eq!(sqlite.path, None),
    }
}

#[test]
fn test_resolve_path() {
    let ret = resolve_path("$CONVODESK_TEST_PATH/${CONVODESK_USER_PATH}/config.toml")
        .expect("failed to resolve path");
    assert_eq!(ret, "//config.toml");

    let dir = "/tmp/test";
    let user_path = "user_path";
    unsafe {
        std::env::set_var("CONVODESK_TEST_PATH", dir);
        std::env::set_var("CONVODESK_USER_PATH", user_path);
    }
    let ret = resolve_path("$CONVODESK_TEST_PATH/${CONVODESK_USER_PATH}/config.toml")
        .expect("failed to resolve path");
    assert_eq!(ret, format!("{dir}/{user_path}/config.toml"));
}

#[test]
fn test_basename() {
    assert_eq!(basename("/var/log/convodesk.log"), "convodesk.log");
    assert_eq!(basename("convodesk.log"), "convodesk.log");
}
