//! Configuration loading and root folder resolution
//!
//! Tests that touch CCRM_ROOT_FOLDER or CCRM_CONFIG are marked #[serial] so
//! they never race each other on the process environment.

use ccrm_common::config::{
    load_toml_config, CompiledDefaults, DuplicatePolicy, RootFolderInitializer,
    RootFolderResolver, TomlConfig, CONFIG_FILE_ENV, MAX_DELAY_DAYS, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();
    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert!(defaults.root_folder.ends_with("ccrm") || defaults.root_folder.ends_with("ccrm_data"));
    assert_eq!(defaults.log_level, "info");
}

#[test]
fn test_default_config_values() {
    let config = TomlConfig::default();
    assert_eq!(config.server.port, 5780);
    assert_eq!(config.store.project_id, "ccrm");
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.file.is_none());
    assert_eq!(config.duplicates, DuplicatePolicy::default());
    assert_eq!(config.scheduling.max_tasks, 50);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_toml_keeps_defaults() {
    let config = TomlConfig::from_toml_str(
        r#"
        root_folder = "/srv/ccrm"

        [server]
        port = 9000

        [duplicates]
        match_phones = false
        "#,
    )
    .unwrap();

    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/ccrm")));
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "127.0.0.1");
    assert!(!config.duplicates.match_phones);
    assert!(config.duplicates.match_name_location);
    assert_eq!(config.scheduling.contacted_delay_days, 3);
}

#[test]
fn test_invalid_values_rejected() {
    assert!(TomlConfig::from_toml_str("[server]\nport = 0").is_err());
    assert!(TomlConfig::from_toml_str("[store]\nproject_id = \"../etc\"").is_err());
    assert!(TomlConfig::from_toml_str("[logging]\nlevel = \"loud\"").is_err());
    assert!(TomlConfig::from_toml_str("[scheduling]\nmax_tasks = 0").is_err());
    assert!(TomlConfig::from_toml_str("[scheduling]\ncallback_delay_days = -1").is_err());
    assert!(TomlConfig::from_toml_str("not toml at all [").is_err());
}

#[test]
fn test_oversized_scheduling_delays_rejected() {
    assert!(TomlConfig::from_toml_str("[scheduling]\ncontacted_delay_days = 1000000000").is_err());
    assert!(TomlConfig::from_toml_str("[scheduling]\nnew_delay_hours = 9000000000").is_err());
    assert!(TomlConfig::from_toml_str("[scheduling]\nnotify_within_hours = 87601").is_err());

    let at_limit = format!("[scheduling]\ninterested_delay_days = {}", MAX_DELAY_DAYS);
    assert!(TomlConfig::from_toml_str(&at_limit).is_ok());
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root_folder = RootFolderResolver::new("test-module").resolve();
    assert_eq!(root_folder, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
#[serial]
fn test_resolver_priority_order() {
    let mut config = TomlConfig::default();
    config.root_folder = Some(PathBuf::from("/tmp/ccrm-from-toml"));

    env::remove_var(ROOT_FOLDER_ENV);
    let from_toml = RootFolderResolver::new("test-module").with_config(&config).resolve();
    assert_eq!(from_toml, PathBuf::from("/tmp/ccrm-from-toml"));

    env::set_var(ROOT_FOLDER_ENV, "/tmp/ccrm-from-env");
    let from_env = RootFolderResolver::new("test-module").with_config(&config).resolve();
    assert_eq!(from_env, PathBuf::from("/tmp/ccrm-from-env"));

    let from_cli = RootFolderResolver::new("test-module")
        .with_config(&config)
        .with_cli_arg(Some(PathBuf::from("/tmp/ccrm-from-cli")))
        .resolve();
    assert_eq!(from_cli, PathBuf::from("/tmp/ccrm-from-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_load_explicit_config_file() {
    env::remove_var(CONFIG_FILE_ENV);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[store]\nproject_id = \"staging\"\n").unwrap();

    let config = load_toml_config(Some(&path)).unwrap();
    assert_eq!(config.store.project_id, "staging");
}

#[test]
#[serial]
fn test_missing_explicit_config_file_is_error() {
    env::remove_var(CONFIG_FILE_ENV);
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(load_toml_config(Some(&missing)).is_err());
}

#[test]
#[serial]
fn test_config_file_from_env() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("env.toml");
    std::fs::write(&path, "[server]\nport = 6001\n").unwrap();

    env::set_var(CONFIG_FILE_ENV, &path);
    let config = load_toml_config(None).unwrap();
    env::remove_var(CONFIG_FILE_ENV);

    assert_eq!(config.server.port, 6001);
}

#[test]
fn test_initializer_creates_directory_and_names_database() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested").join("root");
    let initializer = RootFolderInitializer::new(root.clone());

    initializer.ensure_directory_exists().unwrap();
    assert!(root.is_dir());
    // Second call is a no-op
    initializer.ensure_directory_exists().unwrap();

    assert_eq!(initializer.database_path("crm-prod"), root.join("crm-prod.db"));
}
