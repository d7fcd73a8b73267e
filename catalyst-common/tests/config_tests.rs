//! Configuration loading and root folder resolution tests
//!
//! Tests touching CATALYST_ROOT_FOLDER are #[serial] so they never race on the
//! process environment.

use catalyst_common::config::{
    load_toml_config, read_toml_config, CompiledDefaults, RootFolderInitializer,
    RootFolderResolver, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root_folder = RootFolderResolver::new("test-module").resolve();

    assert_eq!(root_folder, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
#[serial]
fn test_resolver_cli_beats_env_and_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/catalyst-env");

    let root_folder = RootFolderResolver::new("test-module")
        .with_cli_arg(Some(PathBuf::from("/tmp/catalyst-cli")))
        .with_toml_root(Some(PathBuf::from("/tmp/catalyst-toml")))
        .resolve();

    assert_eq!(root_folder, PathBuf::from("/tmp/catalyst-cli"));
    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/catalyst-env");

    let root_folder = RootFolderResolver::new("test-module")
        .with_toml_root(Some(PathBuf::from("/tmp/catalyst-toml")))
        .resolve();

    assert_eq!(root_folder, PathBuf::from("/tmp/catalyst-env"));
    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_resolver_falls_back_to_toml() {
    env::remove_var(ROOT_FOLDER_ENV);

    let root_folder = RootFolderResolver::new("test-module")
        .with_toml_root(Some(PathBuf::from("/tmp/catalyst-toml")))
        .resolve();

    assert_eq!(root_folder, PathBuf::from("/tmp/catalyst-toml"));
}

#[test]
fn test_initializer_creates_directory() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("nested").join("root");

    let initializer = RootFolderInitializer::new(root.clone());
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join("catalyst.db"));
}

#[test]
fn test_load_toml_config_from_file() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        root_folder = "/srv/catalyst"
        port = 7001

        [logging]
        level = "debug"

        [notes]
        parent_page_id = "abc123"

        [timeouts]
        workflow_secs = 60
        "#,
    )
    .unwrap();

    let config = load_toml_config(Some(&path));

    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/catalyst")));
    assert_eq!(config.port, Some(7001));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.notes.parent_page_id.as_deref(), Some("abc123"));
    assert_eq!(config.timeouts.workflow_secs, 60);
    assert_eq!(config.timeouts.transcription_secs, 120);
}

#[test]
fn test_malformed_toml_degrades_to_defaults() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "port = \"not a number\"").unwrap();

    assert!(read_toml_config(&path).is_err());

    let config = load_toml_config(Some(&path));
    assert!(config.port.is_none());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_missing_explicit_file_degrades_to_defaults() {
    let config = load_toml_config(Some(std::path::Path::new("/nonexistent/catalyst.toml")));
    assert!(config.root_folder.is_none());
}
