// tests/config_test.rs
use std::collections::HashMap;
use std::fs;
use std::io::Write;

use serial_test::serial;
use tempfile::{NamedTempFile, TempDir};
use xchelper::config::{find_config, load_config, Config, CONFIG_ENV, LOCAL_CONFIG_FILE};
use xchelper::XcHelperError;

#[test]
fn test_load_default_config() {
    let config = load_config(None).unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.git.remote, "origin");
    assert_eq!(config.tools.swift, "swift");
    assert_eq!(config.tools.docker, "docker");
    assert_eq!(config.tools.tar, "tar");
    assert_eq!(config.tools.aws, "aws");
}

#[test]
fn test_load_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let toml_content = r#"
[defaults]
DOCKER_BUILD_IMAGE_NAME = "swift:5.10"
UPLOAD_ARCHIVE_S3_REGION = "eu-west-1"

[git]
remote = "upstream"

[tools]
docker = "podman"
"#;
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = load_config(Some(temp_file.path())).unwrap();
    assert_eq!(config.default_for("DOCKER_BUILD_IMAGE_NAME"), Some("swift:5.10"));
    assert_eq!(config.default_for("UPLOAD_ARCHIVE_S3_REGION"), Some("eu-west-1"));
    assert_eq!(config.git.remote, "upstream");
    assert_eq!(config.tools.docker, "podman");
    assert_eq!(config.tools.swift, "swift");
}

#[test]
fn test_invalid_toml_is_config_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[git\nremote = ").unwrap();
    temp_file.flush().unwrap();

    let err = load_config(Some(temp_file.path())).unwrap_err();
    assert!(matches!(err, XcHelperError::Config(_)));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_missing_explicit_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
    assert!(err.to_string().contains("Cannot read"));
}

#[test]
fn test_env_path_wins_over_local_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(LOCAL_CONFIG_FILE), "").unwrap();
    let explicit = dir.path().join("ci.toml");

    let mut env = HashMap::new();
    env.insert(CONFIG_ENV.to_string(), explicit.display().to_string());

    assert_eq!(find_config(&env, dir.path()), Some(explicit));
}

#[test]
fn test_empty_env_path_is_ignored() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(LOCAL_CONFIG_FILE), "").unwrap();

    let mut env = HashMap::new();
    env.insert(CONFIG_ENV.to_string(), String::new());

    assert_eq!(
        find_config(&env, dir.path()),
        Some(dir.path().join(LOCAL_CONFIG_FILE))
    );
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn test_user_config_dir_fallback() {
    let config_home = TempDir::new().unwrap();
    let cwd = TempDir::new().unwrap();
    let user_file = config_home.path().join(format!(".{}", LOCAL_CONFIG_FILE));
    fs::write(&user_file, "[git]\nremote = \"fork\"\n").unwrap();

    let previous = std::env::var_os("XDG_CONFIG_HOME");
    std::env::set_var("XDG_CONFIG_HOME", config_home.path());
    let found = find_config(&HashMap::new(), cwd.path());
    match previous {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }

    assert_eq!(found, Some(user_file.clone()));
    assert_eq!(load_config(found.as_deref()).unwrap().git.remote, "fork");
}
