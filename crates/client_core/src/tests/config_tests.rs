use super::*;

use std::{
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

fn temp_config_path(tag: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    env::temp_dir().join(format!("comet_client_{tag}_{suffix}.toml"))
}

#[test]
fn defaults_validate() {
    let settings = ClientSettings::default();
    settings.validate().expect("defaults are valid");
    assert_eq!(settings.status_interval(), Duration::from_millis(500));
    assert_eq!(settings.running_color, StatusColor::Green);
}

#[test]
fn missing_default_file_falls_back_to_defaults() {
    let settings =
        load_settings_with_env_prefix(None, "COMET_TEST_UNSET_PREFIX").expect("load defaults");
    assert_eq!(settings, ClientSettings::default());
}

#[test]
fn explicit_file_overrides_defaults() {
    let path = temp_config_path("file");
    fs::write(
        &path,
        "server_url = \"http://lab-pc:9000\"\nstatus_interval_ms = 250\nrunning_color = \"red\"\nengage_password = \"hephy\"\n",
    )
    .expect("write config");

    let settings = load_settings_with_env_prefix(Some(&path), "COMET_TEST_FILE_PREFIX")
        .expect("load from file");
    fs::remove_file(&path).expect("cleanup");

    assert_eq!(settings.server_url, "http://lab-pc:9000");
    assert_eq!(settings.status_interval_ms, 250);
    assert_eq!(settings.resource_interval_ms, 5_000);
    assert_eq!(settings.running_color, StatusColor::Red);
    assert_eq!(settings.engage_password.as_deref(), Some("hephy"));
}

#[test]
fn missing_explicit_file_is_an_error() {
    let path = temp_config_path("missing");
    assert!(load_settings_with_env_prefix(Some(&path), "COMET_TEST_MISSING_PREFIX").is_err());
}

#[test]
fn environment_overrides_file() {
    let path = temp_config_path("env");
    fs::write(&path, "status_interval_ms = 250\n").expect("write config");
    env::set_var("COMET_TEST_ENV_PREFIX__STATUS_INTERVAL_MS", "100");

    let settings =
        load_settings_with_env_prefix(Some(&path), "COMET_TEST_ENV_PREFIX").expect("load");
    env::remove_var("COMET_TEST_ENV_PREFIX__STATUS_INTERVAL_MS");
    fs::remove_file(&path).expect("cleanup");

    assert_eq!(settings.status_interval_ms, 100);
}

#[test]
fn zero_interval_is_rejected() {
    let path = temp_config_path("zero");
    fs::write(&path, "resource_interval_ms = 0\n").expect("write config");

    let err = load_settings_with_env_prefix(Some(&path), "COMET_TEST_ZERO_PREFIX")
        .expect_err("zero interval must fail");
    fs::remove_file(&path).expect("cleanup");

    assert!(err.to_string().contains("resource_interval_ms"));
}
