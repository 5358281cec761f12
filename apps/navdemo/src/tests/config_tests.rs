use std::{
    collections::HashMap,
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

use super::*;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_start_on_sign_in() {
    let settings = Settings::default();
    assert_eq!(settings.initial_route(), Route::parse("auth/signIn"));
    assert_eq!(settings.transition_delay(), Duration::ZERO);
}

#[test]
fn file_values_override_defaults() {
    let settings = parse_settings(
        r#"
        transition_delay_ms = 25
        initial_route = "catalog/item"
        "#,
    )
    .expect("valid toml");

    assert_eq!(settings.transition_delay_ms, 25);
    assert_eq!(settings.initial_route(), Route::parse("catalog/item"));
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn custom_delimiter_applies_to_routes() {
    let settings = parse_settings("route_delimiter = \".\"").expect("valid toml");
    assert_eq!(settings.parse_route("auth.signIn.fp"), Route::from(["auth", "signIn", "fp"]));
}

#[test]
fn unknown_types_are_rejected() {
    assert!(parse_settings("transition_delay_ms = \"slow\"").is_err());
}

#[test]
fn env_overrides_file() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env_from(&[
            ("NAVDEMO__LOG_FILTER", "debug"),
            ("NAVDEMO__TRANSITION_DELAY_MS", "40"),
            ("NAVDEMO__INITIAL_ROUTE", "catalog"),
        ]),
    )
    .expect("valid env");

    assert_eq!(settings.log_filter, "debug");
    assert_eq!(settings.transition_delay_ms, 40);
    assert_eq!(settings.initial_route, "catalog");
}

#[test]
fn bad_env_values_are_errors() {
    let mut settings = Settings::default();
    assert!(apply_env(
        &mut settings,
        env_from(&[("NAVDEMO__TRANSITION_DELAY_MS", "soon")])
    )
    .is_err());
    assert!(apply_env(&mut settings, env_from(&[("NAVDEMO__ROUTE_DELIMITER", "::")])).is_err());
}

#[test]
fn explicit_config_file_is_loaded_and_required() {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = env::temp_dir().join(format!("navdemo_config_test_{suffix}"));
    fs::create_dir_all(&temp_root).expect("temp dir");
    let path = temp_root.join("navdemo.toml");
    fs::write(&path, "transition_delay_ms = 7\n").expect("write config");

    let settings = load_settings(Some(&path)).expect("load config");
    assert_eq!(settings.transition_delay_ms, 7);

    let missing = temp_root.join("missing.toml");
    assert!(load_settings(Some(&missing)).is_err());

    fs::remove_dir_all(temp_root).expect("cleanup");
}
