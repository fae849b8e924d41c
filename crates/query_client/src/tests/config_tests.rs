use super::*;

use std::{
    collections::HashMap,
    env,
    sync::atomic::{AtomicUsize, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

fn temp_settings_path(contents: Option<&str>) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let n = NEXT_DIR.fetch_add(1, Ordering::Relaxed);
    let root = env::temp_dir().join(format!("query_console_config_test_{suffix}_{n}"));
    fs::create_dir_all(&root).expect("temp root");
    let path = root.join(SETTINGS_FILE);
    if let Some(contents) = contents {
        fs::write(&path, contents).expect("write settings");
    }
    path
}

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn missing_file_yields_defaults() {
    let path = temp_settings_path(None);
    let settings = load_settings_with(&path, env_from(&[])).expect("settings");
    assert_eq!(settings, ClientSettings::default());
    assert_eq!(settings.endpoint, "http://localhost:5000/query");
    assert_eq!(settings.success_clear_after(), Duration::from_millis(3_000));
    assert_eq!(settings.request_timeout(), None);
}

#[test]
fn file_values_overlay_defaults() {
    let path = temp_settings_path(Some(
        r#"
endpoint = "http://rag.internal:8080/query"
top_k = 5
request_timeout_ms = 15000
escape_server_errors = true
"#,
    ));
    let settings = load_settings_with(&path, env_from(&[])).expect("settings");
    assert_eq!(settings.endpoint, "http://rag.internal:8080/query");
    assert_eq!(settings.top_k, Some(5));
    assert_eq!(settings.request_timeout_ms, Some(15_000));
    assert_eq!(settings.success_clear_ms, DEFAULT_SUCCESS_CLEAR_MS);
    assert!(settings.escape_server_errors);
}

#[test]
fn env_overrides_file_and_app_prefix_wins() {
    let path = temp_settings_path(Some(r#"endpoint = "http://from-file:1/query""#));
    let settings = load_settings_with(
        &path,
        env_from(&[
            ("QUERY_ENDPOINT", "http://from-env:2/query"),
            ("APP__ENDPOINT", " https://from-app-env/query "),
            ("APP__TOP_K", "7"),
            ("APP__SUCCESS_CLEAR_MS", "1500"),
            ("APP__ESCAPE_SERVER_ERRORS", "yes"),
        ]),
    )
    .expect("settings");
    assert_eq!(settings.endpoint, "https://from-app-env/query");
    assert_eq!(settings.top_k, Some(7));
    assert_eq!(settings.success_clear_ms, 1_500);
    assert!(settings.escape_server_errors);
}

#[test]
fn rejects_unparseable_env_values() {
    let path = temp_settings_path(None);
    let err = load_settings_with(&path, env_from(&[("APP__TOP_K", "three")]))
        .expect_err("must fail");
    assert!(matches!(err, ConfigError::InvalidValue { key: "APP__TOP_K", .. }));
}

#[test]
fn rejects_malformed_settings_file() {
    let path = temp_settings_path(Some("top_k = \"many\""));
    let err = load_settings_with(&path, env_from(&[])).expect_err("must fail");
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn rejects_non_http_endpoint() {
    let path = temp_settings_path(None);
    let err = load_settings_with(&path, env_from(&[("QUERY_ENDPOINT", "ftp://host/query")]))
        .expect_err("must fail");
    assert!(err.to_string().contains("unsupported scheme 'ftp'"), "{err}");

    assert!(validate_endpoint("not a url").is_err());
    assert!(validate_endpoint("https://example.com/query").is_ok());
}

#[test]
fn command_line_overrides_take_precedence() {
    let base = ClientSettings {
        top_k: Some(3),
        ..ClientSettings::default()
    };
    let settings = base
        .clone()
        .with_overrides(SettingsOverrides {
            endpoint: Some("http://127.0.0.1:9000/query".to_string()),
            request_timeout_ms: Some(2_500),
            ..SettingsOverrides::default()
        })
        .expect("overrides");
    assert_eq!(settings.endpoint, "http://127.0.0.1:9000/query");
    assert_eq!(settings.top_k, Some(3));
    assert_eq!(settings.request_timeout_ms, Some(2_500));
    assert!(!settings.escape_server_errors);

    let err = base
        .with_overrides(SettingsOverrides {
            endpoint: Some("mailto:someone@example.com".to_string()),
            ..SettingsOverrides::default()
        })
        .expect_err("must fail");
    assert!(matches!(err, ConfigError::Endpoint(_)));
}
