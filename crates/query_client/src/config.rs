use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use url::Url;

use crate::error::{ConfigError, QueryError};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:5000/query";
pub const DEFAULT_SUCCESS_CLEAR_MS: u64 = 3_000;
pub const SETTINGS_FILE: &str = "query_console.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub endpoint: String,
    pub top_k: Option<u32>,
    /// `None` waits for the transport indefinitely.
    pub request_timeout_ms: Option<u64>,
    pub success_clear_ms: u64,
    pub escape_server_errors: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            top_k: None,
            request_timeout_ms: None,
            success_clear_ms: DEFAULT_SUCCESS_CLEAR_MS,
            escape_server_errors: false,
        }
    }
}

impl ClientSettings {
    pub fn success_clear_after(&self) -> Duration {
        Duration::from_millis(self.success_clear_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn endpoint_url(&self) -> Result<Url, QueryError> {
        validate_endpoint(&self.endpoint)
    }
}

/// Command-line values layered over the loaded settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub endpoint: Option<String>,
    pub top_k: Option<u32>,
    pub request_timeout_ms: Option<u64>,
    pub escape_server_errors: bool,
}

impl ClientSettings {
    pub fn with_overrides(mut self, overrides: SettingsOverrides) -> Result<Self, ConfigError> {
        if let Some(endpoint) = overrides.endpoint {
            validate_endpoint(endpoint.trim())?;
            self.endpoint = endpoint.trim().to_string();
        }
        if overrides.top_k.is_some() {
            self.top_k = overrides.top_k;
        }
        if overrides.request_timeout_ms.is_some() {
            self.request_timeout_ms = overrides.request_timeout_ms;
        }
        if overrides.escape_server_errors {
            self.escape_server_errors = true;
        }
        Ok(self)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    endpoint: Option<String>,
    top_k: Option<u32>,
    request_timeout_ms: Option<u64>,
    success_clear_ms: Option<u64>,
    escape_server_errors: Option<bool>,
}

/// Defaults, then `query_console.toml` (or `$QUERY_CONSOLE_CONFIG`), then env.
pub fn load_settings() -> Result<ClientSettings, ConfigError> {
    let path = std::env::var("QUERY_CONSOLE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(SETTINGS_FILE));
    load_settings_with(&path, |name| std::env::var(name).ok())
}

/// A missing file is not an error; an unreadable or malformed one is.
pub fn load_settings_with(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ClientSettings, ConfigError> {
    let mut settings = ClientSettings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg: SettingsFile =
                toml::from_str(&raw).map_err(|source| ConfigError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;
            apply_file(&mut settings, file_cfg);
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    if let Some(v) = env("QUERY_ENDPOINT") {
        settings.endpoint = v;
    }
    if let Some(v) = env("APP__ENDPOINT") {
        settings.endpoint = v;
    }
    if let Some(v) = env("APP__TOP_K") {
        settings.top_k = Some(parse_env("APP__TOP_K", &v)?);
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_MS") {
        settings.request_timeout_ms = Some(parse_env("APP__REQUEST_TIMEOUT_MS", &v)?);
    }
    if let Some(v) = env("APP__SUCCESS_CLEAR_MS") {
        settings.success_clear_ms = parse_env("APP__SUCCESS_CLEAR_MS", &v)?;
    }
    if let Some(v) = env("APP__ESCAPE_SERVER_ERRORS") {
        settings.escape_server_errors = parse_bool("APP__ESCAPE_SERVER_ERRORS", &v)?;
    }

    settings.endpoint = settings.endpoint.trim().to_string();
    validate_endpoint(&settings.endpoint)?;
    Ok(settings)
}

fn apply_file(settings: &mut ClientSettings, file_cfg: SettingsFile) {
    if let Some(v) = file_cfg.endpoint {
        settings.endpoint = v;
    }
    if file_cfg.top_k.is_some() {
        settings.top_k = file_cfg.top_k;
    }
    if file_cfg.request_timeout_ms.is_some() {
        settings.request_timeout_ms = file_cfg.request_timeout_ms;
    }
    if let Some(v) = file_cfg.success_clear_ms {
        settings.success_clear_ms = v;
    }
    if let Some(v) = file_cfg.escape_server_errors {
        settings.escape_server_errors = v;
    }
}

fn parse_env<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

pub fn validate_endpoint(endpoint: &str) -> Result<Url, QueryError> {
    let invalid = |reason: String| QueryError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };
    let url = Url::parse(endpoint).map_err(|err| invalid(err.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{other}'"))),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
