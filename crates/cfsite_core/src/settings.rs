//! Runtime configuration.
//!
//! # Responsibility
//! - Merge defaults, an optional config file and `CFSITE__*` environment
//!   variables into typed `Settings`.
//! - Validate backend and webhook sections on use.
//!
//! # Invariants
//! - Secrets stay wrapped in `SecretString` until the request that needs them.
//!
//! # Example
//! `CFSITE__BACKEND__URL=https://xyz.example.co CFSITE__BACKEND__ANON_KEY=... cfsite stats`

use crate::client::rest::RestConfig;
use crate::logging::default_log_level;
use config::{Config, ConfigError, Environment, File};
use reqwest::Url;
use secrecy::SecretString;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "CFSITE";
const DEFAULT_SQLITE_PATH: &str = "cfsite.sqlite3";

/// Which query backend the site talks to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted PostgREST-compatible backend.
    #[default]
    Rest,
    /// Local SQLite file.
    Sqlite,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendSettings {
    #[serde(default)]
    pub kind: BackendKind,
    pub url: Option<String>,
    pub anon_key: Option<SecretString>,
    pub sqlite_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    /// Absolute directory for rolling log files. Logging is off when unset.
    pub dir: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WebhookSettings {
    pub endpoint: Option<String>,
    pub secret: Option<SecretString>,
}

/// Top-level configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub backend: BackendSettings,
    pub logging: LoggingSettings,
    #[serde(default)]
    pub webhook: WebhookSettings,
}

/// Missing or malformed configuration values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    MissingValue(&'static str),
    InvalidUrl {
        field: &'static str,
        value: String,
        message: String,
    },
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingValue(field) => write!(f, "missing configuration value `{field}`"),
            Self::InvalidUrl {
                field,
                value,
                message,
            } => write!(f, "invalid url `{value}` for `{field}`: {message}"),
        }
    }
}

impl Error for SettingsError {}

impl Settings {
    /// Loads settings from defaults, `config_file` (when given) and environment.
    ///
    /// # Errors
    /// Returns an error when a source cannot be read or deserialized.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("backend.kind", "rest")?
            .set_default("backend.sqlite_path", DEFAULT_SQLITE_PATH)?
            .set_default("logging.level", default_log_level())?;

        if let Some(path) = config_file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()
    }

    /// Hosted backend connection settings.
    pub fn rest_config(&self) -> Result<RestConfig, SettingsError> {
        let url = self
            .backend
            .url
            .as_deref()
            .ok_or(SettingsError::MissingValue("backend.url"))?;
        let anon_key = self
            .backend
            .anon_key
            .clone()
            .ok_or(SettingsError::MissingValue("backend.anon_key"))?;

        Ok(RestConfig::new(parse_url("backend.url", url)?, anon_key))
    }

    /// Local backend database path.
    pub fn sqlite_path(&self) -> PathBuf {
        self.backend
            .sqlite_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SQLITE_PATH))
    }

    /// Webhook endpoint and shared secret.
    pub fn webhook_target(&self) -> Result<(Url, SecretString), SettingsError> {
        let endpoint = self
            .webhook
            .endpoint
            .as_deref()
            .ok_or(SettingsError::MissingValue("webhook.endpoint"))?;
        let secret = self
            .webhook
            .secret
            .clone()
            .ok_or(SettingsError::MissingValue("webhook.secret"))?;

        Ok((parse_url("webhook.endpoint", endpoint)?, secret))
    }
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, SettingsError> {
    Url::parse(value.trim()).map_err(|err| SettingsError::InvalidUrl {
        field,
        value: value.to_string(),
        message: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::{BackendKind, Settings, SettingsError};
    use std::io::Write;

    fn load_from_toml(contents: &str) -> Settings {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        Settings::load(Some(file.path())).unwrap()
    }

    #[test]
    fn file_values_override_defaults() {
        let settings = load_from_toml(
            r#"
            [backend]
            kind = "sqlite"
            sqlite_path = "/tmp/site.sqlite3"

            [logging]
            level = "warn"
            "#,
        );

        assert_eq!(settings.backend.kind, BackendKind::Sqlite);
        assert_eq!(
            settings.sqlite_path(),
            std::path::PathBuf::from("/tmp/site.sqlite3")
        );
        assert_eq!(settings.logging.level, "warn");
        assert!(settings.logging.dir.is_none());
    }

    #[test]
    fn rest_config_requires_url_and_key() {
        let settings = load_from_toml(
            r#"
            [backend]
            kind = "rest"
            url = "https://project.example.co"
            "#,
        );
        assert_eq!(
            settings.rest_config().unwrap_err(),
            SettingsError::MissingValue("backend.anon_key")
        );

        let settings = load_from_toml(
            r#"
            [backend]
            url = "not a url"
            anon_key = "anon"
            "#,
        );
        assert!(matches!(
            settings.rest_config(),
            Err(SettingsError::InvalidUrl { field: "backend.url", .. })
        ));
    }

    #[test]
    fn webhook_target_parses_endpoint() {
        let settings = load_from_toml(
            r#"
            [webhook]
            endpoint = "https://hooks.example.co/inquiry"
            secret = "shh"
            "#,
        );
        let (endpoint, _secret) = settings.webhook_target().unwrap();
        assert_eq!(endpoint.path(), "/inquiry");
    }

    #[test]
    fn malformed_webhook_endpoint_is_a_settings_error() {
        let settings = load_from_toml(
            r#"
            [webhook]
            endpoint = "hooks.example.co/inquiry"
            secret = "shh"
            "#,
        );
        match settings.webhook_target() {
            Err(SettingsError::InvalidUrl { field, value, .. }) => {
                assert_eq!(field, "webhook.endpoint");
                assert_eq!(value, "hooks.example.co/inquiry");
            }
            other => panic!("expected invalid url, got {:?}", other.map(|(url, _)| url)),
        }
    }
}
