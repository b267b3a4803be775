//! Client configuration.
//!
//! Loaded from JSON. Every field has a default, so `{}` is a valid document.
//! `apply_env` layers `WANFETCH_*` overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_PRIMARY_BASE_URL: &str = "https://www.wanandroid.com/";

pub const ENV_TIMEOUT_MS: &str = "WANFETCH_TIMEOUT_MS";
pub const ENV_PRIMARY_BASE_URL: &str = "WANFETCH_PRIMARY_BASE_URL";

/// User-facing notification texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub server_busy: String,
    pub network_unavailable: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            server_busy: "Server is busy, please try again later.".to_string(),
            network_unavailable: "Network unavailable, please check your network settings."
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// How long the transport may take before the call resolves as timed out.
    pub timeout_ms: u64,
    /// URLs starting with this are served by the primary backend.
    pub primary_base_url: String,
    pub messages: Messages,
    /// When false, non-primary failures resolve as `Failed` instead of the
    /// fallback fixture.
    pub fallback_enabled: bool,
    /// JSON document to substitute instead of the bundled music feed.
    pub fallback_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            primary_base_url: DEFAULT_PRIMARY_BASE_URL.to_string(),
            messages: Messages::default(),
            fallback_enabled: true,
            fallback_path: None,
        }
    }
}

impl ClientConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Apply overrides from `lookup` (normally `std::env::var`).
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            self.timeout_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_TIMEOUT_MS.to_string(),
                value: raw.clone(),
            })?;
        }
        if let Some(url) = lookup(ENV_PRIMARY_BASE_URL) {
            self.primary_base_url = url;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_ms".to_string(),
                value: "0".to_string(),
            });
        }
        if self.primary_base_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "primary_base_url".to_string(),
                value: String::new(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ClientConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.fallback_enabled);
        assert!(config.fallback_path.is_none());
    }

    #[test]
    fn fallback_switches_parse() {
        let config = ClientConfig::from_json_str(
            r#"{"fallback_enabled": false, "fallback_path": "/srv/feed.json"}"#,
        )
        .unwrap();
        assert!(!config.fallback_enabled);
        assert_eq!(config.fallback_path, Some(PathBuf::from("/srv/feed.json")));
    }

    #[test]
    fn partial_messages_keep_other_defaults() {
        let config = ClientConfig::from_json_str(
            r#"{"timeout_ms": 2500, "messages": {"server_busy": "busy"}}"#,
        )
        .unwrap();
        assert_eq!(config.timeout_ms, 2500);
        assert_eq!(config.messages.server_busy, "busy");
        assert_eq!(
            config.messages.network_unavailable,
            Messages::default().network_unavailable
        );
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ClientConfig::from_json_str(r#"{"timeout_ms": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let err = ClientConfig::from_json_str("{timeout_ms").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn env_overrides_apply() {
        let config = ClientConfig::default()
            .apply_env(|key| match key {
                ENV_TIMEOUT_MS => Some("250".to_string()),
                ENV_PRIMARY_BASE_URL => Some("http://127.0.0.1:3000/".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.timeout(), Duration::from_millis(250));
        assert_eq!(config.primary_base_url, "http://127.0.0.1:3000/");
    }

    #[test]
    fn bad_env_timeout_is_rejected() {
        let err = ClientConfig::default()
            .apply_env(|key| (key == ENV_TIMEOUT_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == ENV_TIMEOUT_MS));
    }

    #[test]
    fn env_overrides_leave_unset_keys_alone() {
        let config = ClientConfig::default()
            .apply_env(|key| (key == ENV_TIMEOUT_MS).then(|| " 1500 ".to_string()))
            .unwrap();
        assert_eq!(config.timeout_ms, 1500);
        assert_eq!(config.primary_base_url, DEFAULT_PRIMARY_BASE_URL);
    }

    #[test]
    fn process_env_is_read() {
        // Both keys are absent from the test environment.
        if std::env::var_os(ENV_TIMEOUT_MS).is_none()
            && std::env::var_os(ENV_PRIMARY_BASE_URL).is_none()
        {
            assert_eq!(
                ClientConfig::default().with_env_overrides().unwrap(),
                ClientConfig::default()
            );
        }
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ClientConfig::from_path("/nonexistent/wanfetch.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/wanfetch.json"));
    }
}
