//! Substitute payload for failed third-party feed requests.

use std::path::Path;

use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ConfigError;

const MUSIC_FEED: &str = include_str!("../fixtures/music_feed.json");

/// Payload handed back instead of a failed or rejected feed response.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FallbackFixture {
    payload: Option<Value>,
}

impl FallbackFixture {
    /// The bundled music feed slider document.
    pub fn music_feed() -> Self {
        // The bundled file is checked by `bundled_feed_parses`.
        let payload = serde_json::from_str(MUSIC_FEED).ok();
        Self { payload }
    }

    pub fn from_value(payload: Value) -> Self {
        Self {
            payload: Some(payload),
        }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_value(serde_json::from_str(&raw)?))
    }

    /// The fixture named by `fallback_path`, or the bundled feed when unset.
    pub fn for_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        match &config.fallback_path {
            Some(path) => Self::from_path(path),
            None => Ok(Self::music_feed()),
        }
    }

    pub fn disabled() -> Self {
        Self { payload: None }
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }
}
