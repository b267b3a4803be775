//! Error types for the request client.
//!
//! # Design
//! `RequestError` names every way a call can fail to produce a usable
//! envelope. It never escapes `RequestClient::get`/`post` as an `Err`; it is
//! carried inside `Resolved` so callers can still tell the failure kinds
//! apart. `ConfigError` covers loading configuration and fallback fixtures.

use std::time::Duration;

use thiserror::Error;

/// Why a call did not yield a live envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The timer won the race against the transport.
    #[error("request timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    /// The server answered with a non-2xx status.
    #[error("server answered HTTP {status}")]
    HttpStatus { status: u16 },

    /// The body was not valid JSON.
    #[error("malformed response body: {0}")]
    Parse(String),

    /// Transport-level failure (DNS, connect, TLS, reset).
    #[error("network failure: {0}")]
    Network(String),

    /// A VariantB envelope carried a non-zero (or missing) `code`.
    #[error("backend rejected the request with code {code:?}")]
    Rejected { code: Option<i64> },

    /// Request parameters were not a flat mapping of primitives.
    #[error("invalid request parameters: {0}")]
    InvalidParams(String),
}

/// Errors raised while loading configuration or fixtures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
