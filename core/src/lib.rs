//! HTTP request helper for the reader app's UI layer.
//!
//! # Overview
//! Issues GET (query-encoded) and POST (multipart) calls with a timeout race,
//! then normalizes the two backend envelope shapes into a `Resolved` value.
//! Failures are turned into user notifications and, for third-party feeds,
//! a fallback payload.
//!
//! # Design
//! - `RequestClient` is stateless between calls; it holds only its
//!   transport, notifier, configuration, and fallback fixture.
//! - Each operation is split into `build_*` (produces a request) and
//!   `resolve_*` (consumes a response), so the I/O boundary is explicit and
//!   hosts that do their own networking can reuse the policy.
//! - `Transport` and `Notifier` are the two seams to the outside world.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod fallback;
pub mod form;
pub mod http;
pub mod notify;
pub mod params;
pub mod transport;

pub use client::RequestClient;
pub use config::{ClientConfig, Messages};
pub use envelope::{Backend, Resolved};
pub use error::{ConfigError, RequestError};
pub use fallback::FallbackFixture;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use notify::{LogNotifier, Notifier};
pub use params::{build_url, ParamValue, Params};
pub use transport::{Transport, UreqTransport};
