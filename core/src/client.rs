//! Request building, the timeout race, and envelope resolution.
//!
//! # Design
//! `RequestClient` carries no mutable state between calls. Each call is a
//! linear pipeline: build an `HttpRequest`, race the transport against the
//! timer, check the status, parse JSON, then apply the backend's envelope
//! rule. The build and resolve halves are public and free of I/O so a host
//! that performs its own round-trip can reuse the same policy.
//!
//! Failures never surface as `Err`. Depending on the backend they become a
//! notification plus `Resolved::Failed`, or a silent
//! `Resolved::Fallback` carrying the injected fixture.

use serde_json::Value;

use crate::config::ClientConfig;
use crate::envelope::{Backend, FeedStatus, PrimaryStatus, Resolved};
use crate::error::{ConfigError, RequestError};
use crate::fallback::FallbackFixture;
use crate::form::MultipartForm;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::notify::{LogNotifier, Notifier};
use crate::params::{build_url, Params};
use crate::transport::{Transport, UreqTransport};

pub struct RequestClient<T = UreqTransport, N = LogNotifier> {
    transport: T,
    notifier: N,
    config: ClientConfig,
    fallback: FallbackFixture,
}

impl RequestClient<UreqTransport, LogNotifier> {
    /// A `ureq`-backed client that logs its notifications. Loads the
    /// fixture named by `fallback_path`, if any.
    pub fn from_config(config: ClientConfig) -> Result<Self, ConfigError> {
        let fallback = FallbackFixture::for_config(&config)?;
        let transport = UreqTransport::new(config.timeout());
        Ok(Self::new(transport, LogNotifier, config).with_fallback(fallback))
    }
}

impl<T: Transport, N: Notifier> RequestClient<T, N> {
    /// Uses the bundled music feed as the fallback fixture.
    pub fn new(transport: T, notifier: N, config: ClientConfig) -> Self {
        Self {
            transport,
            notifier,
            config,
            fallback: FallbackFixture::music_feed(),
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackFixture) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Classify `url` with the configured primary base address.
    pub fn backend_for(&self, url: &str) -> Backend {
        Backend::for_url(url, &self.config.primary_base_url)
    }

    pub fn build_get(&self, url: &str, params: &Params, cookie: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: build_url(url, params),
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
                ("Cookie".to_string(), cookie.to_string()),
            ],
            body: None,
        }
    }

    /// The content type comes from the multipart encoder.
    pub fn build_post(&self, url: &str, params: &Params, cookie: &str) -> HttpRequest {
        let form = MultipartForm::from_params(params);
        HttpRequest {
            method: HttpMethod::Post,
            url: url.to_string(),
            headers: vec![
                ("Cookie".to_string(), cookie.to_string()),
                ("Content-Type".to_string(), form.content_type()),
            ],
            body: Some(form.encode()),
        }
    }

    /// Race the transport against the configured timeout. The transport
    /// future is dropped if the timer wins; a late response is discarded.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse, RequestError> {
        let timeout = self.config.timeout();
        log::debug!("{} {}", request.method.as_str(), request.url);
        match tokio::time::timeout(timeout, self.transport.send(request)).await {
            Ok(Err(RequestError::Timeout { .. })) | Err(_) => {
                Err(RequestError::Timeout { after: timeout })
            }
            Ok(result) => result,
        }
    }

    pub async fn get(&self, backend: Backend, url: &str, params: &Params, cookie: &str) -> Resolved {
        let request = self.build_get(url, params, cookie);
        let result = self.send(request).await;
        self.resolve_get(backend, result)
    }

    pub async fn post(&self, url: &str, params: &Params, cookie: &str) -> Resolved {
        let request = self.build_post(url, params, cookie);
        let result = self.send(request).await;
        self.resolve_post(result)
    }

    pub fn resolve_get(
        &self,
        backend: Backend,
        result: Result<HttpResponse, RequestError>,
    ) -> Resolved {
        let envelope = match self.decode(result) {
            Ok(envelope) => envelope,
            Err(err) => return self.fail(backend, err),
        };
        match backend {
            Backend::Primary => {
                self.surface_error_msg(&envelope);
                Resolved::Live(envelope)
            }
            Backend::Other => {
                let status = FeedStatus::of(&envelope);
                if status.is_ok() {
                    Resolved::Live(envelope)
                } else {
                    log::debug!("feed rejected with code {:?}", status.code);
                    self.substitute(RequestError::Rejected { code: status.code })
                }
            }
        }
    }

    /// POST responses always carry the primary envelope.
    pub fn resolve_post(&self, result: Result<HttpResponse, RequestError>) -> Resolved {
        match self.decode(result) {
            Ok(envelope) => {
                self.surface_error_msg(&envelope);
                Resolved::Live(envelope)
            }
            Err(err) => self.fail(Backend::Primary, err),
        }
    }

    fn decode(&self, result: Result<HttpResponse, RequestError>) -> Result<Value, RequestError> {
        let response = result?;
        if !response.is_success() {
            self.notifier.notify(&self.config.messages.server_busy);
            return Err(RequestError::HttpStatus {
                status: response.status,
            });
        }
        serde_json::from_str(&response.body).map_err(|e| RequestError::Parse(e.to_string()))
    }

    fn fail(&self, backend: Backend, err: RequestError) -> Resolved {
        log::warn!("request failed: {err}");
        match backend {
            // "server busy" was already shown for a bad status.
            Backend::Primary if matches!(err, RequestError::HttpStatus { .. }) => {
                Resolved::Failed(err)
            }
            Backend::Primary => {
                self.notifier.notify(&self.config.messages.network_unavailable);
                Resolved::Failed(err)
            }
            Backend::Other => self.substitute(err),
        }
    }

    fn substitute(&self, reason: RequestError) -> Resolved {
        match self.fallback.payload() {
            Some(payload) if self.config.fallback_enabled => Resolved::Fallback {
                payload: payload.clone(),
                reason,
            },
            _ => Resolved::Failed(reason),
        }
    }

    fn surface_error_msg(&self, envelope: &Value) {
        let status = PrimaryStatus::of(envelope);
        if status.is_ok() {
            return;
        }
        log::debug!("backend answered errorCode {:?}", status.error_code);
        if let Some(msg) = status.error_msg.as_deref().filter(|m| !m.is_empty()) {
            self.notifier.notify(msg);
        }
    }
}
