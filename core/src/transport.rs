//! The network seam.
//!
//! # Design
//! `Transport` is the only place I/O happens. The client races whatever
//! future `send` returns against its timer and drops it if the timer wins,
//! so async transports are cancelled outright. `UreqTransport` runs a
//! blocking `ureq` agent on tokio's blocking pool; a dropped blocking task
//! keeps running, so the agent carries the same global timeout to release
//! its thread.

use std::future::Future;
use std::time::Duration;

use crate::error::RequestError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, RequestError>> + Send;
}

/// Blocking `ureq` agent driven from `spawn_blocking`.
///
/// Non-2xx statuses are returned as data rather than `Err`, leaving status
/// interpretation to the client.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn send(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, RequestError>> + Send {
        let agent = self.agent.clone();
        async move {
            tokio::task::spawn_blocking(move || execute(&agent, request))
                .await
                .map_err(|e| RequestError::Network(format!("transport task failed: {e}")))?
        }
    }
}

fn execute(agent: &ureq::Agent, request: HttpRequest) -> Result<HttpResponse, RequestError> {
    let result = match request.method {
        HttpMethod::Get => {
            let mut builder = agent.get(request.url.as_str());
            for (k, v) in &request.headers {
                builder = builder.header(k.as_str(), v.as_str());
            }
            builder.call()
        }
        HttpMethod::Post => {
            let mut builder = agent.post(request.url.as_str());
            for (k, v) in &request.headers {
                builder = builder.header(k.as_str(), v.as_str());
            }
            match request.body {
                Some(body) => builder.send(body.as_bytes()),
                None => builder.send_empty(),
            }
        }
    };
    let mut response = result.map_err(map_ureq_error)?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(k, v)| Some((k.as_str().to_string(), v.to_str().ok()?.to_string())))
        .collect();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(map_ureq_error)?;

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

fn map_ureq_error(err: ureq::Error) -> RequestError {
    match err {
        // The client substitutes its own deadline.
        ureq::Error::Timeout(_) => RequestError::Timeout {
            after: Duration::ZERO,
        },
        other => RequestError::Network(other.to_string()),
    }
}
