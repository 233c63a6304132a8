//! Pluggable HTTP transport.
//!
//! # Design
//! The pipeline never talks to the network directly: it hands an assembled
//! `HttpRequest` to a `Transport` and gets an `HttpResponse` back. Any
//! `Fn(&HttpRequest) -> Result<HttpResponse, ApiError>` closure is a
//! transport, so tests and alternate HTTP stacks plug in without wrappers.
//!
//! `UreqTransport` is the default when the `ureq-transport` feature is on.
//! It builds a fresh agent per call, so nothing is pooled or shared between
//! requests. Status codes are returned as data; only failures to complete
//! the exchange become `ApiError::Transport`. Response bodies are read in
//! full whatever their size, and a body that is not UTF-8 is a decode
//! failure.

use std::sync::Mutex;
use std::time::Duration;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Performs exactly one HTTP exchange.
///
/// Implementations must be safe to call concurrently from several threads.
pub trait Transport: Send + Sync {
    fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

impl<F> Transport for F
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, ApiError> + Send + Sync,
{
    fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self(request)
    }
}

/// Test double that answers every request with the same canned response
/// and records what it was asked to send.
#[derive(Debug)]
pub struct StubTransport {
    response: HttpResponse,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            response: HttpResponse::new(status, body),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request dispatched so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests().pop()
    }
}

impl Transport for StubTransport {
    fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());
        Ok(self.response.clone())
    }
}

/// Blocking transport backed by `ureq`.
///
/// A zero timeout disables the deadline.
#[cfg(feature = "ureq-transport")]
#[derive(Debug, Clone)]
pub struct UreqTransport {
    timeout: Duration,
}

#[cfg(feature = "ureq-transport")]
impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn agent(&self) -> ureq::Agent {
        ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global((!self.timeout.is_zero()).then_some(self.timeout))
            .build()
            .new_agent()
    }
}

#[cfg(feature = "ureq-transport")]
impl Transport for UreqTransport {
    fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        use crate::http::HttpMethod;

        let agent = self.agent();
        let url = request.url.as_str();
        let headers = request.headers.as_slice();
        let body = request.body.as_deref().map(str::as_bytes);

        let result = match (request.method, body) {
            (HttpMethod::Get, None) => with_headers(agent.get(url), headers).call(),
            (HttpMethod::Get, Some(body)) => {
                with_headers(agent.get(url).force_send_body(), headers).send(body)
            }
            (HttpMethod::Delete, None) => with_headers(agent.delete(url), headers).call(),
            (HttpMethod::Delete, Some(body)) => {
                with_headers(agent.delete(url).force_send_body(), headers).send(body)
            }
            (HttpMethod::Post, Some(body)) => with_headers(agent.post(url), headers).send(body),
            (HttpMethod::Post, None) => with_headers(agent.post(url), headers).send_empty(),
            (HttpMethod::Put, Some(body)) => with_headers(agent.put(url), headers).send(body),
            (HttpMethod::Put, None) => with_headers(agent.put(url), headers).send_empty(),
            (HttpMethod::Patch, Some(body)) => with_headers(agent.patch(url), headers).send(body),
            (HttpMethod::Patch, None) => with_headers(agent.patch(url), headers).send_empty(),
        };

        let mut response = result.map_err(transport_error)?;
        let status = response.status().as_u16();
        let bytes = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(transport_error)?;
        let body = String::from_utf8(bytes)
            .map_err(|err| ApiError::Decode(format!("response body is not UTF-8: {err}")))?;

        Ok(HttpResponse { status, body })
    }
}

#[cfg(feature = "ureq-transport")]
fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

#[cfg(feature = "ureq-transport")]
fn transport_error(err: ureq::Error) -> ApiError {
    let code = match &err {
        ureq::Error::Io(io) => io.raw_os_error().map(i64::from).unwrap_or(0),
        _ => 0,
    };
    ApiError::Transport {
        message: err.to_string(),
        code,
    }
}

/// The built-in transport, if this build has one.
#[cfg(feature = "ureq-transport")]
pub(crate) fn default_transport(timeout: Duration) -> Option<Box<dyn Transport>> {
    Some(Box::new(UreqTransport::new(timeout)))
}

#[cfg(not(feature = "ureq-transport"))]
pub(crate) fn default_transport(_timeout: Duration) -> Option<Box<dyn Transport>> {
    None
}

/// Dispatch through `transport`, failing with `TransportUnavailable` when
/// there is none.
pub(crate) fn dispatch_with(
    transport: Option<&dyn Transport>,
    request: &HttpRequest,
) -> Result<HttpResponse, ApiError> {
    match transport {
        Some(transport) => transport.dispatch(request),
        None => Err(ApiError::TransportUnavailable),
    }
}
