//! Request pipeline for the MAX API.
//!
//! # Design
//! Every endpoint method funnels into `MaxClient::execute`, which is split
//! into `build_request` (URL, headers and body assembly) and
//! `parse_response` (status classification and JSON decoding) around a
//! single transport call. Both halves are public so a host that does its
//! own I/O can drive the round-trip itself.
//!
//! `MaxClient` holds only its immutable configuration behind an `Arc`, so
//! clones are cheap and concurrent calls share nothing mutable.

use std::sync::Arc;

use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::query::encode_query;
use crate::transport;
use crate::types::{ApiRequest, ExtraHeader, Payload};

/// Message used when an error response carries no `message` field.
pub const FALLBACK_ERROR_MESSAGE: &str = "MAX API error";

const JSON: &str = "application/json";

/// Synchronous client for the MAX platform API.
#[derive(Debug, Clone)]
pub struct MaxClient {
    config: Arc<ClientConfig>,
}

impl MaxClient {
    /// Client with default settings for `access_token`.
    pub fn new(access_token: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_config(ClientConfig::new(access_token))
    }

    pub fn with_config(config: ClientConfig) -> Result<Self, ApiError> {
        let config = ClientConfig {
            base_uri: config.base_uri.trim_end_matches('/').to_string(),
            ..config
        };
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run one API call end to end.
    ///
    /// Returns `Ok(None)` only when the server answered with a JSON `null`;
    /// an empty body yields an empty map.
    pub fn execute(&self, request: &ApiRequest) -> Result<Option<Payload>, ApiError> {
        let http_request = self.build_request(request)?;
        let span = tracing::debug_span!(
            "max_api_request",
            method = %http_request.method,
            url = %http_request.url
        );
        let _guard = span.enter();

        tracing::debug!("dispatching request");
        let response = self.dispatch(&http_request)?;
        tracing::debug!(status = response.status, "received response");

        self.parse_response(response)
    }

    /// Assemble the HTTP request for `request` without sending it.
    pub fn build_request(&self, request: &ApiRequest) -> Result<HttpRequest, ApiError> {
        let mut url = format!("{}{}", self.config.base_uri, request.path);
        let query = encode_query(&request.query);
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query);
        }

        let body = request
            .body
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| ApiError::Encode(e.to_string()))?;

        let headers = self.compile_headers(&request.headers, body.is_some())?;

        Ok(HttpRequest {
            method: request.method,
            url,
            headers,
            body,
        })
    }

    /// Classify and decode a raw transport result.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Option<Payload>, ApiError> {
        if response.status >= 400 {
            let err = error_from_response(response);
            tracing::warn!(status = err.code(), message = %err, "API returned an error");
            return Err(err);
        }
        decode_body(&response.body)
    }

    /// Like `execute`, but a JSON `null` result is a decode failure.
    pub(crate) fn execute_object(&self, request: &ApiRequest) -> Result<Payload, ApiError> {
        self.execute(request)?
            .ok_or_else(|| ApiError::Decode("expected a JSON object, got null".to_string()))
    }

    fn compile_headers(
        &self,
        extra: &[ExtraHeader],
        has_body: bool,
    ) -> Result<Vec<(String, String)>, ApiError> {
        let mut headers = vec![
            ("Authorization".to_string(), self.config.access_token.clone()),
            ("Accept".to_string(), JSON.to_string()),
            ("User-Agent".to_string(), self.config.user_agent.clone()),
        ];
        if has_body {
            headers.push(("Content-Type".to_string(), JSON.to_string()));
        }

        for header in extra {
            match header {
                ExtraHeader::Named { name, value } => headers.push((name.clone(), value.clone())),
                ExtraHeader::Raw(line) => {
                    let (name, value) = line.split_once(':').ok_or_else(|| {
                        ApiError::Encode(format!("malformed header line: {line:?}"))
                    })?;
                    headers.push((name.trim().to_string(), value.trim().to_string()));
                }
            }
        }
        Ok(headers)
    }

    fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        match &self.config.transport {
            Some(custom) => custom.dispatch(request),
            None => {
                let fallback = transport::default_transport(self.config.timeout);
                transport::dispatch_with(fallback.as_deref(), request)
            }
        }
    }
}

/// Build the `Api` error for a response with status >= 400.
///
/// Undecodable or non-object bodies still produce an `Api` error, just with
/// an empty payload and the fallback message.
fn error_from_response(response: HttpResponse) -> ApiError {
    let payload = match serde_json::from_str::<Value>(response.body.trim()) {
        Ok(Value::Object(map)) => map,
        _ => Payload::new(),
    };
    let message = match payload.get("message") {
        Some(Value::String(message)) => message.clone(),
        Some(Value::Null) | None => FALLBACK_ERROR_MESSAGE.to_string(),
        Some(other) => other.to_string(),
    };
    ApiError::Api {
        status: response.status,
        message,
        payload,
    }
}

fn decode_body(raw: &str) -> Result<Option<Payload>, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Some(Payload::new()));
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(Value::Null) => Ok(None),
        Ok(other) => Err(ApiError::Decode(format!(
            "expected a JSON object, got {}",
            json_type(&other)
        ))),
        Err(e) => Err(ApiError::Decode(e.to_string())),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
