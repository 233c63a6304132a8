//! Logical request description and the decoded payload type.
//!
//! # Design
//! The MAX API speaks plain JSON objects in both directions, so parameters,
//! bodies and results are all `Payload` maps rather than per-endpoint DTOs.
//! `ApiRequest` is what an endpoint method hands to the pipeline; it is
//! built fresh for each call and consumed by `MaxClient::build_request`.

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::HttpMethod;

/// A JSON object: request parameters, request bodies and decoded responses.
pub type Payload = serde_json::Map<String, Value>;

/// A caller-supplied header appended after the fixed ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraHeader {
    /// Sent as `name: value`.
    Named { name: String, value: String },
    /// An already formatted `Name: value` line.
    Raw(String),
}

/// One logical API call before URL, header and body assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Payload,
    pub body: Option<Value>,
    pub headers: Vec<ExtraHeader>,
}

impl ApiRequest {
    /// `path` is appended verbatim to the base URI and should start with `/`.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Payload::new(),
            body: None,
            headers: Vec::new(),
        }
    }

    pub fn query(mut self, params: Payload) -> Self {
        self.query = params;
        self
    }

    pub fn body(mut self, body: Payload) -> Self {
        self.body = Some(Value::Object(body));
        self
    }

    /// Use any serializable value as the body. It must serialize to a JSON
    /// object.
    pub fn json_body<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))?;
        if !value.is_object() {
            return Err(ApiError::Encode("request body must be a JSON object".to_string()));
        }
        self.body = Some(value);
        Ok(self)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push(ExtraHeader::Named {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn raw_header(mut self, line: impl Into<String>) -> Self {
        self.headers.push(ExtraHeader::Raw(line.into()));
        self
    }
}
