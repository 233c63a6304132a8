//! Error type for the MAX API client.
//!
//! # Design
//! Every failure the client can report surfaces as one `ApiError`. Variants
//! separate the failure classes (encoding, transport, decoding, server-side
//! rejection) while the accessors give callers a uniform view: a message, a
//! numeric code and the decoded error payload.

use std::sync::OnceLock;

use crate::types::Payload;

/// Errors returned by `MaxClient`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The outbound request could not be encoded (body, query or headers).
    ///
    /// Also raised for a raw header line without a `:` separator, before
    /// anything is dispatched.
    #[error("unable to encode request: {0}")]
    Encode(String),

    /// The transport failed before a status code was received.
    #[error("transport error: {message}")]
    Transport { message: String, code: i64 },

    /// No custom transport was configured and the crate was built without
    /// the default one.
    #[error("no HTTP transport: enable `ureq-transport` or configure a custom transport")]
    TransportUnavailable,

    /// The response body is not the JSON the client expected.
    #[error("unable to decode response: {0}")]
    Decode(String),

    /// The server answered with a status of 400 or above.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        payload: Payload,
    },

    /// The client configuration was rejected at construction.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse classification of an `ApiError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    EncodeFailure,
    TransportFailure,
    TransportUnavailable,
    DecodeFailure,
    Api,
    InvalidConfig,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::EncodeFailure => "encode-failure",
            ErrorKind::TransportFailure => "transport-failure",
            ErrorKind::TransportUnavailable => "transport-unavailable",
            ErrorKind::DecodeFailure => "decode-failure",
            ErrorKind::Api => "api-error",
            ErrorKind::InvalidConfig => "invalid-config",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Encode(_) => ErrorKind::EncodeFailure,
            ApiError::Transport { .. } => ErrorKind::TransportFailure,
            ApiError::TransportUnavailable => ErrorKind::TransportUnavailable,
            ApiError::Decode(_) => ErrorKind::DecodeFailure,
            ApiError::Api { .. } => ErrorKind::Api,
            ApiError::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    /// HTTP status for server errors, the transport's code for transport
    /// failures, 0 otherwise.
    pub fn code(&self) -> i64 {
        match self {
            ApiError::Api { status, .. } => i64::from(*status),
            ApiError::Transport { code, .. } => *code,
            _ => 0,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Decoded error body sent by the server; empty for every other variant.
    pub fn payload(&self) -> &Payload {
        static EMPTY: OnceLock<Payload> = OnceLock::new();
        match self {
            ApiError::Api { payload, .. } => payload,
            _ => EMPTY.get_or_init(Payload::new),
        }
    }
}
