//! Synchronous client for the MAX messaging platform API.
//!
//! # Overview
//! Every endpoint method on `MaxClient` describes one HTTP call and hands it
//! to a single request pipeline, which assembles the URL, headers and JSON
//! body, dispatches through a pluggable `Transport`, classifies the status
//! code and decodes the JSON response into a `Payload` map.
//!
//! # Design
//! - `MaxClient` holds only immutable configuration; it is cheap to clone
//!   and safe to share between threads.
//! - The transport is a trait. Closures implement it, `StubTransport` is a
//!   recording test double and `UreqTransport` (feature `ureq-transport`,
//!   on by default) talks to the network.
//! - `build_request` / `parse_response` expose both halves of the pipeline
//!   for hosts that perform the I/O themselves.
//! - All failures surface as one `ApiError`.

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod query;
pub mod transport;
pub mod types;

pub use client::{MaxClient, FALLBACK_ERROR_MESSAGE};
pub use config::{ClientConfig, DEFAULT_BASE_URI, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
pub use error::{ApiError, ErrorKind};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{StubTransport, Transport};
#[cfg(feature = "ureq-transport")]
pub use transport::UreqTransport;
pub use types::{ApiRequest, ExtraHeader, Payload};
