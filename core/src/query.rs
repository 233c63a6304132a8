//! Percent-encoding for query strings and path segments.
//!
//! Query parameters follow the form-building rules the MAX API expects:
//! nested arrays and objects flatten into bracketed keys (`ids[0]=1`), `null`
//! values are dropped and booleans become `1`/`0`. Everything outside the
//! RFC 3986 unreserved set is escaped.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use crate::types::Payload;

const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Encode `params` into a query string without the leading `?`.
///
/// Returns an empty string when nothing survives encoding, e.g. an empty map
/// or a map of `null`s.
pub fn encode_query(params: &Payload) -> String {
    let mut pairs = Vec::new();
    for (key, value) in params {
        flatten(key.clone(), value, &mut pairs);
    }
    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", escape(key), escape(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Escape a single path segment, `/` included.
pub fn encode_segment(segment: &str) -> String {
    escape(segment)
}

fn escape(raw: &str) -> String {
    utf8_percent_encode(raw, UNRESERVED).to_string()
}

fn flatten(key: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => out.push((key, if *flag { "1" } else { "0" }.to_string())),
        Value::Number(n) => out.push((key, n.to_string())),
        Value::String(s) => out.push((key, s.clone())),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten(format!("{key}[{index}]"), item, out);
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                flatten(format!("{key}[{sub}]"), item, out);
            }
        }
    }
}
