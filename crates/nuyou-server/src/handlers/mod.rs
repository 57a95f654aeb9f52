//! HTTP request handlers.

pub(crate) mod contact;
pub(crate) mod content;
pub(crate) mod session;
pub(crate) mod upload;

use axum::http::HeaderMap;
use serde::Serialize;

/// Header carrying the CSRF token for script-driven requests.
pub(crate) const CSRF_HEADER: &str = "x-csrf-token";

/// Body of a successful mutation.
#[derive(Debug, Serialize)]
pub(crate) struct Ack {
    success: bool,
    message: String,
}

impl Ack {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// CSRF token from the request header, if present and valid UTF-8.
pub(crate) fn header_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok())
}
