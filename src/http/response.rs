//! Outbound response model.
//!
//! # Responsibilities
//! - Carry the upstream status, headers and body to the client
//! - Build JSON error and preflight responses
//!
//! # Design Decisions
//! - Upstream status and body are relayed unchanged
//! - Hop-by-hop headers are stripped before CORS headers are added

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::http::error::ProxyError;
use crate::security::filter_outbound;
use crate::upstream::RawResponse;

/// A response ready to be written to the client.
#[derive(Debug, Clone)]
pub struct OutboundResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl OutboundResponse {
    /// Relay an upstream reply with its hop-by-hop headers removed.
    pub fn from_upstream(raw: RawResponse) -> Self {
        Self {
            status: raw.status,
            headers: filter_outbound(&raw.headers),
            body: raw.body,
        }
    }

    /// A JSON body with `status`.
    pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            status,
            headers,
            body: Bytes::from(value.to_string()),
        }
    }

    pub fn from_error(err: &ProxyError) -> Self {
        Self::json(err.status(), &err.body())
    }

    /// An empty 200, as sent for CORS preflight.
    pub fn empty() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

impl IntoResponse for OutboundResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
