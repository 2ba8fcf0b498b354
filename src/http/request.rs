//! Inbound request model and request ids.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) unless the client sent one
//! - Capture method, path, query, headers and the bounded body
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The body is read once, under the body limit, before routing

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, Request};
use tower_http::request_id::{MakeRequestId, RequestId};

use crate::http::error::ProxyError;
use crate::security::read_body;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Issues UUID v4 request ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeGatewayRequestId;

impl MakeRequestId for MakeGatewayRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// One decoded client request, consumed once by the forwarder.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl InboundRequest {
    /// Decode an HTTP request, reading at most `max_body` body bytes.
    pub async fn from_http(request: Request<Body>, max_body: usize) -> Result<Self, ProxyError> {
        let (parts, body) = request.into_parts();
        let body = read_body(&parts.headers, body, max_body).await?;

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: parts.uri.query().map(str::to_string),
            headers: parts.headers,
            body,
        })
    }

    /// The request id assigned by the request-id layer, if any.
    pub fn request_id(&self) -> &str {
        self.headers
            .get(&X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }

    /// `path` followed by this request's query string.
    pub fn with_query(&self, path: &str) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", path, query),
            None => path.to_string(),
        }
    }
}
