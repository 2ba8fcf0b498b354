//! Request forwarding.
//!
//! # Responsibilities
//! - Answer CORS preflight without touching any upstream
//! - Route, filter, send and relay one request
//! - Translate failures into JSON error responses
//!
//! # Data Flow
//! ```text
//! InboundRequest
//!     → OPTIONS? → 200 + CORS (done)
//!     → Router (NoMatch → 404)
//!     → filter_inbound → UpstreamClient::send (Unreachable → 502, Timeout → 504)
//!     → filter_outbound + CORS → OutboundResponse
//! ```
//!
//! # Design Decisions
//! - One upstream attempt per request, no retries
//! - Upstream statuses and bodies are relayed unchanged

use std::time::Instant;

use axum::http::Method;

use crate::http::error::ProxyError;
use crate::http::request::InboundRequest;
use crate::http::response::OutboundResponse;
use crate::observability::metrics;
use crate::routing::Router;
use crate::security::{filter_inbound, CorsPolicy};
use crate::upstream::{UpstreamClient, UpstreamTable};

const NO_UPSTREAM: &str = "none";

/// Orchestrates routing, header filtering and the upstream call.
#[derive(Debug, Clone)]
pub struct Forwarder {
    router: Router,
    upstreams: UpstreamTable,
    client: UpstreamClient,
    cors: CorsPolicy,
}

impl Forwarder {
    pub fn new(router: Router, upstreams: UpstreamTable, client: UpstreamClient, cors: CorsPolicy) -> Self {
        Self {
            router,
            upstreams,
            client,
            cors,
        }
    }

    pub fn cors(&self) -> &CorsPolicy {
        &self.cors
    }

    /// Translate one inbound request into one outbound response.
    pub async fn forward(&self, inbound: InboundRequest) -> OutboundResponse {
        let started = Instant::now();
        let method = inbound.method.clone();

        if method == Method::OPTIONS {
            let response = self.preflight();
            metrics::record_request(method.as_str(), response.status.as_u16(), NO_UPSTREAM, started);
            return response;
        }

        let request_id = inbound.request_id().to_string();
        let path = inbound.path.clone();
        let (upstream, outcome) = self.dispatch(inbound).await;

        let mut response = match outcome {
            Ok(response) => response,
            Err(err) => {
                log_failure(&err, &request_id, &method, &path);
                OutboundResponse::from_error(&err)
            }
        };
        self.cors.apply(&mut response.headers);

        metrics::record_request(method.as_str(), response.status.as_u16(), upstream, started);
        response
    }

    /// Empty 200 with the preflight CORS set.
    pub fn preflight(&self) -> OutboundResponse {
        let mut response = OutboundResponse::empty();
        self.cors.apply_preflight(&mut response.headers);
        response
    }

    /// Error response for a request that never reached the forwarder.
    pub fn reject(&self, err: &ProxyError) -> OutboundResponse {
        let mut response = OutboundResponse::from_error(err);
        self.cors.apply(&mut response.headers);
        response
    }

    async fn dispatch(&self, inbound: InboundRequest) -> (&str, Result<OutboundResponse, ProxyError>) {
        let matched = match self.router.route(&inbound.method, &inbound.path) {
            Ok(matched) => matched,
            Err(err) => return (NO_UPSTREAM, Err(err.into())),
        };
        let Some(target) = self.upstreams.get(matched.upstream_id) else {
            let err = ProxyError::Internal(format!(
                "route `{}` names unknown upstream `{}`",
                matched.route, matched.upstream_id
            ));
            return (matched.upstream_id, Err(err));
        };

        let path = inbound.with_query(&matched.rewritten_path);
        let headers = filter_inbound(&inbound.headers);

        tracing::debug!(
            request_id = %inbound.request_id(),
            route = %matched.route,
            upstream = %matched.upstream_id,
            upstream_path = %matched.rewritten_path,
            "Forwarding request"
        );

        let outcome = self
            .client
            .send(target, inbound.method, &path, headers, inbound.body, target.timeout)
            .await
            .map(OutboundResponse::from_upstream)
            .map_err(ProxyError::from);
        (matched.upstream_id, outcome)
    }
}

fn log_failure(err: &ProxyError, request_id: &str, method: &Method, path: &str) {
    match err {
        ProxyError::Routing(_) => {
            tracing::debug!(request_id = %request_id, method = %method, path = %path, "No route matched")
        }
        ProxyError::Transport(_) => {
            tracing::warn!(request_id = %request_id, method = %method, path = %path, error = %err, "Upstream failure")
        }
        ProxyError::MalformedRequest(_) | ProxyError::PayloadTooLarge { .. } => {
            tracing::info!(request_id = %request_id, method = %method, path = %path, error = %err, "Rejected request")
        }
        ProxyError::Internal(_) => {
            tracing::error!(request_id = %request_id, method = %method, path = %path, error = %err, "Internal proxy error")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{presets, ClientConfig};
    use axum::http::{header, HeaderMap, StatusCode};

    fn forwarder() -> Forwarder {
        let config = presets::unified();
        Forwarder::new(
            Router::from_config(&config.routes),
            UpstreamTable::from_config(&config.upstreams).unwrap(),
            UpstreamClient::new(&ClientConfig::default()).unwrap(),
            CorsPolicy::default(),
        )
    }

    fn request(method: Method, path: &str) -> InboundRequest {
        InboundRequest {
            method,
            path: path.to_string(),
            query: None,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[tokio::test]
    async fn options_is_answered_locally_on_any_path() {
        let forwarder = forwarder();
        for path in ["/v1/chat/completions", "/nowhere", "/"] {
            let response = forwarder.forward(request(Method::OPTIONS, path)).await;
            assert_eq!(response.status, StatusCode::OK);
            assert!(response.body.is_empty());
            assert_eq!(response.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
            assert_eq!(response.headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
        }
    }

    #[tokio::test]
    async fn unknown_path_is_a_json_404_with_cors() {
        let response = forwarder().forward(request(Method::GET, "/favicon.ico")).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND);
        assert_eq!(&response.body[..], br#"{"error":"Endpoint not found"}"#);
        assert_eq!(response.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(!response.headers.contains_key(header::ACCESS_CONTROL_MAX_AGE));
    }

    #[tokio::test]
    async fn route_to_missing_upstream_is_internal() {
        let forwarder = Forwarder::new(
            Router::from_config(&presets::unified().routes),
            UpstreamTable::default(),
            UpstreamClient::new(&ClientConfig::default()).unwrap(),
            CorsPolicy::default(),
        );
        let response = forwarder.forward(request(Method::GET, "/health")).await;
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
