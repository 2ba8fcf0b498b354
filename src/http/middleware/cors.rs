//! CORS middleware.
//! Short-circuits preflight and stamps the CORS set on every other response.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::response::OutboundResponse;
use crate::observability::metrics;
use crate::security::CorsPolicy;

pub async fn cors_middleware(
    State(cors): State<CorsPolicy>,
    req: Request<Body>,
    next: Next,
) -> Response {
    // preflight never reaches a handler or an upstream
    if req.method() == Method::OPTIONS {
        let started = Instant::now();
        let mut response = OutboundResponse::empty();
        cors.apply_preflight(&mut response.headers);
        metrics::record_request(Method::OPTIONS.as_str(), 200, "none", started);
        return response.into_response();
    }

    let mut response = next.run(req).await;
    cors.apply(response.headers_mut());
    response
}
