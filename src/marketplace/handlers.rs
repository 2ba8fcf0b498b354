//! Axum handlers for the marketplace endpoints.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{Method, Request, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::de::DeserializeOwned;

use crate::http::{InboundRequest, OutboundResponse, ProxyError};
use crate::marketplace::gateway::MarketplaceGateway;
use crate::marketplace::types::{ListingRequest, SearchRequest, TokenRequest};
use crate::observability::metrics;
use crate::routing::RoutingError;

const UPSTREAM_LABEL: &str = "marketplace";

#[derive(Clone)]
struct MarketplaceState {
    gateway: Arc<MarketplaceGateway>,
    max_body_bytes: usize,
}

/// Routes for `/ebay/...`. A known path with the wrong method is a 404.
pub fn routes(gateway: Arc<MarketplaceGateway>, max_body_bytes: usize) -> Router {
    let state = MarketplaceState {
        gateway,
        max_body_bytes,
    };

    Router::new()
        .route("/ebay/oauth/token", post(token).fallback(not_found))
        .route(
            "/ebay/buy/browse/item_summary/search",
            get(search).post(search).fallback(not_found),
        )
        .route("/ebay/sell/inventory/item", post(listing).fallback(not_found))
        .with_state(state)
}

async fn token(State(state): State<MarketplaceState>, request: Request<Body>) -> Response {
    let started = Instant::now();
    finish(&Method::POST, handle_token(&state, request).await, started)
}

async fn search(State(state): State<MarketplaceState>, request: Request<Body>) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    finish(&method, handle_search(&state, request).await, started)
}

async fn listing(State(state): State<MarketplaceState>, request: Request<Body>) -> Response {
    let started = Instant::now();
    finish(&Method::POST, handle_listing(&state, request).await, started)
}

async fn handle_token(
    state: &MarketplaceState,
    request: Request<Body>,
) -> Result<OutboundResponse, ProxyError> {
    let inbound = InboundRequest::from_http(request, state.max_body_bytes).await?;
    let body: TokenRequest = json_body(&inbound)?;
    state.gateway.request_token(&body).await
}

/// GET reads the query string, POST a JSON body.
async fn handle_search(
    state: &MarketplaceState,
    request: Request<Body>,
) -> Result<OutboundResponse, ProxyError> {
    let inbound = InboundRequest::from_http(request, state.max_body_bytes).await?;
    let body: SearchRequest = if inbound.method == Method::GET {
        query_params(&inbound)?
    } else {
        json_body(&inbound)?
    };
    state.gateway.search(&body).await
}

async fn handle_listing(
    state: &MarketplaceState,
    request: Request<Body>,
) -> Result<OutboundResponse, ProxyError> {
    let inbound = InboundRequest::from_http(request, state.max_body_bytes).await?;
    let body: ListingRequest = json_body(&inbound)?;
    Ok(state.gateway.listing(&body))
}

async fn not_found(request: Request<Body>) -> Response {
    let err = ProxyError::from(RoutingError::NoMatch {
        method: request.method().clone(),
        path: request.uri().path().to_string(),
    });
    OutboundResponse::from_error(&err).into_response()
}

fn json_body<T: DeserializeOwned>(inbound: &InboundRequest) -> Result<T, ProxyError> {
    let bytes = inbound.body.as_deref().unwrap_or_default();
    serde_json::from_slice(bytes).map_err(|e| ProxyError::MalformedRequest(e.to_string()))
}

fn query_params<T: DeserializeOwned>(inbound: &InboundRequest) -> Result<T, ProxyError> {
    let uri: Uri = inbound
        .with_query("/")
        .parse()
        .map_err(|_| ProxyError::MalformedRequest("invalid query string".into()))?;
    let Query(value) =
        Query::<T>::try_from_uri(&uri).map_err(|e| ProxyError::MalformedRequest(e.body_text()))?;
    Ok(value)
}

fn finish(method: &Method, outcome: Result<OutboundResponse, ProxyError>, started: Instant) -> Response {
    let response = outcome.unwrap_or_else(|err| {
        match &err {
            ProxyError::MalformedRequest(detail) => {
                tracing::info!(error = %detail, "Rejected marketplace request")
            }
            other => tracing::warn!(error = %other, "Marketplace request failed"),
        }
        OutboundResponse::from_error(&err)
    });
    metrics::record_request(method.as_str(), response.status.as_u16(), UPSTREAM_LABEL, started);
    response.into_response()
}
