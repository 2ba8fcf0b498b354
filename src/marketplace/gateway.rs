//! Typed calls to the marketplace API.
//!
//! # Responsibilities
//! - Exchange client credentials for an application token
//! - Run item searches with the fixed query parameters
//! - Wrap non-2xx marketplace replies in a JSON error envelope
//!
//! # Design Decisions
//! - Credentials travel as HTTP Basic auth and never appear in logs
//! - The sandbox/production choice is per request

use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde_json::json;
use url::Url;

use crate::config::MarketplaceConfig;
use crate::http::{OutboundResponse, ProxyError};
use crate::marketplace::types::{ListingRequest, ListingResponse, SearchRequest, TokenRequest};
use crate::upstream::target::join_url;
use crate::upstream::{RawResponse, UpstreamClient, UpstreamRequest};

const TOKEN_PATH: &str = "/identity/v1/oauth2/token";
const SEARCH_PATH: &str = "/buy/browse/v1/item_summary/search";
const MARKETPLACE_ID: HeaderName = HeaderName::from_static("x-ebay-c-marketplace-id");

/// Error building the gateway from config.
#[derive(Debug, thiserror::Error)]
pub enum MarketplaceError {
    #[error("marketplace {field}: invalid URL `{url}`: {source}")]
    InvalidUrl {
        field: &'static str,
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("marketplace id `{0}` is not a valid header value")]
    InvalidMarketplaceId(String),
}

/// Marketplace API gateway.
#[derive(Debug, Clone)]
pub struct MarketplaceGateway {
    client: UpstreamClient,
    sandbox_url: Url,
    production_url: Url,
    timeout: Duration,
    marketplace_id: HeaderValue,
    oauth_scope: String,
    search_limit: u32,
    search_filter: String,
    search_sort: String,
}

impl MarketplaceGateway {
    pub fn new(config: &MarketplaceConfig, client: UpstreamClient) -> Result<Self, MarketplaceError> {
        let parse = |field: &'static str, raw: &str| {
            Url::parse(raw).map_err(|source| MarketplaceError::InvalidUrl {
                field,
                url: raw.to_string(),
                source,
            })
        };

        Ok(Self {
            client,
            sandbox_url: parse("sandbox_url", &config.sandbox_url)?,
            production_url: parse("production_url", &config.production_url)?,
            timeout: Duration::from_millis(config.timeout_ms),
            marketplace_id: HeaderValue::from_str(&config.marketplace_id)
                .map_err(|_| MarketplaceError::InvalidMarketplaceId(config.marketplace_id.clone()))?,
            oauth_scope: config.oauth_scope.clone(),
            search_limit: config.search_limit,
            search_filter: config.search_filter.clone(),
            search_sort: config.search_sort.clone(),
        })
    }

    fn base(&self, sandbox: bool) -> &Url {
        if sandbox {
            &self.sandbox_url
        } else {
            &self.production_url
        }
    }

    pub fn token_url(&self, sandbox: bool) -> Result<Url, ProxyError> {
        join_url(self.base(sandbox), TOKEN_PATH).map_err(|e| ProxyError::Internal(e.to_string()))
    }

    /// Search URL carrying the query and the fixed paging, filter and sort.
    pub fn search_url(&self, sandbox: bool, query: &str) -> Result<Url, ProxyError> {
        let mut url = join_url(self.base(sandbox), SEARCH_PATH)
            .map_err(|e| ProxyError::Internal(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("limit", &self.search_limit.to_string())
            .append_pair("filter", &self.search_filter)
            .append_pair("sort", &self.search_sort);
        Ok(url)
    }

    /// Client-credentials grant.
    pub async fn request_token(&self, request: &TokenRequest) -> Result<OutboundResponse, ProxyError> {
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", "client_credentials")
            .append_pair("scope", &self.oauth_scope)
            .finish();

        let mut upstream = UpstreamRequest::new(Method::POST, self.token_url(request.sandbox.0)?, self.timeout);
        upstream.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        upstream.basic_auth = Some((request.client_id.clone(), request.client_secret.clone()));
        upstream.body = Some(form.into());

        tracing::debug!(sandbox = request.sandbox.0, "Requesting marketplace token");
        let raw = self.client.execute(upstream).await?;
        Ok(relay(raw))
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<OutboundResponse, ProxyError> {
        let mut upstream = UpstreamRequest::new(
            Method::GET,
            self.search_url(request.sandbox.0, &request.q)?,
            self.timeout,
        );
        let bearer = HeaderValue::from_str(&format!("Bearer {}", request.access_token))
            .map_err(|_| ProxyError::MalformedRequest("access_token is not a valid token".into()))?;
        upstream.headers.insert(header::AUTHORIZATION, bearer);
        upstream.headers.insert(MARKETPLACE_ID, self.marketplace_id.clone());

        tracing::debug!(sandbox = request.sandbox.0, query = %request.q, "Searching marketplace");
        let raw = self.client.execute(upstream).await?;
        Ok(relay(raw))
    }

    /// Listing is not offered yet; answered locally.
    pub fn listing(&self, request: &ListingRequest) -> OutboundResponse {
        let body = ListingResponse {
            success: false,
            message: "Listing functionality coming soon!".to_string(),
            sandbox: request.sandbox.0,
        };
        OutboundResponse::json(StatusCode::OK, &json!(body))
    }
}

/// 2xx replies pass through as JSON; anything else is wrapped.
fn relay(raw: RawResponse) -> OutboundResponse {
    if raw.status.is_success() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        return OutboundResponse {
            status: raw.status,
            headers,
            body: raw.body,
        };
    }

    tracing::info!(status = raw.status.as_u16(), "Marketplace returned an error");
    OutboundResponse::json(
        raw.status,
        &json!({
            "error": format!("eBay API error: {}", raw.status.as_u16()),
            "details": String::from_utf8_lossy(&raw.body),
        }),
    )
}
