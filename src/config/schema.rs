//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::config::presets;

/// Root configuration for the gateway.
///
/// The default value is the unified preset: inference, marketplace and
/// control upstreams behind one TLS listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, TLS, body limit).
    pub listener: ListenerConfig,

    /// Upstream services requests can be forwarded to.
    pub upstreams: Vec<UpstreamConfig>,

    /// Route definitions mapping path prefixes to upstreams.
    pub routes: Vec<RouteConfig>,

    /// CORS headers attached to every response.
    pub cors: CorsConfig,

    /// Outbound HTTP client settings.
    pub client: ClientConfig,

    /// Typed marketplace gateway endpoints.
    pub marketplace: MarketplaceConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        presets::unified()
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8443").
    pub bind_address: String,

    /// Optional TLS configuration. When absent the listener speaks plain HTTP.
    pub tls: Option<TlsConfig>,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: format!("0.0.0.0:{}", presets::TLS_PORT),
            tls: None,
            max_body_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// TLS configuration for the listener.
///
/// An empty `[listener.tls]` table enables TLS with `server.crt`/`server.key`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: "server.crt".to_string(),
            key_path: "server.key".to_string(),
        }
    }
}

/// An upstream HTTP service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Unique upstream identifier referenced by routes.
    pub name: String,

    /// Base URL, including an optional path root (e.g., "http://localhost:8080").
    pub base_url: String,

    /// Per-request budget for the whole upstream exchange, in milliseconds.
    #[serde(default = "default_upstream_timeout_ms")]
    pub timeout_ms: u64,

    /// Alternate base URL selected by a request header.
    #[serde(default)]
    pub alternate: Option<AlternateBaseConfig>,
}

/// Header-selected alternate base URL.
///
/// The primary `base_url` is used when the header is absent or equals
/// `primary_value` (case-insensitive); any other value selects `base_url`
/// from this section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlternateBaseConfig {
    /// Request header inspected (e.g., "X-eBay-Sandbox").
    pub header: String,

    /// Header value that keeps the primary base URL.
    #[serde(default = "default_primary_value")]
    pub primary_value: String,

    /// Base URL used for every other header value.
    pub base_url: String,
}

pub(crate) fn default_upstream_timeout_ms() -> u64 {
    30_000
}

fn default_primary_value() -> String {
    "true".to_string()
}

/// Route configuration mapping a path prefix to an upstream.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Path prefix to match (case-sensitive, must start with '/').
    pub path_prefix: String,

    /// Upstream name to forward to.
    pub upstream: String,

    /// Replacement for the matched prefix. `None` forwards the path unchanged.
    #[serde(default)]
    pub rewrite: Option<String>,

    /// Methods this route accepts. Empty means every method.
    #[serde(default)]
    pub methods: Vec<String>,
}

/// CORS header set attached to responses.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Value of `Access-Control-Allow-Origin`.
    pub allow_origin: String,

    /// Methods listed in `Access-Control-Allow-Methods`.
    pub allow_methods: Vec<String>,

    /// Headers listed in `Access-Control-Allow-Headers`.
    pub allow_headers: Vec<String>,

    /// `Access-Control-Max-Age` sent on preflight responses, in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .into_iter()
                .map(String::from)
                .collect(),
            allow_headers: [
                "Content-Type",
                "Authorization",
                "X-eBay-API-AppID",
                "X-eBay-API-Token",
                "X-eBay-Sandbox",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            max_age_secs: 86_400,
        }
    }
}

/// Outbound HTTP client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Hard cap on concurrent in-flight upstream calls.
    pub max_in_flight: usize,

    /// TCP/TLS connect timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Honor HTTP(S)_PROXY environment variables for upstream calls.
    pub system_proxy: bool,

    /// Largest upstream response body relayed, in bytes.
    pub max_response_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 256,
            connect_timeout_ms: 5_000,
            system_proxy: false,
            max_response_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Typed marketplace gateway endpoints (`/ebay/...`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    /// Mount the typed endpoints.
    pub enabled: bool,

    /// Base URL used when a request asks for the sandbox.
    pub sandbox_url: String,

    /// Base URL used otherwise.
    pub production_url: String,

    /// Budget for each marketplace call, in milliseconds.
    pub timeout_ms: u64,

    /// Value of `X-EBAY-C-MARKETPLACE-ID` on search calls.
    pub marketplace_id: String,

    /// OAuth scope requested by the client-credentials grant.
    pub oauth_scope: String,

    /// `limit` parameter of search calls.
    pub search_limit: u32,

    /// `filter` parameter of search calls.
    pub search_filter: String,

    /// `sort` parameter of search calls.
    pub search_sort: String,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sandbox_url: presets::MARKETPLACE_SANDBOX_URL.to_string(),
            production_url: presets::MARKETPLACE_PRODUCTION_URL.to_string(),
            timeout_ms: 10_000,
            marketplace_id: "EBAY_US".to_string(),
            oauth_scope: "https://api.ebay.com/oauth/api_scope".to_string(),
            search_limit: 20,
            search_filter: "conditionIds:{1000|1500|2000|2500|3000}".to_string(),
            search_sort: "price".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
