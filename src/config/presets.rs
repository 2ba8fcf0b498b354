//! Built-in deployment presets.
//!
//! Each preset is a complete `GatewayConfig` for one of the ways the gateway
//! is deployed next to the browser client.

use serde::{Deserialize, Serialize};

use crate::config::schema::{
    AlternateBaseConfig, ClientConfig, CorsConfig, GatewayConfig, ListenerConfig,
    MarketplaceConfig, ObservabilityConfig, RouteConfig, TlsConfig, UpstreamConfig,
};

/// Conventional HTTPS listener port.
pub const TLS_PORT: u16 = 8443;
/// Conventional plaintext port of the marketplace gateway.
pub const MARKETPLACE_PORT: u16 = 8081;

pub const INFERENCE_URL: &str = "http://localhost:8080";
pub const CONTROL_URL: &str = "http://localhost:5000";
pub const MARKETPLACE_SANDBOX_URL: &str = "https://api.sandbox.ebay.com";
pub const MARKETPLACE_PRODUCTION_URL: &str = "https://api.ebay.com";

/// Header that switches marketplace calls between sandbox and production.
pub const SANDBOX_HEADER: &str = "X-eBay-Sandbox";

pub const INFERENCE_UPSTREAM: &str = "inference";
pub const MARKETPLACE_UPSTREAM: &str = "marketplace";
pub const CONTROL_UPSTREAM: &str = "control";

/// Deployment profile selecting a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Inference, marketplace and control upstreams behind one TLS listener.
    #[default]
    Unified,
    /// Every path forwarded to the inference server behind TLS.
    Inference,
    /// Typed marketplace endpoints on a plaintext listener.
    Marketplace,
}

impl Profile {
    /// Build the configuration for this profile.
    pub fn config(self) -> GatewayConfig {
        match self {
            Profile::Unified => unified(),
            Profile::Inference => inference(),
            Profile::Marketplace => marketplace(),
        }
    }
}

/// `/v1/` and `/health` to the inference server, `/api/ebay/` to the
/// marketplace API, `/robot/` to the control server.
pub fn unified() -> GatewayConfig {
    GatewayConfig {
        listener: ListenerConfig {
            tls: Some(default_tls()),
            ..ListenerConfig::default()
        },
        upstreams: vec![
            inference_upstream(),
            UpstreamConfig {
                name: MARKETPLACE_UPSTREAM.to_string(),
                base_url: MARKETPLACE_SANDBOX_URL.to_string(),
                timeout_ms: 30_000,
                alternate: Some(AlternateBaseConfig {
                    header: SANDBOX_HEADER.to_string(),
                    primary_value: "true".to_string(),
                    base_url: MARKETPLACE_PRODUCTION_URL.to_string(),
                }),
            },
            UpstreamConfig {
                name: CONTROL_UPSTREAM.to_string(),
                base_url: CONTROL_URL.to_string(),
                // control plane calls are short
                timeout_ms: 10_000,
                alternate: None,
            },
        ],
        routes: vec![
            route("inference-api", "/v1/", INFERENCE_UPSTREAM, None),
            route("inference-health", "/health", INFERENCE_UPSTREAM, None),
            route("marketplace-api", "/api/ebay/", MARKETPLACE_UPSTREAM, Some("/")),
            route("control", "/robot/", CONTROL_UPSTREAM, Some("/")),
        ],
        cors: CorsConfig::default(),
        client: ClientConfig::default(),
        marketplace: MarketplaceConfig::default(),
        observability: ObservabilityConfig::default(),
    }
}

/// Every path to the inference server.
pub fn inference() -> GatewayConfig {
    GatewayConfig {
        upstreams: vec![inference_upstream()],
        routes: vec![route("inference", "/", INFERENCE_UPSTREAM, None)],
        ..unified()
    }
}

/// Only the typed marketplace endpoints, on plain HTTP.
pub fn marketplace() -> GatewayConfig {
    GatewayConfig {
        listener: ListenerConfig {
            bind_address: format!("0.0.0.0:{}", MARKETPLACE_PORT),
            tls: None,
            ..ListenerConfig::default()
        },
        upstreams: Vec::new(),
        routes: Vec::new(),
        marketplace: MarketplaceConfig {
            enabled: true,
            ..MarketplaceConfig::default()
        },
        ..unified()
    }
}

fn inference_upstream() -> UpstreamConfig {
    UpstreamConfig {
        name: INFERENCE_UPSTREAM.to_string(),
        base_url: INFERENCE_URL.to_string(),
        timeout_ms: 30_000,
        alternate: None,
    }
}

fn route(name: &str, prefix: &str, upstream: &str, rewrite: Option<&str>) -> RouteConfig {
    RouteConfig {
        name: name.to_string(),
        path_prefix: prefix.to_string(),
        upstream: upstream.to_string(),
        rewrite: rewrite.map(String::from),
        methods: Vec::new(),
    }
}

/// Default TLS material for a listener that has none configured.
pub fn default_tls() -> TlsConfig {
    TlsConfig::default()
}
