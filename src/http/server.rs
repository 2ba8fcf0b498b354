//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build every runtime table from a validated config
//! - Create the Axum Router with the proxy fallback and marketplace routes
//! - Wire up middleware (request ID, tracing, CORS)
//! - Serve plaintext or TLS on a bound listener until shutdown

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::loader::join_errors;
use crate::config::validation::{validate_config, ValidationError};
use crate::config::GatewayConfig;
use crate::http::forwarder::Forwarder;
use crate::http::middleware::cors_middleware;
use crate::http::request::{InboundRequest, MakeGatewayRequestId, X_REQUEST_ID};
use crate::marketplace::{self, MarketplaceError, MarketplaceGateway};
use crate::net::tls::{load_tls_config, serve_tls, TlsError};
use crate::routing::Router as RouteTable;
use crate::security::{CorsError, CorsPolicy};
use crate::upstream::{UpstreamClient, UpstreamError, UpstreamTable};

/// Error building the server.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid configuration: {}", join_errors(.0))]
    Config(Vec<ValidationError>),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Cors(#[from] CorsError),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Marketplace(#[from] MarketplaceError),
}

/// Application state injected into the proxy handler.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<Forwarder>,
    pub max_body_bytes: usize,
}

/// The gateway's HTTP server.
pub struct GatewayServer {
    app: Router,
    config: GatewayConfig,
    tls: Option<RustlsConfig>,
}

impl GatewayServer {
    /// Validate `config`, compile its tables and load TLS material.
    pub fn new(config: GatewayConfig) -> Result<Self, BuildError> {
        validate_config(&config).map_err(BuildError::Config)?;

        let client = UpstreamClient::new(&config.client)?;
        let cors = CorsPolicy::from_config(&config.cors)?;
        let forwarder = Forwarder::new(
            RouteTable::from_config(&config.routes),
            UpstreamTable::from_config(&config.upstreams)?,
            client.clone(),
            cors.clone(),
        );

        let marketplace = if config.marketplace.enabled {
            Some(Arc::new(MarketplaceGateway::new(&config.marketplace, client)?))
        } else {
            None
        };

        let tls = config
            .listener
            .tls
            .as_ref()
            .map(load_tls_config)
            .transpose()?;

        let state = AppState {
            forwarder: Arc::new(forwarder),
            max_body_bytes: config.listener.max_body_bytes,
        };
        let app = Self::build_router(state, cors, marketplace);

        Ok(Self { app, config, tls })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(
        state: AppState,
        cors: CorsPolicy,
        marketplace: Option<Arc<MarketplaceGateway>>,
    ) -> Router {
        let max_body_bytes = state.max_body_bytes;
        let mut router = Router::new().fallback(proxy_handler).with_state(state);
        if let Some(gateway) = marketplace {
            router = router.merge(marketplace::routes(gateway, max_body_bytes));
        }

        router
            .layer(middleware::from_fn_with_state(cors, cors_middleware))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(&X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                // path only: query strings may carry tokens
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeGatewayRequestId))
    }

    /// The fully layered application, for in-process use.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn is_tls(&self) -> bool {
        self.tls.is_some()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            tls = self.tls.is_some(),
            routes = self.config.routes.len(),
            marketplace = self.config.marketplace.enabled,
            "HTTP server starting"
        );

        match self.tls {
            Some(tls) => serve_tls(listener, self.app, tls, shutdown).await?,
            None => {
                axum::serve(listener, self.app)
                    .with_graceful_shutdown(async move {
                        let _ = shutdown.recv().await;
                    })
                    .await?
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Fallback handler: every request not claimed by a typed route is proxied.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    match InboundRequest::from_http(request, state.max_body_bytes).await {
        Ok(inbound) => state.forwarder.forward(inbound).await.into_response(),
        Err(err) => {
            tracing::info!(error = %err, "Rejected request");
            state.forwarder.reject(&err).into_response()
        }
    }
}
