//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the server from a validated config (tables, client, TLS)
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;

use tokio::sync::broadcast;

use crate::config::loader::ConfigError;
use crate::config::GatewayConfig;
use crate::http::{BuildError, GatewayServer};
use crate::net::{self, ListenerError};

/// A fatal error before or while serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),

    #[error("failed to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to initialize logging: {0}")]
    Logging(#[from] tracing_subscriber::util::TryInitError),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Build, bind and serve until `shutdown` fires.
pub async fn run(config: GatewayConfig, shutdown: broadcast::Receiver<()>) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        crate::observability::metrics::init_metrics(addr)?;
    }

    // TLS material and upstream tables are loaded before the port is bound
    let bind_address = config.listener.bind_address.clone();
    let server = GatewayServer::new(config)?;
    let listener = net::bind(&bind_address).await?;

    server.run(listener, shutdown).await?;
    Ok(())
}
