//! TCP listener binding.
//!
//! # Responsibilities
//! - Parse and bind the configured address
//! - Report the bound address (port 0 resolves to a real port)

use std::net::SocketAddr;

use tokio::net::TcpListener;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("invalid bind address `{address}`: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Bind a TCP listener on `bind_address`.
pub async fn bind(bind_address: &str) -> Result<TcpListener, ListenerError> {
    let address: SocketAddr = bind_address
        .parse()
        .map_err(|source| ListenerError::InvalidAddress {
            address: bind_address.to_string(),
            source,
        })?;

    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| ListenerError::Bind { address, source })?;

    if let Ok(local) = listener.local_addr() {
        tracing::info!(address = %local, "Listener bound");
    }
    Ok(listener)
}
