//! TLS termination.
//!
//! # Responsibilities
//! - Load the certificate chain and private key once at startup
//! - Serve the app over TLS, one task per connection
//! - Drop connections whose handshake fails, logging the failure
//!
//! # Design Decisions
//! - Missing or unreadable TLS material is a startup error
//! - The server config is shared read-only by every session
//! - Shutdown stops accepting, then drains for a bounded grace period

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_server::accept::Accept;
use axum_server::tls_rustls::{RustlsAcceptor, RustlsConfig};
use axum_server::Handle;
use futures_util::future::BoxFuture;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::ServerConfig;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::TlsConfig;
use crate::observability::metrics;

/// Grace period for in-flight requests once shutdown starts.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Error loading TLS material.
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no certificates found in {}", .0.display())]
    NoCertificates(PathBuf),

    #[error("no private key found in {}", .0.display())]
    NoPrivateKey(PathBuf),

    #[error("invalid TLS material: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Load the listener's TLS configuration from PEM files.
pub fn load_tls_config(config: &TlsConfig) -> Result<RustlsConfig, TlsError> {
    let certs = load_certs(Path::new(&config.cert_path))?;
    let key = load_private_key(Path::new(&config.key_path))?;

    let provider = Arc::new(rustls::crypto::aws_lc_rs::default_provider());
    let mut server_config = ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    server_config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    tracing::info!(
        cert_path = %config.cert_path,
        key_path = %config.key_path,
        "TLS configuration loaded"
    );
    Ok(RustlsConfig::from_config(Arc::new(server_config)))
}

/// Certificate chain from a PEM file.
pub fn load_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let mut reader = open(path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    if certs.is_empty() {
        return Err(TlsError::NoCertificates(path.to_path_buf()));
    }
    tracing::debug!(path = %path.display(), count = certs.len(), "Loaded certificates");
    Ok(certs)
}

/// First private key (PKCS#8, PKCS#1 or SEC1) in a PEM file.
pub fn load_private_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let mut reader = open(path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey(path.to_path_buf()))
}

fn open(path: &Path) -> Result<BufReader<File>, TlsError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Acceptor wrapper that logs and counts failed handshakes.
#[derive(Debug, Clone)]
pub struct HandshakeLogger<A> {
    inner: A,
}

impl<A> HandshakeLogger<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }
}

impl<I, S, A> Accept<I, S> for HandshakeLogger<A>
where
    A: Accept<I, S>,
    A::Future: Send + 'static,
    A::Stream: 'static,
    A::Service: 'static,
{
    type Stream = A::Stream;
    type Service = A::Service;
    type Future = BoxFuture<'static, io::Result<(Self::Stream, Self::Service)>>;

    fn accept(&self, stream: I, service: S) -> Self::Future {
        let handshake = self.inner.accept(stream, service);
        Box::pin(async move {
            match handshake.await {
                Ok(accepted) => Ok(accepted),
                Err(err) => {
                    tracing::debug!(error = %err, "TLS handshake failed, dropping connection");
                    metrics::record_tls_handshake_failure();
                    Err(err)
                }
            }
        })
    }
}

/// Serve `app` over TLS on `listener` until `shutdown` fires.
pub async fn serve_tls(
    listener: TcpListener,
    app: Router,
    tls: RustlsConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> io::Result<()> {
    let listener = listener.into_std()?;
    let handle = Handle::new();

    let drain = handle.clone();
    tokio::spawn(async move {
        let _ = shutdown.recv().await;
        tracing::info!(grace_secs = DRAIN_TIMEOUT.as_secs(), "Draining TLS connections");
        drain.graceful_shutdown(Some(DRAIN_TIMEOUT));
    });

    axum_server::from_tcp(listener)
        .acceptor(HandshakeLogger::new(RustlsAcceptor::new(tls)))
        .handle(handle)
        .serve(app.into_make_service())
        .await
}
