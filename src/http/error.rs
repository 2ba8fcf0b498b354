//! Proxy error taxonomy and its HTTP rendering.
//!
//! Every failure the gateway itself produces becomes a JSON body of the form
//! `{"error": "<message>"}`. Messages are generic; detail goes to the log.

use axum::http::StatusCode;
use serde_json::json;

use crate::routing::RoutingError;
use crate::security::BodyError;
use crate::upstream::TransportError;

/// A request the gateway could not complete.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::Routing(RoutingError::NoMatch { .. }) => StatusCode::NOT_FOUND,
            ProxyError::Transport(TransportError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Transport(TransportError::Unreachable(_))
            | ProxyError::Transport(TransportError::ResponseTooLarge { .. }) => StatusCode::BAD_GATEWAY,
            ProxyError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            ProxyError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client.
    pub fn public_message(&self) -> String {
        match self {
            ProxyError::Routing(_) => "Endpoint not found".into(),
            ProxyError::Transport(TransportError::Timeout(_)) => "Backend request timed out".into(),
            ProxyError::Transport(TransportError::Unreachable(_)) => {
                "Backend server unreachable".into()
            }
            ProxyError::Transport(TransportError::ResponseTooLarge { .. }) => {
                "Backend response too large".into()
            }
            ProxyError::MalformedRequest(detail) => format!("Malformed request: {}", detail),
            ProxyError::PayloadTooLarge { .. } => "Request body too large".into(),
            ProxyError::Internal(_) => "Internal proxy error".into(),
        }
    }

    pub fn body(&self) -> serde_json::Value {
        json!({ "error": self.public_message() })
    }
}

impl From<BodyError> for ProxyError {
    fn from(err: BodyError) -> Self {
        match err {
            BodyError::TooLarge { limit } => ProxyError::PayloadTooLarge { limit },
            BodyError::Malformed(detail) => ProxyError::MalformedRequest(detail),
        }
    }
}
