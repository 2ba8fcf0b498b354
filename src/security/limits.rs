//! Request body limits.
//!
//! # Responsibilities
//! - Enforce maximum request body size for sized and chunked bodies
//! - Reject inconsistent `Content-Length` framing
//!
//! # Design Decisions
//! - Declared lengths are checked before any byte is read (early rejection)
//! - Streaming bodies are cut off as soon as they pass the limit
//! - Over-limit bodies return 413 Payload Too Large

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap};
use http_body_util::{BodyExt, LengthLimitError, Limited};

/// Body read failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BodyError {
    #[error("request body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("malformed request body: {0}")]
    Malformed(String),
}

/// Read the whole body, bounded by `limit` bytes. An empty body is `None`.
pub async fn read_body(
    headers: &HeaderMap,
    body: Body,
    limit: usize,
) -> Result<Option<Bytes>, BodyError> {
    if let Some(declared) = declared_length(headers)? {
        if declared > limit as u64 {
            return Err(BodyError::TooLarge { limit });
        }
    }

    let collected = Limited::new(body, limit).collect().await.map_err(|err| {
        if err.downcast_ref::<LengthLimitError>().is_some() {
            BodyError::TooLarge { limit }
        } else {
            BodyError::Malformed(err.to_string())
        }
    })?;

    let bytes = collected.to_bytes();
    Ok((!bytes.is_empty()).then_some(bytes))
}

fn declared_length(headers: &HeaderMap) -> Result<Option<u64>, BodyError> {
    let Some(value) = headers.get(header::CONTENT_LENGTH) else {
        return Ok(None);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Some)
        .ok_or_else(|| BodyError::Malformed("invalid Content-Length".into()))
}
