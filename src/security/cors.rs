//! Fixed CORS header set.
//!
//! Every response leaving the gateway carries the same allow-list. Values
//! are parsed once at startup and copied into each response.

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    ACCESS_CONTROL_MAX_AGE,
};
use axum::http::{HeaderMap, HeaderValue};

use crate::config::CorsConfig;

#[derive(Debug, thiserror::Error)]
#[error("invalid CORS {field} value `{value}`")]
pub struct CorsError {
    field: &'static str,
    value: String,
}

/// Precompiled CORS headers.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allow_origin: HeaderValue,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    max_age: HeaderValue,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Result<Self, CorsError> {
        Ok(Self {
            allow_origin: value("allow_origin", config.allow_origin.clone())?,
            allow_methods: value("allow_methods", config.allow_methods.join(", "))?,
            allow_headers: value("allow_headers", config.allow_headers.join(", "))?,
            max_age: HeaderValue::from(config.max_age_secs),
        })
    }

    /// Insert the allow headers, replacing any the upstream sent.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
    }

    /// Allow headers plus `Access-Control-Max-Age`, for preflight replies.
    pub fn apply_preflight(&self, headers: &mut HeaderMap) {
        self.apply(headers);
        headers.insert(ACCESS_CONTROL_MAX_AGE, self.max_age.clone());
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allow_origin: HeaderValue::from_static("*"),
            allow_methods: HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
            allow_headers: HeaderValue::from_static(
                "Content-Type, Authorization, X-eBay-API-AppID, X-eBay-API-Token, X-eBay-Sandbox",
            ),
            max_age: HeaderValue::from_static("86400"),
        }
    }
}

fn value(field: &'static str, raw: String) -> Result<HeaderValue, CorsError> {
    HeaderValue::try_from(raw.as_str()).map_err(|_| CorsError { field, value: raw })
}
