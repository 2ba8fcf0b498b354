//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing upstreams)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Detect conflicting routes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::{HeaderName, Method};
use url::Url;

use crate::config::schema::{GatewayConfig, RouteConfig, UpstreamConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("listener.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("client.max_in_flight must be greater than zero")]
    ZeroInFlight,

    #[error("client.connect_timeout_ms must be greater than zero")]
    ZeroConnectTimeout,

    #[error("client.max_response_bytes must be greater than zero")]
    ZeroResponseLimit,

    #[error("duplicate upstream name `{0}`")]
    DuplicateUpstream(String),

    #[error("upstream `{name}` has invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl {
        name: String,
        url: String,
        reason: String,
    },

    #[error("upstream `{0}` has a zero timeout")]
    ZeroTimeout(String),

    #[error("`{header}` in {context} is not a valid header name")]
    InvalidHeaderName { context: String, header: String },

    #[error("route `{route}` references unknown upstream `{upstream}`")]
    UnknownUpstream { route: String, upstream: String },

    #[error("route `{route}` {field} `{value}` must start with '/'")]
    NotAbsolutePath {
        route: String,
        field: &'static str,
        value: String,
    },

    #[error("route `{route}` has invalid method `{method}`")]
    InvalidMethod { route: String, method: String },

    #[error("route `{route}` shadows route `{previous}` (same prefix and methods)")]
    DuplicateRoute { route: String, previous: String },

    #[error("marketplace.{field} `{url}` is not a valid http(s) URL")]
    InvalidMarketplaceUrl { field: &'static str, url: String },

    #[error("marketplace.timeout_ms must be greater than zero")]
    ZeroMarketplaceTimeout,
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if config.client.max_in_flight == 0 {
        errors.push(ValidationError::ZeroInFlight);
    }
    if config.client.connect_timeout_ms == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }
    if config.client.max_response_bytes == 0 {
        errors.push(ValidationError::ZeroResponseLimit);
    }

    let mut names = HashSet::new();
    for upstream in &config.upstreams {
        if !names.insert(upstream.name.as_str()) {
            errors.push(ValidationError::DuplicateUpstream(upstream.name.clone()));
        }
        validate_upstream(upstream, &mut errors);
    }

    let mut seen: Vec<(&str, Vec<String>, &str)> = Vec::new();
    for route in &config.routes {
        if !names.contains(route.upstream.as_str()) {
            errors.push(ValidationError::UnknownUpstream {
                route: route.name.clone(),
                upstream: route.upstream.clone(),
            });
        }
        validate_route(route, &mut errors);

        let methods = normalized_methods(&route.methods);
        if let Some((_, _, previous)) = seen
            .iter()
            .find(|(prefix, m, _)| *prefix == route.path_prefix && *m == methods)
        {
            errors.push(ValidationError::DuplicateRoute {
                route: route.name.clone(),
                previous: previous.to_string(),
            });
        }
        seen.push((route.path_prefix.as_str(), methods, route.name.as_str()));
    }

    for header in &config.cors.allow_headers {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName {
                context: "cors.allow_headers".to_string(),
                header: header.clone(),
            });
        }
    }

    if config.marketplace.enabled {
        let marketplace = &config.marketplace;
        for (field, url) in [
            ("sandbox_url", &marketplace.sandbox_url),
            ("production_url", &marketplace.production_url),
        ] {
            if http_url(url).is_err() {
                errors.push(ValidationError::InvalidMarketplaceUrl {
                    field,
                    url: url.clone(),
                });
            }
        }
        if marketplace.timeout_ms == 0 {
            errors.push(ValidationError::ZeroMarketplaceTimeout);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_upstream(upstream: &UpstreamConfig, errors: &mut Vec<ValidationError>) {
    if let Err(reason) = http_url(&upstream.base_url) {
        errors.push(ValidationError::InvalidBaseUrl {
            name: upstream.name.clone(),
            url: upstream.base_url.clone(),
            reason,
        });
    }
    if upstream.timeout_ms == 0 {
        errors.push(ValidationError::ZeroTimeout(upstream.name.clone()));
    }
    if let Some(alternate) = &upstream.alternate {
        if HeaderName::from_bytes(alternate.header.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidHeaderName {
                context: format!("upstream `{}` alternate", upstream.name),
                header: alternate.header.clone(),
            });
        }
        if let Err(reason) = http_url(&alternate.base_url) {
            errors.push(ValidationError::InvalidBaseUrl {
                name: upstream.name.clone(),
                url: alternate.base_url.clone(),
                reason,
            });
        }
    }
}

fn validate_route(route: &RouteConfig, errors: &mut Vec<ValidationError>) {
    if !route.path_prefix.starts_with('/') {
        errors.push(ValidationError::NotAbsolutePath {
            route: route.name.clone(),
            field: "path_prefix",
            value: route.path_prefix.clone(),
        });
    }
    if let Some(rewrite) = &route.rewrite {
        if !rewrite.starts_with('/') {
            errors.push(ValidationError::NotAbsolutePath {
                route: route.name.clone(),
                field: "rewrite",
                value: rewrite.clone(),
            });
        }
    }
    for method in &route.methods {
        if method != "*" && Method::from_bytes(method.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidMethod {
                route: route.name.clone(),
                method: method.clone(),
            });
        }
    }
}

fn normalized_methods(methods: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = methods.iter().map(|m| m.to_ascii_uppercase()).collect();
    if normalized.iter().any(|m| m == "*") {
        return Vec::new();
    }
    normalized.sort();
    normalized.dedup();
    normalized
}

fn http_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme `{}`", other)),
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(url)
}
