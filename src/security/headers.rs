//! Header filtering between connection legs.
//!
//! # Responsibilities
//! - Strip hop-by-hop headers in both directions
//! - Strip headers the proxy must own on the upstream leg (Host, framing)
//!
//! # Design Decisions
//! - Header names listed in `Connection` are treated as hop-by-hop too
//! - Order and duplicates of the remaining headers are preserved
//! - `Content-Length` is recomputed for the upstream leg from the buffered body

use axum::http::{header, HeaderMap, HeaderName};

/// Headers safe to send upstream.
///
/// Drops `Host` (the client sets the upstream authority), `Content-Length`
/// and every hop-by-hop header.
pub fn filter_inbound(headers: &HeaderMap) -> HeaderMap {
    let hops = connection_hop_headers(headers);
    copy_except(headers, |name| {
        is_hop_by_hop(name, &hops) || *name == header::HOST || *name == header::CONTENT_LENGTH
    })
}

/// Headers safe to relay to the client.
///
/// Drops `Connection`, `Transfer-Encoding` and the other hop-by-hop headers;
/// the proxy frames its own response.
pub fn filter_outbound(headers: &HeaderMap) -> HeaderMap {
    let hops = connection_hop_headers(headers);
    copy_except(headers, |name| is_hop_by_hop(name, &hops))
}

fn copy_except(headers: &HeaderMap, drop: impl Fn(&HeaderName) -> bool) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        if drop(name) {
            continue;
        }
        out.append(name.clone(), value.clone());
    }
    out
}

const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Whether `name` only applies to a single connection leg.
pub fn is_hop_by_hop(name: &HeaderName, connection_hops: &[HeaderName]) -> bool {
    if connection_hops.iter().any(|n| n == name) {
        return true;
    }
    if name.as_str() == "keep-alive" || name.as_str() == "proxy-connection" {
        return true;
    }
    HOP_BY_HOP.contains(name)
}

/// Header names nominated as hop-by-hop by the `Connection` header.
pub fn connection_hop_headers(headers: &HeaderMap) -> Vec<HeaderName> {
    let mut out = Vec::new();
    for value in headers.get_all(header::CONNECTION).iter() {
        let Ok(text) = value.to_str() else {
            continue;
        };
        for token in text.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if let Ok(name) = HeaderName::from_bytes(token.as_bytes()) {
                out.push(name);
            }
        }
    }
    out
}
