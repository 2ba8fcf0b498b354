//! Outbound HTTP client.
//!
//! # Responsibilities
//! - Issue exactly one request per call to an upstream target
//! - Bound admission and time to headers by the per-request budget
//! - Read the body with the budget as an inactivity window, under a size cap
//! - Classify failures as timeout, unreachable or oversized
//!
//! # Design Decisions
//! - A body that keeps arriving is never cut off by the total elapsed time
//! - Non-2xx statuses are valid responses, never transport errors
//! - Redirects are returned to the caller, not followed
//! - Environment proxies are ignored unless explicitly enabled

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use url::Url;

use crate::config::ClientConfig;
use crate::observability::metrics;
use crate::resilience::{within_budget, InFlightLimiter, InFlightPermit};
use crate::upstream::target::{loggable, UpstreamTarget};

/// Transport-level failure talking to an upstream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// No complete response within the budget.
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    /// Connection refused or reset, DNS failure, TLS failure to the upstream.
    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    /// The reply body exceeded the buffered response cap.
    #[error("upstream response exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },
}

impl TransportError {
    /// Metric label for this failure.
    pub fn kind(&self) -> &'static str {
        match self {
            TransportError::Timeout(_) => "timeout",
            TransportError::Unreachable(_) => "unreachable",
            TransportError::ResponseTooLarge { .. } => "too_large",
        }
    }
}

/// An upstream reply, fully read.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// A fully resolved outbound request.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    /// HTTP Basic credentials (user, password).
    pub basic_auth: Option<(String, String)>,
    pub timeout: Duration,
}

impl UpstreamRequest {
    pub fn new(method: Method, url: Url, timeout: Duration) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
            basic_auth: None,
            timeout,
        }
    }
}

/// Shared upstream client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    limiter: Arc<InFlightLimiter>,
    max_response_bytes: usize,
}

impl UpstreamClient {
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .redirect(reqwest::redirect::Policy::none());
        if !config.system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            http: builder.build()?,
            limiter: Arc::new(InFlightLimiter::new(config.max_in_flight)),
            max_response_bytes: config.max_response_bytes,
        })
    }

    pub fn limiter(&self) -> &InFlightLimiter {
        &self.limiter
    }

    /// Send one request to `target` at `path_and_query`.
    ///
    /// The base URL is chosen from `headers` when the target has a
    /// header-selected alternate.
    pub async fn send(
        &self,
        target: &UpstreamTarget,
        method: Method,
        path_and_query: &str,
        headers: HeaderMap,
        body: Option<Bytes>,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError> {
        let url = target.url_for(&headers, path_and_query).map_err(|e| {
            TransportError::Unreachable(format!("cannot build upstream URL: {}", e))
        })?;

        let mut request = UpstreamRequest::new(method, url, timeout);
        request.headers = headers;
        request.body = body;
        self.execute(request).await
    }

    /// Execute a resolved request.
    ///
    /// `request.timeout` bounds the wait for an in-flight slot plus the
    /// response head, and then each gap between body chunks.
    pub async fn execute(&self, request: UpstreamRequest) -> Result<RawResponse, TransportError> {
        let started = Instant::now();
        let method = request.method.clone();
        let target = loggable(&request.url);

        let result = self.exchange(request).await;
        match &result {
            Ok(response) => tracing::debug!(
                method = %method,
                upstream_url = %target,
                status = response.status.as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Upstream responded"
            ),
            Err(err) => {
                tracing::warn!(
                    method = %method,
                    upstream_url = %target,
                    error = %err,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Upstream request failed"
                );
                metrics::record_upstream_failure(err.kind());
            }
        }
        result
    }

    async fn exchange(&self, request: UpstreamRequest) -> Result<RawResponse, TransportError> {
        let idle = request.timeout;
        let (_permit, response) = within_budget(idle, self.start(request)).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = self.read_response_body(response, idle).await?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    /// Wait for an in-flight slot, send, and wait for the response head.
    async fn start(
        &self,
        request: UpstreamRequest,
    ) -> Result<(InFlightPermit, reqwest::Response), TransportError> {
        let budget = request.timeout;
        let permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| TransportError::Unreachable("in-flight limiter closed".into()))?;

        let mut builder = self
            .http
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some((user, password)) = request.basic_auth {
            builder = builder.basic_auth(user, Some(password));
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| classify(e, budget))?;
        Ok((permit, response))
    }

    /// Collect the body, failing if no chunk arrives within `idle`.
    async fn read_response_body(
        &self,
        mut response: reqwest::Response,
        idle: Duration,
    ) -> Result<Bytes, TransportError> {
        let limit = self.max_response_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(TransportError::ResponseTooLarge { limit });
        }

        let mut body = Vec::new();
        loop {
            let next = within_budget(idle, async {
                response.chunk().await.map_err(|e| classify(e, idle))
            })
            .await?;
            let Some(chunk) = next else {
                break;
            };
            if body.len() + chunk.len() > limit {
                return Err(TransportError::ResponseTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(body))
    }
}

fn classify(err: reqwest::Error, budget: Duration) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout(budget);
    }
    // the URL may carry credentials in its query
    let err = err.without_url();
    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    TransportError::Unreachable(message)
}
