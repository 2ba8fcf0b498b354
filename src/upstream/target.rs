//! Upstream targets and URL construction.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, HeaderName};
use url::Url;

use crate::config::{AlternateBaseConfig, UpstreamConfig};

/// Error compiling an upstream definition.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("upstream `{name}`: invalid URL `{url}`: {source}")]
    InvalidUrl {
        name: String,
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("upstream `{name}`: invalid header name `{header}`")]
    InvalidHeader { name: String, header: String },
}

/// A base URL chosen by a request header.
#[derive(Debug, Clone)]
pub struct AlternateBase {
    header: HeaderName,
    primary_value: String,
    base_url: Url,
}

/// An immutable upstream service definition.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    pub id: String,
    pub base_url: Url,
    /// The upstream is reached over HTTPS.
    pub requires_tls: bool,
    pub timeout: Duration,
    pub alternate: Option<AlternateBase>,
}

impl UpstreamTarget {
    pub fn new(id: impl Into<String>, base_url: Url, timeout: Duration) -> Self {
        Self {
            id: id.into(),
            requires_tls: base_url.scheme() == "https",
            base_url,
            timeout,
            alternate: None,
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let base_url = parse_url(&config.name, &config.base_url)?;
        let mut target = Self::new(
            config.name.clone(),
            base_url,
            Duration::from_millis(config.timeout_ms),
        );
        if let Some(alternate) = &config.alternate {
            target.alternate = Some(compile_alternate(&config.name, alternate)?);
        }
        Ok(target)
    }

    /// The base URL for a request carrying `headers`.
    ///
    /// The alternate applies only when its header is present with a value
    /// other than the primary value; an absent header keeps the primary.
    pub fn base_for(&self, headers: &HeaderMap) -> &Url {
        let Some(alternate) = &self.alternate else {
            return &self.base_url;
        };
        match headers.get(&alternate.header).map(|v| v.to_str()) {
            None => &self.base_url,
            Some(Ok(value)) if value.trim().eq_ignore_ascii_case(&alternate.primary_value) => {
                &self.base_url
            }
            Some(_) => &alternate.base_url,
        }
    }

    /// Full upstream URL for a rewritten path (and optional query).
    pub fn url_for(&self, headers: &HeaderMap, path_and_query: &str) -> Result<Url, url::ParseError> {
        join_url(self.base_for(headers), path_and_query)
    }
}

/// Append `path_and_query` to the base URL, keeping the base's path root.
pub fn join_url(base: &Url, path_and_query: &str) -> Result<Url, url::ParseError> {
    let root = base.as_str().trim_end_matches('/');
    let suffix = path_and_query.strip_prefix('/').unwrap_or(path_and_query);
    Url::parse(&format!("{}/{}", root, suffix))
}

/// Upstream URL with the query stripped, safe to put in logs.
pub fn loggable(url: &Url) -> String {
    format!(
        "{}://{}{}",
        url.scheme(),
        url.host_str().unwrap_or_default(),
        url.port().map(|p| format!(":{}", p)).unwrap_or_default()
    ) + url.path()
}

fn compile_alternate(name: &str, config: &AlternateBaseConfig) -> Result<AlternateBase, UpstreamError> {
    let header = HeaderName::from_bytes(config.header.as_bytes()).map_err(|_| {
        UpstreamError::InvalidHeader {
            name: name.to_string(),
            header: config.header.clone(),
        }
    })?;
    Ok(AlternateBase {
        header,
        primary_value: config.primary_value.clone(),
        base_url: parse_url(name, &config.base_url)?,
    })
}

fn parse_url(name: &str, raw: &str) -> Result<Url, UpstreamError> {
    Url::parse(raw).map_err(|source| UpstreamError::InvalidUrl {
        name: name.to_string(),
        url: raw.to_string(),
        source,
    })
}

/// Process-wide, read-only table of upstream targets.
#[derive(Debug, Clone, Default)]
pub struct UpstreamTable {
    targets: HashMap<String, Arc<UpstreamTarget>>,
}

impl UpstreamTable {
    pub fn from_config(configs: &[UpstreamConfig]) -> Result<Self, UpstreamError> {
        let mut targets = HashMap::with_capacity(configs.len());
        for config in configs {
            let target = UpstreamTarget::from_config(config)?;
            tracing::debug!(
                upstream = %target.id,
                base_url = %target.base_url,
                tls = target.requires_tls,
                timeout_ms = target.timeout.as_millis() as u64,
                "Upstream registered"
            );
            targets.insert(target.id.clone(), Arc::new(target));
        }
        Ok(Self { targets })
    }

    pub fn get(&self, id: &str) -> Option<&Arc<UpstreamTarget>> {
        self.targets.get(id)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
