//! Route lookup and path rewriting.
//!
//! # Responsibilities
//! - Store compiled route rules
//! - Look up the matching rule for a method and path
//! - Rewrite the path for the selected upstream
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) prefix scan (acceptable for typical route counts)
//! - Longest matching prefix wins; equal prefixes keep declaration order
//! - Explicit NoMatch rather than silent default

use axum::http::Method;

use crate::config::RouteConfig;
use crate::routing::matcher::{Matcher, MethodMatcher, PathPrefixMatcher};

/// Routing failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    #[error("no route matches {method} {path}")]
    NoMatch { method: Method, path: String },
}

/// A compiled route rule.
#[derive(Debug, Clone)]
pub struct RouteRule {
    name: String,
    methods: MethodMatcher,
    prefix: PathPrefixMatcher,
    upstream: String,
    rewrite: Option<String>,
}

impl RouteRule {
    pub fn new(
        name: impl Into<String>,
        path_prefix: impl Into<String>,
        upstream: impl Into<String>,
        rewrite: Option<String>,
        methods: MethodMatcher,
    ) -> Self {
        Self {
            name: name.into(),
            methods,
            prefix: PathPrefixMatcher::new(path_prefix),
            upstream: upstream.into(),
            rewrite,
        }
    }

    pub fn from_config(config: &RouteConfig) -> Self {
        Self::new(
            config.name.clone(),
            config.path_prefix.clone(),
            config.upstream.clone(),
            config.rewrite.clone(),
            MethodMatcher::from_names(&config.methods),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    pub fn path_prefix(&self) -> &str {
        self.prefix.prefix()
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        self.prefix.matches(method, path) && self.methods.matches(method, path)
    }

    /// Replace the matched prefix with the rewrite root, or keep the path.
    fn rewrite_path(&self, path: &str) -> String {
        let Some(root) = &self.rewrite else {
            return path.to_string();
        };
        let rest = self.prefix.strip(path).unwrap_or_default();
        match (root.ends_with('/'), rest.starts_with('/')) {
            (true, true) => format!("{}{}", root, &rest[1..]),
            (false, false) if !rest.is_empty() => format!("{}/{}", root, rest),
            _ => format!("{}{}", root, rest),
        }
    }
}

/// The outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'r> {
    /// Name of the matched rule.
    pub route: &'r str,
    /// Upstream the request goes to.
    pub upstream_id: &'r str,
    /// Path to request on the upstream, relative to its base URL.
    pub rewritten_path: String,
}

/// Immutable routing table.
#[derive(Debug, Clone, Default)]
pub struct Router {
    rules: Vec<RouteRule>,
}

impl Router {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        Self { rules }
    }

    pub fn from_config(routes: &[RouteConfig]) -> Self {
        Self::new(routes.iter().map(RouteRule::from_config).collect())
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    /// Find the rule with the longest prefix matching `path` and rewrite it.
    pub fn route(&self, method: &Method, path: &str) -> Result<RouteMatch<'_>, RoutingError> {
        let mut best: Option<&RouteRule> = None;
        for rule in &self.rules {
            if !rule.matches(method, path) {
                continue;
            }
            // strictly longer only, so the earliest declaration wins ties
            if best.map_or(true, |b| rule.prefix.specificity() > b.prefix.specificity()) {
                best = Some(rule);
            }
        }

        let rule = best.ok_or_else(|| RoutingError::NoMatch {
            method: method.clone(),
            path: path.to_string(),
        })?;

        Ok(RouteMatch {
            route: &rule.name,
            upstream_id: &rule.upstream,
            rewritten_path: rule.rewrite_path(path),
        })
    }
}
