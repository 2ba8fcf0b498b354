//! Route matching logic.
//!
//! # Responsibilities
//! - Match path prefix (case-sensitive)
//! - Match request method against an optional allow-list
//!
//! # Design Decisions
//! - Path matching is case-sensitive and byte-wise (`starts_with`)
//! - Empty method list = always matches (wildcard)
//! - No regex to guarantee O(n) matching

use axum::http::Method;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, method: &Method, path: &str) -> bool;
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Length of the prefix in bytes; longer prefixes are more specific.
    pub fn specificity(&self) -> usize {
        self.prefix.len()
    }

    /// The part of `path` after the prefix, if the prefix matches.
    pub fn strip<'p>(&self, path: &'p str) -> Option<&'p str> {
        path.strip_prefix(self.prefix.as_str())
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, _method: &Method, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// Matches the request method.
#[derive(Debug, Clone, Default)]
pub enum MethodMatcher {
    /// Every method.
    #[default]
    Any,
    /// One of the listed methods.
    OneOf(Vec<Method>),
}

impl MethodMatcher {
    /// Build from configured method names. Unparsable names are skipped;
    /// validation reports them before a router is built.
    pub fn from_names(names: &[String]) -> Self {
        if names.is_empty() || names.iter().any(|n| n == "*") {
            return MethodMatcher::Any;
        }
        let methods = names
            .iter()
            .filter_map(|n| Method::from_bytes(n.to_ascii_uppercase().as_bytes()).ok())
            .collect();
        MethodMatcher::OneOf(methods)
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, method: &Method, _path: &str) -> bool {
        match self {
            MethodMatcher::Any => true,
            MethodMatcher::OneOf(methods) => methods.contains(method),
        }
    }
}
