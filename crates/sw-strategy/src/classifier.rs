//! Request classification.

use serde::{Deserialize, Serialize};
use sw_core::{FetchRequest, UrlPattern, WorkerConfig};

/// Fetch strategy assigned to an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Network, falling back to any cached copy.
    NetworkFirst,
    /// Any cached copy, falling back to the network.
    CacheFirst,
    /// Dynamic-store copy now, refreshed in the background.
    StaleWhileRevalidate,
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkFirst => write!(f, "network-first"),
            Self::CacheFirst => write!(f, "cache-first"),
            Self::StaleWhileRevalidate => write!(f, "stale-while-revalidate"),
        }
    }
}

/// Result of classifying a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Not intercepted; goes to the network untouched.
    Passthrough,
    /// Intercepted and handled by the given policy.
    Intercept(Policy),
}

/// Assigns a policy to each request. Pure and deterministic.
#[derive(Debug, Clone, Default)]
pub struct RequestClassifier {
    network_first: Vec<UrlPattern>,
    cache_first: Vec<UrlPattern>,
}

impl RequestClassifier {
    /// Create a classifier from the two pattern sets.
    pub fn new(network_first: Vec<UrlPattern>, cache_first: Vec<UrlPattern>) -> Self {
        Self {
            network_first,
            cache_first,
        }
    }

    /// Create a classifier from worker configuration.
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(config.network_first.clone(), config.cache_first.clone())
    }

    /// Classify a request.
    ///
    /// Only GET requests over http(s) are intercepted. Rules are checked in
    /// order and the first match wins: network-first patterns, cache-first
    /// patterns, HTML documents, then network-first as the default.
    pub fn classify(&self, request: &FetchRequest) -> Classification {
        if !request.is_get() || !request.is_http() {
            return Classification::Passthrough;
        }

        let policy = if self.network_first.iter().any(|p| p.matches(&request.url)) {
            Policy::NetworkFirst
        } else if self.cache_first.iter().any(|p| p.matches(&request.url)) {
            Policy::CacheFirst
        } else if request.accepts_html() {
            Policy::StaleWhileRevalidate
        } else {
            Policy::NetworkFirst
        };

        Classification::Intercept(policy)
    }
}
