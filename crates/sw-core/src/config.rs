//! Worker configuration.
//!
//! All cache names, precache paths and classification patterns live in a
//! single immutable [`WorkerConfig`] handed to the worker at start-up.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use url::Url;

/// Errors found while validating a [`WorkerConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("cache version must not be empty")]
    EmptyVersion,

    #[error("cache app name must not be empty")]
    EmptyAppName,

    #[error("cache names collide: {0}")]
    NameCollision(String),

    #[error("precache path must start with '/': {0}")]
    RelativePrecachePath(String),

    #[error("origin must be an http(s) URL: {0}")]
    InvalidOrigin(String),

    #[error("sync tag must not be empty")]
    EmptySyncTag,
}

/// Versioned cache store names.
///
/// Bumping `version` is the only way to invalidate previously cached
/// content: activation deletes every store not named by the current version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheNames {
    /// Application prefix for the primary cache name.
    pub app: String,
    /// Version tag appended to every name (e.g. "v1").
    pub version: String,
}

impl CacheNames {
    /// Create cache names for an app and version.
    pub fn new(app: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            version: version.into(),
        }
    }

    /// Primary cache name, e.g. `hotel-v1`.
    pub fn primary(&self) -> String {
        format!("{}-{}", self.app, self.version)
    }

    /// Static (pre-warmed) store name, e.g. `static-v1`.
    pub fn static_name(&self) -> String {
        format!("static-{}", self.version)
    }

    /// Dynamic (runtime) store name, e.g. `dynamic-v1`.
    pub fn dynamic_name(&self) -> String {
        format!("dynamic-{}", self.version)
    }

    /// Store names that survive the activation sweep.
    pub fn expected(&self) -> [String; 2] {
        [self.static_name(), self.dynamic_name()]
    }

    /// Whether a store name belongs to the current generation.
    pub fn is_current(&self, name: &str) -> bool {
        self.expected().iter().any(|n| n == name)
    }
}

impl Default for CacheNames {
    fn default() -> Self {
        Self::new("hotel", "v1")
    }
}

/// A URL-matching rule used by the request classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum UrlPattern {
    /// URL path starts with the prefix.
    PathPrefix(String),
    /// URL host is the domain or one of its subdomains.
    Host(String),
    /// URL path ends with one of the file extensions (case-insensitive).
    Extension(Vec<String>),
}

impl UrlPattern {
    /// Create a path prefix pattern.
    pub fn path_prefix(prefix: impl Into<String>) -> Self {
        Self::PathPrefix(prefix.into())
    }

    /// Create a host pattern.
    pub fn host(domain: impl Into<String>) -> Self {
        Self::Host(domain.into())
    }

    /// Create an extension pattern.
    pub fn extensions(exts: &[&str]) -> Self {
        Self::Extension(exts.iter().map(|e| e.to_string()).collect())
    }

    /// Check whether a URL matches this pattern.
    pub fn matches(&self, url: &Url) -> bool {
        match self {
            Self::PathPrefix(prefix) => url.path().starts_with(prefix.as_str()),
            Self::Host(domain) => match url.host_str() {
                Some(host) => {
                    host.eq_ignore_ascii_case(domain)
                        || host
                            .to_ascii_lowercase()
                            .ends_with(&format!(".{}", domain.to_ascii_lowercase()))
                }
                None => false,
            },
            Self::Extension(exts) => {
                let last = url.path().rsplit('/').next().unwrap_or_default();
                match last.rsplit_once('.') {
                    Some((stem, ext)) if !stem.is_empty() => {
                        exts.iter().any(|e| e.eq_ignore_ascii_case(ext))
                    }
                    _ => false,
                }
            }
        }
    }
}

/// Notification shown for push events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// Icon image path.
    pub icon: String,
    /// Badge image path.
    pub badge: String,
    /// Action identifier that opens `url`.
    #[serde(default = "default_action")]
    pub action: String,
    /// Label shown on the action button.
    #[serde(default = "default_action_title")]
    pub action_title: String,
    /// URL opened by the action.
    #[serde(default = "default_notification_url")]
    pub url: String,
}

fn default_action() -> String {
    "view".to_string()
}

fn default_action_title() -> String {
    "View".to_string()
}

fn default_notification_url() -> String {
    "/".to_string()
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            title: "Grand Harbor Hotel".to_string(),
            body: "New offers are available for your stay.".to_string(),
            icon: "/icons/icon-192x192.png".to_string(),
            badge: "/icons/badge-72x72.png".to_string(),
            action: default_action(),
            action_title: default_action_title(),
            url: default_notification_url(),
        }
    }
}

/// Immutable configuration for a worker instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Site name shown on the offline page.
    pub site_name: String,
    /// Origin the worker is registered on; precache paths resolve against it.
    pub origin: Url,
    /// Versioned cache names.
    pub cache: CacheNames,
    /// Paths fetched into the static store at install time.
    pub precache: Vec<String>,
    /// Patterns that always go to the network first.
    pub network_first: Vec<UrlPattern>,
    /// Patterns served from cache when present.
    pub cache_first: Vec<UrlPattern>,
    /// Background sync tags the worker responds to.
    pub sync_tags: Vec<String>,
    /// Push notification payload.
    pub notification: NotificationConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            site_name: "Grand Harbor Hotel".to_string(),
            origin: default_origin(),
            cache: CacheNames::default(),
            precache: [
                "/",
                "/manifest.json",
                "/static/js/bundle.js",
                "/static/js/main.js",
                "/static/css/main.css",
            ]
            .iter()
            .map(|p| p.to_string())
            .collect(),
            network_first: vec![
                UrlPattern::path_prefix("/api/"),
                UrlPattern::host("maps.googleapis.com"),
                UrlPattern::host("api.emailjs.com"),
                UrlPattern::host("google-analytics.com"),
                UrlPattern::host("googletagmanager.com"),
            ],
            cache_first: vec![UrlPattern::extensions(&[
                "png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "woff", "woff2", "ttf",
                "eot", "css", "js",
            ])],
            sync_tags: vec!["booking-inquiry".to_string(), "contact-form".to_string()],
            notification: NotificationConfig::default(),
        }
    }
}

fn default_origin() -> Url {
    Url::parse("http://localhost:3000/").expect("static origin URL is valid")
}

impl WorkerConfig {
    /// Create a config with defaults for the given origin.
    pub fn for_origin(origin: Url) -> Self {
        Self {
            origin,
            ..Default::default()
        }
    }

    /// Set the cache version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.cache.version = version.into();
        self
    }

    /// Replace the precache list.
    pub fn with_precache(mut self, paths: &[&str]) -> Self {
        self.precache = paths.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Whether a sync tag is registered.
    pub fn handles_sync_tag(&self, tag: &str) -> bool {
        self.sync_tags.iter().any(|t| t == tag)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.version.trim().is_empty() {
            return Err(ConfigError::EmptyVersion);
        }
        if self.cache.app.trim().is_empty() {
            return Err(ConfigError::EmptyAppName);
        }

        let mut names = HashSet::new();
        for name in [
            self.cache.primary(),
            self.cache.static_name(),
            self.cache.dynamic_name(),
        ] {
            if !names.insert(name.clone()) {
                return Err(ConfigError::NameCollision(name));
            }
        }

        if !matches!(self.origin.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidOrigin(self.origin.to_string()));
        }

        if let Some(path) = self.precache.iter().find(|p| !p.starts_with('/')) {
            return Err(ConfigError::RelativePrecachePath(path.clone()));
        }

        if self.sync_tags.iter().any(|t| t.trim().is_empty()) {
            return Err(ConfigError::EmptySyncTag);
        }

        Ok(())
    }
}
