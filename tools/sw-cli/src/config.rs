//! CLI configuration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sw_core::WorkerConfig;
use sw_fetch::TimeoutConfig;
use sw_observability::LogConfig;

/// CLI configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Worker configuration.
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Where caches live and how the network is reached.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging.
    #[serde(default)]
    pub log: LogConfig,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path))
        }
    }
}

/// Storage and network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one subdirectory per cache store.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Total network timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_dir() -> PathBuf {
    PathBuf::from(".sw-cache")
}

fn default_timeout_secs() -> u64 {
    15
}

impl StorageConfig {
    /// Timeouts for the HTTP fetcher.
    pub fn timeout(&self) -> TimeoutConfig {
        TimeoutConfig::from_total(Duration::from_secs(self.fetch_timeout_secs))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            fetch_timeout_secs: default_timeout_secs(),
        }
    }
}

/// Generate a default sw.toml config file.
pub fn generate_default_config(site_name: &str, origin: &str) -> String {
    format!(
        r#"# Offline cache controller configuration

[worker]
site_name = "{site_name}"
origin = "{origin}"
# Bump the version to invalidate every cached response on next activation.
cache = {{ app = "hotel", version = "v1" }}
precache = [
    "/",
    "/manifest.json",
    "/static/js/bundle.js",
    "/static/js/main.js",
    "/static/css/main.css",
]
network_first = [
    {{ type = "path_prefix", value = "/api/" }},
    {{ type = "host", value = "maps.googleapis.com" }},
    {{ type = "host", value = "api.emailjs.com" }},
    {{ type = "host", value = "google-analytics.com" }},
    {{ type = "host", value = "googletagmanager.com" }},
]
cache_first = [
    {{ type = "extension", value = ["png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "woff", "woff2", "ttf", "eot", "css", "js"] }},
]
sync_tags = ["booking-inquiry", "contact-form"]

[worker.notification]
title = "{site_name}"
body = "New offers are available for your stay."
icon = "/icons/icon-192x192.png"
badge = "/icons/badge-72x72.png"
action = "view"
action_title = "View"
url = "/"

[storage]
dir = ".sw-cache"
fetch_timeout_secs = 15

[log]
level = "info"
format = "human"
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_core::UrlPattern;
    use sw_observability::LogLevel;

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let content = generate_default_config("Grand Harbor Hotel", "https://hotel.example/");
        let config: CliConfig = toml::from_str(&content).unwrap();

        let defaults = WorkerConfig::default();
        assert_eq!(config.worker.cache, defaults.cache);
        assert_eq!(config.worker.precache, defaults.precache);
        assert_eq!(config.worker.network_first, defaults.network_first);
        assert_eq!(config.worker.cache_first, defaults.cache_first);
        assert_eq!(config.worker.sync_tags, defaults.sync_tags);
        assert_eq!(config.worker.notification, defaults.notification);
        assert_eq!(config.worker.origin.as_str(), "https://hotel.example/");
        assert_eq!(config.storage.fetch_timeout_secs, 15);
        assert_eq!(config.log.level, LogLevel::Info);
        config.worker.validate().unwrap();
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        assert_eq!(config.storage.dir, PathBuf::from(".sw-cache"));
        assert_eq!(config.worker.cache.static_name(), "static-v1");
    }

    #[test]
    fn test_partial_worker_section() {
        let config: CliConfig = toml::from_str(
            r#"
[worker]
cache = { app = "hotel", version = "v7" }
network_first = [{ type = "path_prefix", value = "/graphql" }]
"#,
        )
        .unwrap();
        assert_eq!(config.worker.cache.dynamic_name(), "dynamic-v7");
        assert_eq!(
            config.worker.network_first,
            vec![UrlPattern::path_prefix("/graphql")]
        );
        assert_eq!(config.worker.sync_tags.len(), 2);
    }

    #[test]
    fn test_load_json_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sw.json");
        std::fs::write(
            &path,
            r#"{"worker": {"site_name": "Harbor"}, "log": {"level": "debug"}}"#,
        )
        .unwrap();

        let config = CliConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.worker.site_name, "Harbor");
        assert_eq!(config.log.level, LogLevel::Debug);
    }
}
