//! CLI execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use sw_cache::{CacheStorage, FsCacheStorage};
use sw_fetch::{Fetcher, HttpFetcher, OfflineFetcher, RetryPolicy};
use sw_worker::ServiceWorker;

use crate::config::CliConfig;
use crate::output::Output;

/// Config file names searched from the working directory upwards.
pub const CONFIG_NAMES: [&str; 3] = ["sw.toml", ".sw.toml", "sw.json"];

/// Execution context for CLI commands.
pub struct Context {
    /// CLI configuration.
    pub config: CliConfig,
    /// Output handler.
    pub output: Output,
    /// Working directory.
    pub cwd: PathBuf,
}

impl Context {
    /// Load context from config file.
    pub fn load(config_path: Option<&str>, output: Output) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;

        let config = if let Some(path) = config_path {
            CliConfig::load(path)?
        } else {
            // Try to find config in current directory or parent directories
            Self::find_config(&cwd).unwrap_or_default()
        };

        Ok(Self { config, output, cwd })
    }

    /// Find config file in directory tree.
    fn find_config(start: &Path) -> Option<CliConfig> {
        let mut current = start.to_path_buf();
        loop {
            for name in &CONFIG_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    if let Ok(config) = CliConfig::load(config_path.to_str()?) {
                        return Some(config);
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Resolve a path relative to the working directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }

    /// Cache storage rooted at the configured directory.
    pub fn storage(&self) -> Arc<dyn CacheStorage> {
        Arc::new(FsCacheStorage::new(self.resolve_path(&self.config.storage.dir)))
    }

    /// Network access, or none at all when `offline`.
    pub fn fetcher(&self, offline: bool) -> Result<Arc<dyn Fetcher>> {
        if offline {
            return Ok(Arc::new(OfflineFetcher));
        }
        let fetcher = HttpFetcher::with_timeout(self.config.storage.timeout())
            .context("Failed to build HTTP client")?;
        Ok(Arc::new(fetcher))
    }

    /// Build a worker over the configured storage.
    pub fn worker(&self, offline: bool) -> Result<ServiceWorker> {
        let worker = ServiceWorker::new(
            self.config.worker.clone(),
            self.storage(),
            self.fetcher(offline)?,
        )
        .context("Invalid worker configuration")?
        .with_retry_policy(RetryPolicy::none());
        Ok(worker)
    }
}
