//! Offline fallback for failed HTML navigations.

use sw_cache::CacheStorage;
use sw_core::{FetchRequest, ResponseSnapshot, WorkerConfig};

/// Serves a cached root document or a synthesized offline page.
#[derive(Debug, Clone)]
pub struct OfflineFallback {
    site_name: String,
    static_store: String,
}

impl OfflineFallback {
    /// Create a fallback for the given site name and static store.
    pub fn new(site_name: impl Into<String>, static_store: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            static_store: static_store.into(),
        }
    }

    /// Create a fallback from worker configuration.
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(config.site_name.clone(), config.cache.static_name())
    }

    /// Resolve the fallback response for a failed request.
    ///
    /// Looks up `/` on the request's origin in the static store. Lookup
    /// errors are logged and treated as a miss.
    pub async fn resolve<S>(&self, storage: &S, request: &FetchRequest) -> ResponseSnapshot
    where
        S: CacheStorage + ?Sized,
    {
        match self.cached_root(storage, request).await {
            Ok(Some(response)) => {
                tracing::debug!(url = %request.url, "serving cached root document as fallback");
                response
            }
            Ok(None) => {
                tracing::debug!(url = %request.url, "serving offline page");
                self.offline_page()
            }
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "fallback lookup failed");
                self.offline_page()
            }
        }
    }

    async fn cached_root<S>(
        &self,
        storage: &S,
        request: &FetchRequest,
    ) -> Result<Option<ResponseSnapshot>, Box<dyn std::error::Error + Send + Sync>>
    where
        S: CacheStorage + ?Sized,
    {
        if !storage.has(&self.static_store).await? {
            return Ok(None);
        }
        let root = request.sibling("/")?;
        let store = storage.open(&self.static_store).await?;
        Ok(store.match_request(&root).await?)
    }

    /// The embedded offline page: 200, `text/html`, no external resources.
    pub fn offline_page(&self) -> ResponseSnapshot {
        let site = html_escape(&self.site_name);
        ResponseSnapshot::html(format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Offline - {site}</title>
<style>
body {{ font-family: Georgia, serif; text-align: center; padding: 4rem 1rem; color: #1f2937; }}
button {{ margin-top: 1.5rem; padding: 0.75rem 1.5rem; border: 0; border-radius: 4px; background: #1f2937; color: #fff; cursor: pointer; }}
</style>
</head>
<body>
<h1>{site}</h1>
<p>You are offline. Please check your connection and try again.</p>
<button type="button" onclick="window.location.reload()">Try again</button>
</body>
</html>
"#
        ))
    }
}

/// Simple HTML escape for text content.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
