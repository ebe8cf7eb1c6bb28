//! Install-time precache and activation-time generational sweep.

use futures::future::join_all;
use serde::Serialize;
use sw_cache::{CacheError, CacheKey, CacheStorage, CacheStore};
use sw_core::{CacheNames, FetchRequest, ResponseSnapshot, WorkerConfig};
use sw_fetch::Fetcher;

use crate::error::InstallError;

/// What activation did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    /// Stores deleted by the sweep, in enumeration order.
    pub deleted: Vec<String>,
    /// Pages newly claimed.
    pub claimed: usize,
}

/// Fetch every precache path and write the responses to the static store.
///
/// All paths are fetched concurrently. Nothing is written unless every
/// fetch returns an ok response. If a write fails, the entries written in
/// this pass are removed again; a store created by this pass is deleted.
/// Returns the number of entries written.
pub async fn precache<S, F>(
    storage: &S,
    fetcher: &F,
    config: &WorkerConfig,
) -> Result<usize, InstallError>
where
    S: CacheStorage + ?Sized,
    F: Fetcher + ?Sized,
{
    let requests = config
        .precache
        .iter()
        .map(|path| {
            config
                .origin
                .join(path)
                .map(FetchRequest::get)
                .map_err(|e| InstallError::InvalidPath {
                    path: path.clone(),
                    reason: e.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let results = join_all(requests.iter().map(|r| fetcher.fetch(r))).await;

    let mut fetched: Vec<(&FetchRequest, ResponseSnapshot)> = Vec::with_capacity(requests.len());
    for (request, result) in requests.iter().zip(results) {
        match result {
            Ok(response) if response.is_ok() => fetched.push((request, response)),
            Ok(response) => {
                return Err(InstallError::BadStatus {
                    url: request.url.to_string(),
                    status: response.status,
                })
            }
            Err(source) => {
                return Err(InstallError::Fetch {
                    url: request.url.to_string(),
                    source,
                })
            }
        }
    }

    let name = config.cache.static_name();
    let existed = storage.has(&name).await?;
    let store = storage.open(&name).await?;
    for (written, (request, response)) in fetched.iter().enumerate() {
        if let Err(e) = store.put(request, response.clone()).await {
            let cleanup = if existed {
                remove_written(store.as_ref(), &fetched[..written]).await
            } else {
                storage.delete(&name).await.map(|_| ())
            };
            if let Err(cleanup) = cleanup {
                tracing::warn!(store = %name, error = %cleanup, "failed to remove partial precache");
            }
            return Err(e.into());
        }
        tracing::debug!(url = %request.url, "precached");
    }

    Ok(fetched.len())
}

/// Undo the entries a failed precache pass wrote into a store that was
/// already there.
async fn remove_written(
    store: &dyn CacheStore,
    written: &[(&FetchRequest, ResponseSnapshot)],
) -> Result<(), CacheError> {
    for (request, _) in written {
        store.remove(&CacheKey::for_request(request)?).await?;
    }
    Ok(())
}

/// Delete every store that is not part of the current generation.
pub async fn sweep<S>(storage: &S, names: &CacheNames) -> Result<Vec<String>, CacheError>
where
    S: CacheStorage + ?Sized,
{
    let mut deleted = Vec::new();
    for name in storage.keys().await? {
        if names.is_current(&name) {
            continue;
        }
        if storage.delete(&name).await? {
            tracing::info!(store = %name, "deleted stale cache");
            deleted.push(name);
        }
    }
    Ok(deleted)
}
