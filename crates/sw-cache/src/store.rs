//! Cache store traits.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sw_core::{FetchRequest, ResponseSnapshot};

use crate::error::CacheResult;
use crate::key::CacheKey;

/// Summary of a stored entry, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct EntryInfo {
    /// Entry key.
    pub key: CacheKey,
    /// Stored response status.
    pub status: u16,
    /// Body size in bytes.
    pub size: usize,
    /// When the entry was written.
    pub stored_at: DateTime<Utc>,
}

/// A response found by [`CacheStorage::match_any`].
#[derive(Debug, Clone)]
pub struct CacheMatch {
    /// Name of the store that held the entry.
    pub store: String,
    /// The cached response.
    pub response: ResponseSnapshot,
}

/// A single named cache store.
///
/// Puts and lookups are atomic per entry. Concurrent writers to the same
/// key resolve as last-write-wins.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Store name, e.g. `dynamic-v1`.
    fn name(&self) -> &str;

    /// Look up an entry by key.
    async fn get(&self, key: &CacheKey) -> CacheResult<Option<ResponseSnapshot>>;

    /// Insert or replace an entry.
    async fn insert(&self, key: CacheKey, response: ResponseSnapshot) -> CacheResult<()>;

    /// Remove an entry. Returns whether it existed.
    async fn remove(&self, key: &CacheKey) -> CacheResult<bool>;

    /// List all entries.
    async fn entries(&self) -> CacheResult<Vec<EntryInfo>>;

    /// Look up the response stored for a request.
    ///
    /// Non-GET requests never match.
    async fn match_request(&self, request: &FetchRequest) -> CacheResult<Option<ResponseSnapshot>> {
        if !request.is_get() {
            return Ok(None);
        }
        let key = CacheKey::for_request(request)?;
        self.get(&key).await
    }

    /// Store a response for a request. Fails for non-GET requests.
    async fn put(&self, request: &FetchRequest, response: ResponseSnapshot) -> CacheResult<()> {
        let key = CacheKey::for_request(request)?;
        self.insert(key, response).await
    }
}

/// The set of named stores owned by a worker.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Open a store, creating it if it does not exist.
    async fn open(&self, name: &str) -> CacheResult<Arc<dyn CacheStore>>;

    /// Whether a store exists.
    async fn has(&self, name: &str) -> CacheResult<bool>;

    /// Delete a store and all of its entries. Returns whether it existed.
    async fn delete(&self, name: &str) -> CacheResult<bool>;

    /// Names of all existing stores, in enumeration order.
    async fn keys(&self) -> CacheResult<Vec<String>>;

    /// Look up a request in every store, in enumeration order.
    async fn match_any(&self, request: &FetchRequest) -> CacheResult<Option<CacheMatch>> {
        for name in self.keys().await? {
            let store = self.open(&name).await?;
            if let Some(response) = store.match_request(request).await? {
                return Ok(Some(CacheMatch {
                    store: name,
                    response,
                }));
            }
        }
        Ok(None)
    }
}
