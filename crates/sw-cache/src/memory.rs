//! In-memory cache storage.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sw_core::{FetchRequest, ResponseSnapshot};
use tokio::sync::RwLock;

use crate::error::CacheResult;
use crate::key::CacheKey;
use crate::store::{CacheMatch, CacheStorage, CacheStore, EntryInfo};

#[derive(Debug, Clone)]
struct StoredEntry {
    response: ResponseSnapshot,
    stored_at: DateTime<Utc>,
}

/// A single in-memory store.
#[derive(Debug)]
pub struct MemoryStore {
    name: String,
    entries: RwLock<HashMap<CacheKey, StoredEntry>>,
}

impl MemoryStore {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of entries in the store.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the store has no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &CacheKey) -> CacheResult<Option<ResponseSnapshot>> {
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .map(|e| e.response.clone()))
    }

    async fn insert(&self, key: CacheKey, response: ResponseSnapshot) -> CacheResult<()> {
        self.entries.write().await.insert(
            key,
            StoredEntry {
                response,
                stored_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> CacheResult<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn entries(&self) -> CacheResult<Vec<EntryInfo>> {
        let mut entries: Vec<EntryInfo> = self
            .entries
            .read()
            .await
            .iter()
            .map(|(key, entry)| EntryInfo {
                key: key.clone(),
                status: entry.response.status.as_u16(),
                size: entry.response.body.len(),
                stored_at: entry.stored_at,
            })
            .collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }
}

/// In-memory cache storage (for tests and ephemeral workers).
///
/// Stores enumerate in creation order.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    stores: RwLock<Vec<Arc<MemoryStore>>>,
}

impl MemoryCacheStorage {
    /// Create empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a store without creating it.
    pub async fn store(&self, name: &str) -> Option<Arc<MemoryStore>> {
        self.stores
            .read()
            .await
            .iter()
            .find(|s| s.name == name)
            .cloned()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> CacheResult<Arc<dyn CacheStore>> {
        if let Some(store) = self.store(name).await {
            return Ok(store as Arc<dyn CacheStore>);
        }

        let mut stores = self.stores.write().await;
        // Another opener may have created it between the two locks.
        if let Some(store) = stores.iter().find(|s| s.name == name) {
            return Ok(store.clone() as Arc<dyn CacheStore>);
        }
        let store = Arc::new(MemoryStore::new(name));
        stores.push(store.clone());
        Ok(store as Arc<dyn CacheStore>)
    }

    async fn has(&self, name: &str) -> CacheResult<bool> {
        Ok(self.store(name).await.is_some())
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        let mut stores = self.stores.write().await;
        let before = stores.len();
        stores.retain(|s| s.name != name);
        Ok(stores.len() != before)
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        Ok(self
            .stores
            .read()
            .await
            .iter()
            .map(|s| s.name.clone())
            .collect())
    }

    async fn match_any(&self, request: &FetchRequest) -> CacheResult<Option<CacheMatch>> {
        let stores: Vec<Arc<MemoryStore>> = self.stores.read().await.clone();
        for store in stores {
            if let Some(response) = store.match_request(request).await? {
                return Ok(Some(CacheMatch {
                    store: store.name.clone(),
                    response,
                }));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_core::{Method, Url};

    fn get(url: &str) -> FetchRequest {
        FetchRequest::parse_get(url).unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_once() {
        let storage = MemoryCacheStorage::new();
        assert!(!storage.has("static-v1").await.unwrap());

        let a = storage.open("static-v1").await.unwrap();
        a.put(&get("https://hotel.example/"), ResponseSnapshot::ok("home"))
            .await
            .unwrap();
        let b = storage.open("static-v1").await.unwrap();

        assert!(storage.has("static-v1").await.unwrap());
        assert_eq!(storage.keys().await.unwrap(), vec!["static-v1"]);
        assert_eq!(
            b.match_request(&get("https://hotel.example/")).await.unwrap(),
            Some(ResponseSnapshot::ok("home"))
        );
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let storage = MemoryCacheStorage::new();
        let store = storage.open("dynamic-v1").await.unwrap();
        let request = get("https://hotel.example/rooms");

        store.put(&request, ResponseSnapshot::ok("old")).await.unwrap();
        store.put(&request, ResponseSnapshot::ok("new")).await.unwrap();

        assert_eq!(
            store.match_request(&request).await.unwrap(),
            Some(ResponseSnapshot::ok("new"))
        );
        assert_eq!(store.entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_get_is_never_stored() {
        let storage = MemoryCacheStorage::new();
        let store = storage.open("dynamic-v1").await.unwrap();
        let post = FetchRequest::new(Method::POST, Url::parse("https://hotel.example/api/contact").unwrap());

        assert!(store.put(&post, ResponseSnapshot::ok("sent")).await.is_err());
        assert_eq!(store.match_request(&post).await.unwrap(), None);
        assert!(store.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_match_any_uses_creation_order() {
        let storage = MemoryCacheStorage::new();
        let request = get("https://hotel.example/logo.png");

        let first = storage.open("static-v1").await.unwrap();
        let second = storage.open("dynamic-v1").await.unwrap();
        second.put(&request, ResponseSnapshot::ok("dynamic")).await.unwrap();
        first.put(&request, ResponseSnapshot::ok("static")).await.unwrap();

        let found = storage.match_any(&request).await.unwrap().unwrap();
        assert_eq!(found.store, "static-v1");
        assert_eq!(found.response.text(), "static");
    }

    #[tokio::test]
    async fn test_delete_store() {
        let storage = MemoryCacheStorage::new();
        storage.open("static-v1").await.unwrap();

        assert!(storage.delete("static-v1").await.unwrap());
        assert!(!storage.delete("static-v1").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
    }
}
