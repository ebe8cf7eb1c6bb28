//! Filesystem-backed cache storage.
//!
//! Layout: one directory per store under the root, one JSON file per entry
//! named by the key digest. Entries are written to a temporary file and
//! renamed into place so readers never see a partial entry.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use sw_core::ResponseSnapshot;
use tokio::fs;

use crate::error::{CacheError, CacheResult};
use crate::key::CacheKey;
use crate::store::{CacheStorage, CacheStore, EntryInfo};

#[derive(Debug, Serialize, Deserialize)]
struct EntryFile {
    method: String,
    url: String,
    status: u16,
    /// Header names with base64 values, so opaque bytes survive.
    headers: Vec<(String, String)>,
    body: String,
    stored_at: DateTime<Utc>,
}

impl EntryFile {
    fn new(key: &CacheKey, response: &ResponseSnapshot) -> Self {
        Self {
            method: key.method().to_string(),
            url: key.url().to_string(),
            status: response.status.as_u16(),
            headers: response
                .headers
                .iter()
                .map(|(k, v)| (k.as_str().to_string(), STANDARD.encode(v.as_bytes())))
                .collect(),
            body: STANDARD.encode(&response.body),
            stored_at: Utc::now(),
        }
    }

    fn key(&self) -> CacheKey {
        CacheKey::from_parts(self.method.clone(), self.url.clone())
    }

    fn into_response(self) -> CacheResult<ResponseSnapshot> {
        let status = StatusCode::from_u16(self.status)
            .map_err(|e| CacheError::Storage(format!("bad status {}: {}", self.status, e)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| CacheError::Storage(format!("bad header name {}: {}", name, e)))?;
            let value = STANDARD
                .decode(value.as_bytes())
                .map_err(|e| CacheError::Storage(format!("bad header encoding: {}", e)))
                .and_then(|bytes| {
                    HeaderValue::from_bytes(&bytes)
                        .map_err(|e| CacheError::Storage(format!("bad header value: {}", e)))
                })?;
            headers.append(name, value);
        }

        let body = STANDARD
            .decode(self.body.as_bytes())
            .map_err(|e| CacheError::Storage(format!("bad body encoding: {}", e)))?;

        Ok(ResponseSnapshot {
            status,
            headers,
            body,
        })
    }
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

fn validate_name(name: &str) -> CacheResult<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(CacheError::InvalidName(name.to_string()))
    }
}

/// A store backed by a directory.
#[derive(Debug)]
pub struct FsStore {
    name: String,
    dir: PathBuf,
}

impl FsStore {
    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.digest()))
    }

    async fn read_entry(path: &Path) -> CacheResult<Option<EntryFile>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CacheStore for FsStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &CacheKey) -> CacheResult<Option<ResponseSnapshot>> {
        match Self::read_entry(&self.entry_path(key)).await? {
            Some(entry) => entry.into_response().map(Some),
            None => Ok(None),
        }
    }

    async fn insert(&self, key: CacheKey, response: ResponseSnapshot) -> CacheResult<()> {
        let path = self.entry_path(&key);
        let tmp = path.with_extension(format!(
            "tmp-{}-{}",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        let bytes = serde_json::to_vec(&EntryFile::new(&key, &response))?;

        // The directory only exists between `open` and `delete`.
        let written = match fs::write(&tmp, bytes).await {
            Ok(()) => fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Err(cleanup) = fs::remove_file(&tmp).await {
                    tracing::debug!(path = %tmp.display(), error = %cleanup, "no temporary entry to remove");
                }
                Err(CacheError::StoreDeleted(self.name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, key: &CacheKey) -> CacheResult<bool> {
        match fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn entries(&self) -> CacheResult<Vec<EntryInfo>> {
        let mut entries = Vec::new();
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
            Err(e) => return Err(e.into()),
        };

        while let Some(item) = dir.next_entry().await? {
            let path = item.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::read_entry(&path).await {
                Ok(Some(entry)) => entries.push(EntryInfo {
                    key: entry.key(),
                    status: entry.status,
                    size: STANDARD.decode(entry.body.as_bytes()).map(|b| b.len()).unwrap_or(0),
                    stored_at: entry.stored_at,
                }),
                Ok(None) => {}
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable cache entry"),
            }
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }
}

/// Cache storage rooted at a directory.
///
/// Stores enumerate in name order.
#[derive(Debug, Clone)]
pub struct FsCacheStorage {
    root: PathBuf,
}

impl FsCacheStorage {
    /// Create storage rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, name: &str) -> CacheResult<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl CacheStorage for FsCacheStorage {
    async fn open(&self, name: &str) -> CacheResult<Arc<dyn CacheStore>> {
        let dir = self.store_dir(name)?;
        fs::create_dir_all(&dir).await?;
        Ok(Arc::new(FsStore {
            name: name.to_string(),
            dir,
        }) as Arc<dyn CacheStore>)
    }

    async fn has(&self, name: &str) -> CacheResult<bool> {
        let dir = self.store_dir(name)?;
        Ok(fs::metadata(&dir).await.map(|m| m.is_dir()).unwrap_or(false))
    }

    async fn delete(&self, name: &str) -> CacheResult<bool> {
        let dir = self.store_dir(name)?;
        match fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> CacheResult<Vec<String>> {
        let mut names = Vec::new();
        let mut dir = match fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };

        while let Some(item) = dir.next_entry().await? {
            if !item.file_type().await?.is_dir() {
                continue;
            }
            if let Some(name) = item.file_name().to_str() {
                if validate_name(name).is_ok() {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }
}
