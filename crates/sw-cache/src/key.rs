//! Cache key normalization.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sw_core::FetchRequest;

use crate::error::{CacheError, CacheResult};

/// Normalized request identity: method plus URL without fragment.
///
/// Only GET requests produce a key, so nothing else can ever be stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    method: String,
    url: String,
}

impl CacheKey {
    /// Build the key for a request.
    pub fn for_request(request: &FetchRequest) -> CacheResult<Self> {
        if !request.is_get() {
            return Err(CacheError::UnsupportedMethod(request.method.to_string()));
        }

        let mut url = request.url.clone();
        url.set_fragment(None);

        Ok(Self {
            method: request.method.as_str().to_ascii_uppercase(),
            url: url.into(),
        })
    }

    /// Reassemble a key from stored parts.
    pub(crate) fn from_parts(method: String, url: String) -> Self {
        Self { method, url }
    }

    /// The request method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The normalized URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stable hex digest of the key, used for on-disk file names.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.method.as_bytes());
        hasher.update(b" ");
        hasher.update(self.url.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
