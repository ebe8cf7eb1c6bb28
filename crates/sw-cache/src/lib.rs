//! Named, versioned cache stores for the offline cache controller.
//!
//! This crate provides:
//! - `CacheStore` / `CacheStorage` - Store traits with GET-only entries
//! - `CacheKey` - Normalized request identity (method + URL without fragment)
//! - `MemoryCacheStorage` - In-memory backend
//! - `FsCacheStorage` - Directory-backed backend that survives restarts
//!
//! # Example
//!
//! ```ignore
//! use sw_cache::{CacheStorage, MemoryCacheStorage};
//! use sw_core::{FetchRequest, ResponseSnapshot};
//!
//! let storage = MemoryCacheStorage::new();
//! let store = storage.open("static-v1").await?;
//! let request = FetchRequest::parse_get("https://hotel.example/")?;
//! store.put(&request, ResponseSnapshot::html("<h1>Welcome</h1>")).await?;
//!
//! let hit = storage.match_any(&request).await?;
//! ```

mod error;
mod fs;
mod key;
mod memory;
mod store;

pub use error::*;
pub use fs::*;
pub use key::*;
pub use memory::*;
pub use store::*;
