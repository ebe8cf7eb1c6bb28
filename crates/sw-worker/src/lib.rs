//! Worker lifecycle and event handling for the offline cache controller.
//!
//! This crate provides:
//! - `ServiceWorker` - Install, activate, fetch, message, sync and push handling
//! - `route` - Pure mapping from `WorkerEvent` to `Action`
//! - `WorkerHandle` - Channel-fed actor running a worker on tokio
//! - `SyncOutbox` - Deferred submissions replayed on background sync
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sw_cache::MemoryCacheStorage;
//! use sw_core::{FetchRequest, WorkerConfig};
//! use sw_fetch::HttpFetcher;
//! use sw_worker::{ServiceWorker, WorkerHandle};
//!
//! let worker = ServiceWorker::new(
//!     WorkerConfig::default(),
//!     Arc::new(MemoryCacheStorage::new()),
//!     Arc::new(HttpFetcher::new()?),
//! )?;
//! let handle = WorkerHandle::spawn(worker);
//! handle.install().await?;
//! handle.activate().await?;
//! let response = handle.fetch(FetchRequest::parse_get("http://localhost:3000/")?).await?;
//! handle.shutdown().await;
//! ```

mod actor;
mod clients;
mod error;
mod event;
mod lifecycle;
mod message;
mod push;
mod sync;
mod worker;

pub use actor::*;
pub use clients::*;
pub use error::*;
pub use event::*;
pub use lifecycle::*;
pub use message::*;
pub use push::*;
pub use sync::*;
pub use worker::*;
