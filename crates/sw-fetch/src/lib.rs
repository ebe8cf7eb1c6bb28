//! Network access for the offline cache controller.
//!
//! This crate provides:
//! - `Fetcher` - The network seam every strategy fetches through
//! - `HttpFetcher` - reqwest-backed fetcher with timeouts
//! - `OfflineFetcher` - Always-failing fetcher for offline runs
//! - `TimeoutConfig` - Connect/total timeouts
//! - `RetryPolicy` - Retry strategies for deferred replays

mod client;
mod retry;
mod timeout;

pub use client::*;
pub use retry::*;
pub use timeout::*;
