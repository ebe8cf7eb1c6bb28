//! Request classification and fetch strategies.
//!
//! This crate provides:
//! - `RequestClassifier` - Assigns a policy to each intercepted request
//! - `StrategyExecutor` - Network-first, cache-first and stale-while-revalidate
//! - `OfflineFallback` - Cached root document or embedded offline page
//! - `BackgroundTasks` - Tracks revalidations that outlive their response

mod background;
mod classifier;
mod executor;
mod fallback;
mod outcome;

pub use background::*;
pub use classifier::*;
pub use executor::*;
pub use fallback::*;
pub use outcome::*;
