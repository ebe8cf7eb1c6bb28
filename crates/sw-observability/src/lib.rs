//! Logging and metrics for the offline cache controller.
//!
//! This crate provides:
//! - `LogConfig` / `init_logging` - tracing subscriber setup (human or JSON)
//! - `StrategyMetrics` - Lock-free counters for strategy outcomes

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;
