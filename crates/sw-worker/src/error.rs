//! Worker error types.

use sw_cache::CacheError;
use sw_core::{ConfigError, StatusCode, WorkerState};
use sw_fetch::FetchError;

/// Why pre-warming the static store failed.
#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("invalid precache path {path}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("precache fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("precache response for {url} was {status}")]
    BadStatus { url: String, status: StatusCode },

    #[error("failed to write precache: {0}")]
    Cache(#[from] CacheError),

    #[error("cannot install a worker that is {0}")]
    InvalidState(WorkerState),
}

/// Errors surfaced by the worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// A non-HTML request failed with nothing cached.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("install failed: {0}")]
    Install(#[from] InstallError),

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot {action} a worker that is {state}")]
    InvalidState {
        action: &'static str,
        state: WorkerState,
    },

    #[error("sync {tag}: {failed} submission(s) failed and were re-queued")]
    SyncFailed { tag: String, failed: usize },

    #[error("{event} event produced an unexpected result")]
    UnexpectedResult { event: &'static str },

    #[error("worker has shut down")]
    Closed,
}
