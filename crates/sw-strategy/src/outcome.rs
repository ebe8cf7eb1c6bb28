//! Tagged strategy results.

use sw_core::ResponseSnapshot;
use sw_fetch::FetchError;

/// Result of running a strategy for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    /// Served from a cache store.
    Hit {
        response: ResponseSnapshot,
        /// Name of the store that held the entry.
        store: String,
    },
    /// Served from the network.
    Miss { response: ResponseSnapshot },
    /// Served the offline fallback page.
    Fallback { response: ResponseSnapshot },
    /// Network failed and nothing was cached.
    Failure { error: FetchError },
}

impl StrategyOutcome {
    /// The response to return, if any.
    pub fn response(&self) -> Option<&ResponseSnapshot> {
        match self {
            Self::Hit { response, .. } | Self::Miss { response } | Self::Fallback { response } => {
                Some(response)
            }
            Self::Failure { .. } => None,
        }
    }

    /// Convert into the response or the propagated error.
    pub fn into_result(self) -> Result<ResponseSnapshot, FetchError> {
        match self {
            Self::Hit { response, .. } | Self::Miss { response } | Self::Fallback { response } => {
                Ok(response)
            }
            Self::Failure { error } => Err(error),
        }
    }

    /// Whether this is a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Short label for logs and the CLI.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hit { .. } => "HIT",
            Self::Miss { .. } => "MISS",
            Self::Fallback { .. } => "FALLBACK",
            Self::Failure { .. } => "FAILURE",
        }
    }
}

impl std::fmt::Display for StrategyOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
