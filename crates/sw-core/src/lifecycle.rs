//! Worker lifecycle states.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a worker instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Created, install not yet attempted.
    #[default]
    Parsed,
    /// Pre-warming the static store.
    Installing,
    /// Installed, waiting to activate.
    Installed,
    /// Sweeping old cache generations.
    Activating,
    /// Active and controlling clients.
    Activated,
    /// Install failed; this instance will never activate.
    Redundant,
}

impl WorkerState {
    /// Whether fetch events are intercepted in this state.
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, Self::Activated)
    }

    /// Whether this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Redundant)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parsed => write!(f, "parsed"),
            Self::Installing => write!(f, "installing"),
            Self::Installed => write!(f, "installed"),
            Self::Activating => write!(f, "activating"),
            Self::Activated => write!(f, "activated"),
            Self::Redundant => write!(f, "redundant"),
        }
    }
}
