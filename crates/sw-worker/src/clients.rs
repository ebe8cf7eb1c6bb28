//! Page clients the worker may control.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use sw_core::Url;

/// Identifier for a registered client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClientId(pub u64);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// An open page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Client {
    pub id: ClientId,
    pub url: Url,
    /// Whether this worker controls the page's fetches.
    pub controlled: bool,
}

/// Registry of open pages.
#[derive(Debug, Default)]
pub struct Clients {
    next_id: AtomicU64,
    clients: RwLock<Vec<Client>>,
}

impl Clients {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Client>> {
        self.clients.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Client>> {
        self.clients.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register an uncontrolled page.
    pub fn register(&self, url: Url) -> ClientId {
        let id = ClientId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.write().push(Client {
            id,
            url,
            controlled: false,
        });
        id
    }

    /// Remove a page. Returns whether it was registered.
    pub fn unregister(&self, id: ClientId) -> bool {
        let mut clients = self.write();
        let before = clients.len();
        clients.retain(|c| c.id != id);
        clients.len() != before
    }

    /// Take control of every registered page. Returns how many pages were
    /// newly claimed.
    pub fn claim(&self) -> usize {
        let mut claimed = 0;
        for client in self.write().iter_mut().filter(|c| !c.controlled) {
            client.controlled = true;
            claimed += 1;
        }
        claimed
    }

    /// Whether a page is controlled.
    pub fn is_controlled(&self, id: ClientId) -> bool {
        self.read().iter().any(|c| c.id == id && c.controlled)
    }

    /// Copy of all registered pages.
    pub fn list(&self) -> Vec<Client> {
        self.read().clone()
    }

    /// Number of registered pages.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no pages are registered.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
