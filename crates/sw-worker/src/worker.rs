//! The worker: lifecycle state plus event handling.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::Value;
use sw_cache::CacheStorage;
use sw_core::{FetchRequest, ResponseSnapshot, WorkerConfig, WorkerState};
use sw_fetch::{Fetcher, RetryPolicy};
use sw_observability::StrategyMetrics;
use sw_strategy::{BackgroundTasks, OfflineFallback, RequestClassifier, StrategyExecutor};
use tokio::sync::oneshot;

use crate::clients::Clients;
use crate::error::{InstallError, WorkerError};
use crate::event::{route, Action, WorkerEvent};
use crate::lifecycle::{precache, sweep, ActivationReport};
use crate::message::VersionReply;
use crate::push::{click_outcome, ClickOutcome, NotificationPayload};
use crate::sync::{replay, SyncOutbox, SyncReport};

/// Result of handling one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventResult {
    Installed { precached: usize },
    Activated(ActivationReport),
    Response(ResponseSnapshot),
    MessageHandled,
    Synced(SyncReport),
    Notification(NotificationPayload),
    Click(ClickOutcome),
    Ignored,
}

/// A single worker instance bound to one cache generation.
pub struct ServiceWorker {
    config: Arc<WorkerConfig>,
    storage: Arc<dyn CacheStorage>,
    fetcher: Arc<dyn Fetcher>,
    classifier: RequestClassifier,
    executor: StrategyExecutor<dyn CacheStorage, dyn Fetcher>,
    state: RwLock<WorkerState>,
    skip_waiting: AtomicBool,
    clients: Clients,
    outbox: Arc<SyncOutbox>,
    retry: RetryPolicy,
}

impl ServiceWorker {
    /// Create a worker. The configuration is validated first.
    pub fn new(
        config: WorkerConfig,
        storage: Arc<dyn CacheStorage>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Result<Self, WorkerError> {
        config.validate()?;

        let executor = StrategyExecutor::new(
            storage.clone(),
            fetcher.clone(),
            config.cache.clone(),
            OfflineFallback::from_config(&config),
        );

        Ok(Self {
            classifier: RequestClassifier::from_config(&config),
            config: Arc::new(config),
            storage,
            fetcher,
            executor,
            state: RwLock::new(WorkerState::Parsed),
            skip_waiting: AtomicBool::new(false),
            clients: Clients::new(),
            outbox: Arc::new(SyncOutbox::new()),
            retry: RetryPolicy::default(),
        })
    }

    /// Share an outbox with the pages that enqueue into it.
    pub fn with_outbox(mut self, outbox: Arc<SyncOutbox>) -> Self {
        self.outbox = outbox;
        self
    }

    /// Retry policy for sync replays.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn state(&self) -> WorkerState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn set_state(&self, state: WorkerState) {
        let mut current = self.state.write().unwrap_or_else(|e| e.into_inner());
        let previous = *current;
        tracing::info!(from = %previous, to = %state, "worker state changed");
        *current = state;
    }

    /// Whether skip-waiting has been requested, by install or by a
    /// `SKIP_WAITING` message. The message activates an installed worker.
    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    pub fn outbox(&self) -> &Arc<SyncOutbox> {
        &self.outbox
    }

    pub fn metrics(&self) -> &Arc<StrategyMetrics> {
        self.executor.metrics()
    }

    /// Background work that must finish before the worker goes away.
    pub fn tasks(&self) -> &Arc<BackgroundTasks> {
        self.executor.tasks()
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    /// Handle one event.
    pub async fn handle(&self, event: WorkerEvent) -> Result<EventResult, WorkerError> {
        let action = route(&event, &self.classifier, &self.config);
        tracing::debug!(event = event.name(), action = ?action, "dispatching");

        match (action, event) {
            (Action::Install, _) => {
                let precached = self.install().await?;
                Ok(EventResult::Installed { precached })
            }
            (Action::Activate, _) => Ok(EventResult::Activated(self.activate().await?)),
            (Action::Passthrough, WorkerEvent::Fetch(request)) => {
                Ok(EventResult::Response(self.fetcher.fetch(&request).await?))
            }
            (Action::Strategy(policy), WorkerEvent::Fetch(request)) => {
                if !self.state().can_intercept_fetch() {
                    return Ok(EventResult::Response(self.fetcher.fetch(&request).await?));
                }
                let response = self.executor.handle(policy, &request).await.into_result()?;
                Ok(EventResult::Response(response))
            }
            (Action::SkipWaiting, _) => {
                self.skip_waiting.store(true, Ordering::SeqCst);
                tracing::info!("skip waiting requested");
                // A waiting worker takes over immediately.
                if self.state() == WorkerState::Installed {
                    return Ok(EventResult::Activated(self.activate().await?));
                }
                Ok(EventResult::MessageHandled)
            }
            (Action::ReplyVersion, WorkerEvent::Message { reply, .. }) => {
                self.reply_version(reply);
                Ok(EventResult::MessageHandled)
            }
            (Action::IgnoreMessage(kind), _) => {
                tracing::debug!(kind = ?kind, "ignoring unknown message");
                Ok(EventResult::Ignored)
            }
            (Action::ReplaySync(tag), _) => Ok(EventResult::Synced(self.sync(&tag).await?)),
            (Action::IgnoreSync(tag), _) => {
                tracing::debug!(tag = %tag, "ignoring unregistered sync tag");
                Ok(EventResult::Ignored)
            }
            (Action::ShowNotification, WorkerEvent::Push { data }) => {
                tracing::info!(bytes = data.map_or(0, |d| d.len()), "push received");
                Ok(EventResult::Notification(NotificationPayload::from_config(
                    &self.config.notification,
                )))
            }
            (Action::OpenWindow, WorkerEvent::NotificationClick { action })
            | (Action::CloseNotification, WorkerEvent::NotificationClick { action }) => {
                let outcome = click_outcome(
                    &self.config.notification,
                    &self.config.origin,
                    action.as_deref(),
                );
                tracing::debug!(outcome = ?outcome, "notification clicked");
                Ok(EventResult::Click(outcome))
            }
            (action, event) => {
                tracing::warn!(event = event.name(), action = ?action, "action does not match event");
                Ok(EventResult::Ignored)
            }
        }
    }

    /// Pre-warm the static store.
    ///
    /// On any failure nothing is written and the worker becomes redundant.
    pub async fn install(&self) -> Result<usize, InstallError> {
        let state = self.state();
        if state != WorkerState::Parsed {
            return Err(InstallError::InvalidState(state));
        }
        self.set_state(WorkerState::Installing);

        match precache(self.storage.as_ref(), self.fetcher.as_ref(), &self.config).await {
            Ok(count) => {
                tracing::info!(store = %self.config.cache.static_name(), count, "precache complete");
                self.set_state(WorkerState::Installed);
                self.skip_waiting.store(true, Ordering::SeqCst);
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(error = %e, "install failed");
                self.set_state(WorkerState::Redundant);
                Err(e)
            }
        }
    }

    /// Sweep old generations, then claim every page.
    pub async fn activate(&self) -> Result<ActivationReport, WorkerError> {
        let state = self.state();
        if state != WorkerState::Installed {
            return Err(WorkerError::InvalidState {
                action: "activate",
                state,
            });
        }
        self.set_state(WorkerState::Activating);

        let deleted = match sweep(self.storage.as_ref(), &self.config.cache).await {
            Ok(deleted) => deleted,
            Err(e) => {
                self.set_state(WorkerState::Installed);
                return Err(e.into());
            }
        };
        let claimed = self.clients.claim();

        self.set_state(WorkerState::Activated);
        tracing::info!(deleted = deleted.len(), claimed, "activated");
        Ok(ActivationReport { deleted, claimed })
    }

    /// Resume as the active worker when this generation was installed by an
    /// earlier process, i.e. its static store already exists.
    ///
    /// Returns whether the worker is now active.
    pub async fn resume(&self) -> Result<bool, WorkerError> {
        let state = self.state();
        if state != WorkerState::Parsed {
            return Ok(state == WorkerState::Activated);
        }
        let name = self.config.cache.static_name();
        if !self.storage.has(&name).await? {
            tracing::debug!(store = %name, "no installed generation to resume");
            return Ok(false);
        }
        self.set_state(WorkerState::Activated);
        Ok(true)
    }

    /// Handle an intercepted fetch.
    pub async fn fetch(&self, request: FetchRequest) -> Result<ResponseSnapshot, WorkerError> {
        match self.handle(WorkerEvent::Fetch(request)).await? {
            EventResult::Response(response) => Ok(response),
            _ => Err(WorkerError::UnexpectedResult { event: "fetch" }),
        }
    }

    /// Replay deferred submissions for a registered sync tag.
    pub async fn sync(&self, tag: &str) -> Result<SyncReport, WorkerError> {
        let report = replay(&self.outbox, tag, self.fetcher.as_ref(), &self.retry).await;
        if report.failed > 0 {
            return Err(WorkerError::SyncFailed {
                tag: tag.to_string(),
                failed: report.failed,
            });
        }
        Ok(report)
    }

    fn reply_version(&self, reply: Option<oneshot::Sender<Value>>) {
        let Some(reply) = reply else {
            tracing::debug!("version requested without a reply port");
            return;
        };
        let version = VersionReply {
            version: self.config.cache.static_name(),
        };
        match serde_json::to_value(version) {
            Ok(value) => {
                if reply.send(value).is_err() {
                    tracing::debug!("version reply port closed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to encode version reply"),
        }
    }
}

impl std::fmt::Debug for ServiceWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceWorker")
            .field("cache", &self.config.cache)
            .field("state", &self.state())
            .field("clients", &self.clients.len())
            .finish()
    }
}
