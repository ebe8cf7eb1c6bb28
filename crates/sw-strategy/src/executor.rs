//! The three fetch strategies.

use std::sync::Arc;

use sw_cache::CacheStorage;
use sw_core::{CacheNames, FetchRequest, ResponseSnapshot};
use sw_fetch::{FetchError, Fetcher};
use sw_observability::StrategyMetrics;
use tokio::sync::oneshot;

use crate::background::BackgroundTasks;
use crate::classifier::Policy;
use crate::fallback::OfflineFallback;
use crate::outcome::StrategyOutcome;

/// Runs fetch strategies against a cache storage and a fetcher.
pub struct StrategyExecutor<S: ?Sized, F: ?Sized> {
    storage: Arc<S>,
    fetcher: Arc<F>,
    names: CacheNames,
    fallback: OfflineFallback,
    tasks: Arc<BackgroundTasks>,
    metrics: Arc<StrategyMetrics>,
}

impl<S: ?Sized, F: ?Sized> Clone for StrategyExecutor<S, F> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            fetcher: self.fetcher.clone(),
            names: self.names.clone(),
            fallback: self.fallback.clone(),
            tasks: self.tasks.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<S, F> StrategyExecutor<S, F>
where
    S: CacheStorage + ?Sized + 'static,
    F: Fetcher + ?Sized + 'static,
{
    /// Create an executor with its own background task tracker and metrics.
    pub fn new(
        storage: Arc<S>,
        fetcher: Arc<F>,
        names: CacheNames,
        fallback: OfflineFallback,
    ) -> Self {
        Self {
            storage,
            fetcher,
            names,
            fallback,
            tasks: Arc::new(BackgroundTasks::new()),
            metrics: Arc::new(StrategyMetrics::new()),
        }
    }

    /// Share a background task tracker with other components.
    pub fn with_tasks(mut self, tasks: Arc<BackgroundTasks>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Share a metrics instance with other components.
    pub fn with_metrics(mut self, metrics: Arc<StrategyMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Background tasks started by this executor.
    pub fn tasks(&self) -> &Arc<BackgroundTasks> {
        &self.tasks
    }

    /// Outcome counters.
    pub fn metrics(&self) -> &Arc<StrategyMetrics> {
        &self.metrics
    }

    /// Cache names in use.
    pub fn names(&self) -> &CacheNames {
        &self.names
    }

    /// Handle an intercepted request end to end.
    ///
    /// Runs the policy, substitutes the offline fallback for failed HTML
    /// requests and records the outcome.
    pub async fn handle(&self, policy: Policy, request: &FetchRequest) -> StrategyOutcome {
        let outcome = match self.execute(policy, request).await {
            StrategyOutcome::Failure { error } if request.accepts_html() => {
                tracing::debug!(request_id = %request.id, error = %error, "navigation failed, using fallback");
                StrategyOutcome::Fallback {
                    response: self.fallback.resolve(self.storage.as_ref(), request).await,
                }
            }
            outcome => outcome,
        };

        match &outcome {
            StrategyOutcome::Hit { .. } => self.metrics.record_hit(),
            StrategyOutcome::Miss { .. } => self.metrics.record_miss(),
            StrategyOutcome::Fallback { .. } => self.metrics.record_fallback(),
            StrategyOutcome::Failure { .. } => self.metrics.record_failure(),
        }

        tracing::debug!(
            request_id = %request.id,
            url = %request.url,
            policy = %policy,
            outcome = outcome.label(),
            "request handled"
        );
        outcome
    }

    /// Run a single policy without the fallback.
    pub async fn execute(&self, policy: Policy, request: &FetchRequest) -> StrategyOutcome {
        match policy {
            Policy::NetworkFirst => self.network_first(request).await,
            Policy::CacheFirst => self.cache_first(request).await,
            Policy::StaleWhileRevalidate => self.stale_while_revalidate(request).await,
        }
    }

    /// Network, then any cached copy.
    pub async fn network_first(&self, request: &FetchRequest) -> StrategyOutcome {
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.write_dynamic(request, &response).await;
                StrategyOutcome::Miss { response }
            }
            Err(error) => {
                tracing::debug!(request_id = %request.id, error = %error, "network failed, trying caches");
                match self.match_any(request).await {
                    Some((store, response)) => StrategyOutcome::Hit { response, store },
                    None => StrategyOutcome::Failure { error },
                }
            }
        }
    }

    /// Any cached copy, then the network.
    pub async fn cache_first(&self, request: &FetchRequest) -> StrategyOutcome {
        if let Some((store, response)) = self.match_any(request).await {
            return StrategyOutcome::Hit { response, store };
        }

        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.write_dynamic(request, &response).await;
                StrategyOutcome::Miss { response }
            }
            Err(error) => StrategyOutcome::Failure { error },
        }
    }

    /// Dynamic-store copy immediately, refreshed in the background.
    ///
    /// With no cached copy the caller waits for the refresh.
    pub async fn stale_while_revalidate(&self, request: &FetchRequest) -> StrategyOutcome {
        let dynamic = self.names.dynamic_name();
        let cached = match self.storage.open(&dynamic).await {
            Ok(store) => store.match_request(request).await.unwrap_or_else(|e| {
                tracing::warn!(request_id = %request.id, error = %e, "dynamic lookup failed");
                None
            }),
            Err(e) => {
                tracing::warn!(store = %dynamic, error = %e, "failed to open dynamic store");
                None
            }
        };

        let receiver = self.revalidate(request.clone());

        match cached {
            Some(response) => StrategyOutcome::Hit {
                response,
                store: dynamic,
            },
            None => match receiver.await {
                Ok(Ok(response)) => StrategyOutcome::Miss { response },
                Ok(Err(error)) => StrategyOutcome::Failure { error },
                Err(_) => StrategyOutcome::Failure {
                    error: FetchError::Request("revalidation task ended without a result".into()),
                },
            },
        }
    }

    fn revalidate(
        &self,
        request: FetchRequest,
    ) -> oneshot::Receiver<Result<ResponseSnapshot, FetchError>> {
        let (sender, receiver) = oneshot::channel();
        let this = self.clone();

        self.tasks.spawn(async move {
            let result = this.fetcher.fetch(&request).await;
            match &result {
                Ok(response) => {
                    this.write_dynamic(&request, response).await;
                    this.metrics.record_revalidation(true);
                }
                Err(e) => {
                    tracing::warn!(request_id = %request.id, url = %request.url, error = %e, "revalidation failed");
                    this.metrics.record_revalidation(false);
                }
            }
            // The caller may already have been served from cache.
            let _ = sender.send(result);
        });

        receiver
    }

    async fn match_any(&self, request: &FetchRequest) -> Option<(String, ResponseSnapshot)> {
        match self.storage.match_any(request).await {
            Ok(found) => found.map(|m| (m.store, m.response)),
            Err(e) => {
                tracing::warn!(request_id = %request.id, error = %e, "cache lookup failed");
                None
            }
        }
    }

    /// Store an ok response in the dynamic store. Failures are logged only.
    async fn write_dynamic(&self, request: &FetchRequest, response: &ResponseSnapshot) {
        if !response.is_ok() {
            tracing::debug!(request_id = %request.id, status = %response.status, "not caching non-ok response");
            return;
        }

        let dynamic = self.names.dynamic_name();
        let result = match self.storage.open(&dynamic).await {
            Ok(store) => store.put(request, response.clone()).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(request_id = %request.id, store = %dynamic, error = %e, "cache write failed");
            self.metrics.record_cache_write_failure();
        }
    }
}
