//! Work that must outlive the response it was started for.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use tokio::task::JoinSet;

/// Tracks background tasks so the worker is not torn down before they
/// finish, e.g. a stale-while-revalidate cache write.
#[derive(Debug, Default)]
pub struct BackgroundTasks {
    tasks: Mutex<JoinSet<()>>,
}

impl BackgroundTasks {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Spawn a task onto the current runtime and track it.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.lock();
        while let Some(finished) = tasks.try_join_next() {
            if let Err(e) = finished {
                tracing::warn!(error = %e, "background task panicked");
            }
        }
        tasks.spawn(task);
    }

    /// Number of tasks not yet reaped.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no tasks are tracked.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Wait for every tracked task, including ones spawned while draining.
    pub async fn drain(&self) {
        loop {
            let mut tasks = std::mem::take(&mut *self.lock());
            if tasks.is_empty() {
                return;
            }
            while let Some(finished) = tasks.join_next().await {
                if let Err(e) = finished {
                    tracing::warn!(error = %e, "background task panicked");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_drain_waits_for_tasks() {
        let tasks = Arc::new(BackgroundTasks::new());
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = done.clone();
            tasks.spawn(async move {
                tokio::task::yield_now().await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        tasks.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_drain_includes_tasks_spawned_while_draining() {
        let tasks = Arc::new(BackgroundTasks::new());
        let done = Arc::new(AtomicUsize::new(0));

        let inner_tasks = tasks.clone();
        let inner_done = done.clone();
        tasks.spawn(async move {
            let done = inner_done.clone();
            inner_tasks.spawn(async move {
                done.fetch_add(1, Ordering::SeqCst);
            });
            inner_done.fetch_add(1, Ordering::SeqCst);
        });

        tasks.drain().await;
        assert_eq!(done.load(Ordering::SeqCst), 2);
    }
}
