//! Runs a worker as a tokio task fed by a channel.

use std::sync::Arc;

use serde_json::Value;
use sw_core::{FetchRequest, ResponseSnapshot};
use tokio::sync::{mpsc, oneshot};
use tokio::task::{JoinHandle, JoinSet};

use crate::error::WorkerError;
use crate::event::WorkerEvent;
use crate::lifecycle::ActivationReport;
use crate::push::{ClickOutcome, NotificationPayload};
use crate::sync::SyncReport;
use crate::worker::{EventResult, ServiceWorker};

const CHANNEL_CAPACITY: usize = 256;

type Reply = oneshot::Sender<Result<EventResult, WorkerError>>;

struct Envelope {
    event: WorkerEvent,
    reply: Reply,
}

/// Handle to a running worker.
///
/// Lifecycle, message, sync and push events are handled one at a time in
/// arrival order. Each fetch runs in its own task.
#[derive(Debug)]
pub struct WorkerHandle {
    sender: mpsc::Sender<Envelope>,
    worker: Arc<ServiceWorker>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Start the worker loop on the current runtime.
    pub fn spawn(worker: ServiceWorker) -> Self {
        let worker = Arc::new(worker);
        let (sender, receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let task = tokio::spawn(run(worker.clone(), receiver));
        Self {
            sender,
            worker,
            task,
        }
    }

    /// The worker behind this handle.
    pub fn worker(&self) -> &Arc<ServiceWorker> {
        &self.worker
    }

    /// Deliver an event and wait for its result.
    pub async fn dispatch(&self, event: WorkerEvent) -> Result<EventResult, WorkerError> {
        let (reply, result) = oneshot::channel();
        self.sender
            .send(Envelope { event, reply })
            .await
            .map_err(|_| WorkerError::Closed)?;
        result.await.map_err(|_| WorkerError::Closed)?
    }

    pub async fn install(&self) -> Result<usize, WorkerError> {
        match self.dispatch(WorkerEvent::Install).await? {
            EventResult::Installed { precached } => Ok(precached),
            other => Err(unexpected("install", other)),
        }
    }

    pub async fn activate(&self) -> Result<ActivationReport, WorkerError> {
        match self.dispatch(WorkerEvent::Activate).await? {
            EventResult::Activated(report) => Ok(report),
            other => Err(unexpected("activate", other)),
        }
    }

    pub async fn fetch(&self, request: FetchRequest) -> Result<ResponseSnapshot, WorkerError> {
        match self.dispatch(WorkerEvent::Fetch(request)).await? {
            EventResult::Response(response) => Ok(response),
            other => Err(unexpected("fetch", other)),
        }
    }

    /// Post a message. Returns the reply, if the worker sent one.
    pub async fn post_message(&self, data: Value) -> Result<Option<Value>, WorkerError> {
        let (reply, response) = oneshot::channel();
        self.dispatch(WorkerEvent::Message {
            data,
            reply: Some(reply),
        })
        .await?;
        Ok(response.await.ok())
    }

    /// Fire a sync event. Unregistered tags report nothing delivered.
    pub async fn sync(&self, tag: impl Into<String>) -> Result<SyncReport, WorkerError> {
        match self.dispatch(WorkerEvent::Sync { tag: tag.into() }).await? {
            EventResult::Synced(report) => Ok(report),
            EventResult::Ignored => Ok(SyncReport::default()),
            other => Err(unexpected("sync", other)),
        }
    }

    pub async fn push(&self, data: Option<Vec<u8>>) -> Result<NotificationPayload, WorkerError> {
        match self.dispatch(WorkerEvent::Push { data }).await? {
            EventResult::Notification(payload) => Ok(payload),
            other => Err(unexpected("push", other)),
        }
    }

    pub async fn notification_click(
        &self,
        action: Option<String>,
    ) -> Result<ClickOutcome, WorkerError> {
        match self.dispatch(WorkerEvent::NotificationClick { action }).await? {
            EventResult::Click(outcome) => Ok(outcome),
            other => Err(unexpected("notificationclick", other)),
        }
    }

    /// Stop accepting events, finish in-flight fetches and wait for
    /// background work.
    pub async fn shutdown(self) {
        let Self {
            sender,
            worker,
            task,
        } = self;
        drop(sender);
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "worker loop panicked");
        }
        worker.tasks().drain().await;
        tracing::info!("worker shut down");
    }
}

fn unexpected(event: &'static str, result: EventResult) -> WorkerError {
    tracing::warn!(event, result = ?result, "unexpected event result");
    WorkerError::UnexpectedResult { event }
}

async fn run(worker: Arc<ServiceWorker>, mut receiver: mpsc::Receiver<Envelope>) {
    let mut fetches = JoinSet::new();

    while let Some(Envelope { event, reply }) = receiver.recv().await {
        while let Some(finished) = fetches.try_join_next() {
            if let Err(e) = finished {
                tracing::warn!(error = %e, "fetch task panicked");
            }
        }

        match event {
            WorkerEvent::Fetch(request) => {
                let worker = worker.clone();
                fetches.spawn(async move {
                    let result = worker.handle(WorkerEvent::Fetch(request)).await;
                    let _ = reply.send(result);
                });
            }
            event => {
                let result = worker.handle(event).await;
                let _ = reply.send(result);
            }
        }
    }

    while let Some(finished) = fetches.join_next().await {
        if let Err(e) = finished {
            tracing::warn!(error = %e, "fetch task panicked");
        }
    }
}
