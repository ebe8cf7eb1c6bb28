//! Worker events and pure dispatch.

use serde_json::Value;
use sw_core::{FetchRequest, WorkerConfig};
use sw_strategy::{Classification, Policy, RequestClassifier};
use tokio::sync::oneshot;

use crate::message::{message_type, ClientMessage};

/// An event delivered to the worker by its host.
#[derive(Debug)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(FetchRequest),
    /// A message posted by a page, with an optional reply port.
    Message {
        data: Value,
        reply: Option<oneshot::Sender<Value>>,
    },
    Sync {
        tag: String,
    },
    Push {
        data: Option<Vec<u8>>,
    },
    NotificationClick {
        action: Option<String>,
    },
}

impl WorkerEvent {
    /// Event name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Activate => "activate",
            Self::Fetch(_) => "fetch",
            Self::Message { .. } => "message",
            Self::Sync { .. } => "sync",
            Self::Push { .. } => "push",
            Self::NotificationClick { .. } => "notificationclick",
        }
    }
}

/// What the worker does in response to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Install,
    Activate,
    /// Forward the request to the network untouched.
    Passthrough,
    /// Run a fetch strategy.
    Strategy(Policy),
    SkipWaiting,
    ReplyVersion,
    /// Unknown message, carrying its `type` if any.
    IgnoreMessage(Option<String>),
    ReplaySync(String),
    IgnoreSync(String),
    ShowNotification,
    OpenWindow,
    CloseNotification,
}

/// Decide the action for an event. No side effects.
pub fn route(event: &WorkerEvent, classifier: &RequestClassifier, config: &WorkerConfig) -> Action {
    match event {
        WorkerEvent::Install => Action::Install,
        WorkerEvent::Activate => Action::Activate,
        WorkerEvent::Fetch(request) => match classifier.classify(request) {
            Classification::Passthrough => Action::Passthrough,
            Classification::Intercept(policy) => Action::Strategy(policy),
        },
        WorkerEvent::Message { data, .. } => match ClientMessage::parse(data) {
            Some(ClientMessage::SkipWaiting) => Action::SkipWaiting,
            Some(ClientMessage::GetVersion) => Action::ReplyVersion,
            None => Action::IgnoreMessage(message_type(data).map(str::to_string)),
        },
        WorkerEvent::Sync { tag } if config.handles_sync_tag(tag) => Action::ReplaySync(tag.clone()),
        WorkerEvent::Sync { tag } => Action::IgnoreSync(tag.clone()),
        WorkerEvent::Push { .. } => Action::ShowNotification,
        WorkerEvent::NotificationClick { action } => {
            if action.as_deref() == Some(config.notification.action.as_str()) {
                Action::OpenWindow
            } else {
                Action::CloseNotification
            }
        }
    }
}
