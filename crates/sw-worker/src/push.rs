//! Push notifications.

use serde::Serialize;
use sw_core::{NotificationConfig, Url};

/// A notification action button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// Data attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationData {
    pub url: String,
}

/// The notification shown for every push event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub actions: Vec<NotificationAction>,
    pub data: NotificationData,
}

impl NotificationPayload {
    /// Build the payload from configuration. Push data never changes it.
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self {
            title: config.title.clone(),
            body: config.body.clone(),
            icon: config.icon.clone(),
            badge: config.badge.clone(),
            actions: vec![NotificationAction {
                action: config.action.clone(),
                title: config.action_title.clone(),
            }],
            data: NotificationData {
                url: config.url.clone(),
            },
        }
    }
}

/// What a notification click does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "url", rename_all = "snake_case")]
pub enum ClickOutcome {
    /// Close the notification and open a window at the URL.
    OpenWindow(Url),
    /// Close the notification only.
    Close,
}

/// Decide what a click does. Only the configured action opens a window.
pub fn click_outcome(config: &NotificationConfig, origin: &Url, action: Option<&str>) -> ClickOutcome {
    if action != Some(config.action.as_str()) {
        return ClickOutcome::Close;
    }
    match origin.join(&config.url) {
        Ok(url) => ClickOutcome::OpenWindow(url),
        Err(e) => {
            tracing::warn!(url = %config.url, error = %e, "notification URL is invalid");
            ClickOutcome::Close
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://hotel.example/").unwrap()
    }

    #[test]
    fn test_payload_from_defaults() {
        let payload = NotificationPayload::from_config(&NotificationConfig::default());
        assert_eq!(payload.icon, "/icons/icon-192x192.png");
        assert_eq!(payload.badge, "/icons/badge-72x72.png");
        assert_eq!(payload.actions.len(), 1);
        assert_eq!(payload.actions[0].action, "view");
        assert_eq!(payload.data.url, "/");
    }

    #[test]
    fn test_view_action_opens_window() {
        let config = NotificationConfig::default();
        assert_eq!(
            click_outcome(&config, &origin(), Some("view")),
            ClickOutcome::OpenWindow(origin())
        );
    }

    #[test]
    fn test_other_clicks_close() {
        let config = NotificationConfig::default();
        assert_eq!(click_outcome(&config, &origin(), None), ClickOutcome::Close);
        assert_eq!(
            click_outcome(&config, &origin(), Some("dismiss")),
            ClickOutcome::Close
        );
    }
}
