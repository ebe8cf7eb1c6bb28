//! Messages posted by page clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A recognised client message, tagged by its `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientMessage {
    /// Activate as soon as installed.
    SkipWaiting,
    /// Ask for the static cache name.
    GetVersion,
}

impl ClientMessage {
    /// Parse a posted message. Unknown or malformed messages yield `None`.
    pub fn parse(data: &Value) -> Option<Self> {
        serde_json::from_value(data.clone()).ok()
    }
}

/// The `type` field of a posted message, if it has one.
pub fn message_type(data: &Value) -> Option<&str> {
    data.get("type").and_then(Value::as_str)
}

/// Reply to [`ClientMessage::GetVersion`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionReply {
    /// Static cache name, e.g. `static-v1`.
    pub version: String,
}
