//! Real-time and emitted event payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::RawUser;

/// An object-metadata change delivered on a subscribed channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectEvent {
    /// Channel the event arrived on.
    pub channel: String,
    pub message: ObjectMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum ObjectMessage {
    Uuid(RawUser),
    Channel(Value),
    Membership(Value),
}

/// A custom chat event published to a channel (reports, moderation notices).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Value,
}
