//! Inbound mesh messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::ChannelId;

/// A text message received from the mesh on one channel.
///
/// Transient: it is routed once and never stored by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Node id of the sender (e.g. `!a1b2c3d4`).
    pub from_id: String,
    /// Channel the message arrived on.
    pub channel_id: ChannelId,
    /// Decoded message text.
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// The packet as delivered by the link, for handlers that need more than text.
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl InboundMessage {
    /// Build a message stamped with the current time and no raw packet.
    pub fn new(
        from_id: impl Into<String>,
        channel_id: impl Into<ChannelId>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            from_id: from_id.into(),
            channel_id: channel_id.into(),
            text: text.into(),
            timestamp: Utc::now(),
            raw: serde_json::Value::Null,
        }
    }

    /// Attach the raw packet.
    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = raw;
        self
    }
}

/// Request body for sending text on a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub text: String,
    #[serde(default)]
    pub channel: ChannelId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inbound_message_new() {
        let msg = InboundMessage::new("!abc", 1, "/help");
        assert_eq!(msg.from_id, "!abc");
        assert_eq!(msg.channel_id, ChannelId(1));
        assert!(msg.raw.is_null());
    }

    #[test]
    fn test_inbound_message_with_raw() {
        let msg = InboundMessage::new("!abc", 0, "hi").with_raw(json!({"rssi": -80}));
        assert_eq!(msg.raw["rssi"], -80);
    }

    #[test]
    fn test_send_request_defaults_to_primary() {
        let req: SendMessageRequest = serde_json::from_str(r#"{"text":"hello"}"#).unwrap();
        assert_eq!(req.channel, ChannelId::PRIMARY);
    }
}
