//! Newline-delimited JSON frames exchanged with the node gateway.
//!
//! Inbound: `{"from":"!abc","channel":1,"text":"/help", ...}`; any extra
//! fields are kept in the message's raw packet. Outbound:
//! `{"channel":1,"text":"..."}`.

use meshbot_types::channel::ChannelId;
use meshbot_types::error::LinkError;
use meshbot_types::message::InboundMessage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct InboundFrame {
    from: String,
    #[serde(default)]
    channel: ChannelId,
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct OutboundFrame<'a> {
    channel: ChannelId,
    text: &'a str,
}

/// Why a line from the gateway produced no message.
#[derive(Debug, PartialEq, Eq)]
pub enum FrameSkip {
    /// Not JSON, or missing required fields.
    Malformed(String),
    /// A valid packet without text (telemetry, position, ...).
    NotText,
}

/// Decode one line from the gateway.
pub fn decode_inbound(line: &str) -> Result<InboundMessage, FrameSkip> {
    let raw: serde_json::Value =
        serde_json::from_str(line).map_err(|e| FrameSkip::Malformed(e.to_string()))?;
    let frame: InboundFrame =
        serde_json::from_value(raw.clone()).map_err(|e| FrameSkip::Malformed(e.to_string()))?;
    let text = frame.text.ok_or(FrameSkip::NotText)?;
    Ok(InboundMessage::new(frame.from, frame.channel, text).with_raw(raw))
}

/// Encode an outbound text frame, newline included.
pub fn encode_outbound(text: &str, channel: ChannelId) -> Result<String, LinkError> {
    let mut line = serde_json::to_string(&OutboundFrame { channel, text })
        .map_err(|e| LinkError::Transport(format!("failed to encode frame: {e}")))?;
    line.push('\n');
    Ok(line)
}
