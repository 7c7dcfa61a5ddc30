//! Event types for the meshbot event bus.
//!
//! `MeshEvent` is broadcast by the supervisor and the delivery path. All
//! variants are Clone + Send + Sync for use with tokio broadcast channels.

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelId, ChannelRef};
use crate::message::InboundMessage;

/// Events emitted while bots run against the node.
///
/// Consumed by the dashboard feed and by logging subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MeshEvent {
    /// A bot was created from a registered class.
    BotCreated {
        name: String,
        class_name: String,
        channel: ChannelRef,
    },

    /// A bot's run-loop was started.
    BotStarted { name: String },

    /// A bot stopped, either on request or because its run-loop failed.
    BotStopped { name: String, error: Option<String> },

    /// A bot was removed from the supervisor.
    BotRemoved { name: String },

    /// A text message arrived from the mesh.
    MessageReceived { message: InboundMessage },

    /// Text was sent to the node on behalf of the operator.
    MessageSent { channel: ChannelId, text: String },
}

impl MeshEvent {
    /// Bot name the event refers to, if any.
    pub fn bot_name(&self) -> Option<&str> {
        match self {
            MeshEvent::BotCreated { name, .. }
            | MeshEvent::BotStarted { name }
            | MeshEvent::BotStopped { name, .. }
            | MeshEvent::BotRemoved { name } => Some(name),
            MeshEvent::MessageReceived { .. } | MeshEvent::MessageSent { .. } => None,
        }
    }
}
