//! In-memory node link.
//!
//! Records every send, lets callers inject inbound messages, and can
//! simulate a dropped connection. With echo enabled, every sent message
//! comes back as inbound traffic from [`LOOPBACK_NODE_ID`], which makes a
//! node-less run interactive through the dashboard API.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use meshbot_core::link::{InboundStream, NodeLink, broadcast_stream};
use meshbot_types::channel::ChannelId;
use meshbot_types::error::LinkError;
use meshbot_types::message::InboundMessage;
use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Sender id used for echoed messages.
pub const LOOPBACK_NODE_ID: &str = "!loopback";

const INBOUND_CAPACITY: usize = 256;

/// A message recorded by [`LoopbackLink::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel: ChannelId,
    pub text: String,
}

#[derive(Debug)]
pub struct LoopbackLink {
    sent: Mutex<Vec<SentMessage>>,
    connected: Arc<AtomicBool>,
    echo: bool,
    inbound: broadcast::Sender<InboundMessage>,
    closed: CancellationToken,
}

impl LoopbackLink {
    pub fn new() -> Self {
        let (inbound, _) = broadcast::channel(INBOUND_CAPACITY);
        Self {
            sent: Mutex::new(Vec::new()),
            connected: Arc::new(AtomicBool::new(true)),
            echo: false,
            inbound,
            closed: CancellationToken::new(),
        }
    }

    /// Feed every sent message back as inbound traffic.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Deliver a message to all subscribers, as if it came from the mesh.
    pub fn inject(&self, message: InboundMessage) {
        if self.inbound.send(message).is_err() {
            debug!("loopback inject with no subscribers");
        }
    }

    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn clear(&self) {
        self.sent.lock().await.clear();
    }

    /// Simulate losing (or regaining) the node connection.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl Default for LoopbackLink {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeLink for LoopbackLink {
    fn describe(&self) -> String {
        "loopback".to_string()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !self.closed.is_cancelled()
    }

    async fn send(&self, text: &str, channel: ChannelId) -> Result<(), LinkError> {
        if self.closed.is_cancelled() {
            return Err(LinkError::Closed);
        }
        if !self.is_connected() {
            return Err(LinkError::NotConnected);
        }
        self.sent.lock().await.push(SentMessage {
            channel,
            text: text.to_string(),
        });
        if self.echo {
            self.inject(InboundMessage::new(LOOPBACK_NODE_ID, channel, text));
        }
        Ok(())
    }

    fn subscribe(&self) -> InboundStream {
        let closed = self.closed.clone();
        Box::pin(broadcast_stream(self.inbound.subscribe()).take_until(closed.cancelled_owned()))
    }

    async fn close(&self) {
        self.closed.cancel();
    }
}
