//! NodeLink trait definition.
//!
//! The link owns the connection to the mesh node: it sends text on a channel
//! and exposes the inbound text feed. Reconnect semantics belong to the link,
//! not to the engine. Uses RPITIT for `send`/`close` and a boxed stream for
//! `subscribe` (streams need to be object-safe for the `BoxNodeLink` wrapper).

pub mod box_link;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::Stream;
use meshbot_types::channel::ChannelId;
use meshbot_types::error::LinkError;
use meshbot_types::message::InboundMessage;
use tokio::sync::broadcast;
use tracing::warn;

pub use box_link::BoxNodeLink;

/// Lazy, unbounded feed of inbound messages.
pub type InboundStream = Pin<Box<dyn Stream<Item = InboundMessage> + Send + 'static>>;

/// Trait for node transports (TCP gateway, loopback, ...).
///
/// Implementations live in meshbot-infra (e.g., `TcpNodeLink`).
/// If the underlying transport needs serialized writes, the implementation
/// serializes them; callers may send concurrently.
pub trait NodeLink: Send + Sync {
    /// Human-readable endpoint description (e.g., "tcp://10.0.0.5:4403").
    fn describe(&self) -> String;

    /// Whether the link currently has a live connection.
    fn is_connected(&self) -> bool;

    /// Send text on a channel.
    fn send(
        &self,
        text: &str,
        channel: ChannelId,
    ) -> impl Future<Output = Result<(), LinkError>> + Send;

    /// Subscribe to inbound text messages.
    ///
    /// The stream ends only when the link is closed; it is not restartable.
    fn subscribe(&self) -> InboundStream;

    /// Close the connection and end all inbound streams.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

impl<T: NodeLink> NodeLink for Arc<T> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn send(
        &self,
        text: &str,
        channel: ChannelId,
    ) -> impl Future<Output = Result<(), LinkError>> + Send {
        (**self).send(text, channel)
    }

    fn subscribe(&self) -> InboundStream {
        (**self).subscribe()
    }

    fn close(&self) -> impl Future<Output = ()> + Send {
        (**self).close()
    }
}

/// Adapt a broadcast receiver into an [`InboundStream`].
///
/// Lagged receivers skip the dropped messages and keep going; the stream
/// ends when every sender is gone.
pub fn broadcast_stream(rx: broadcast::Receiver<InboundMessage>) -> InboundStream {
    Box::pin(futures_util::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(message) => return Some((message, rx)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "inbound subscriber lagged, messages dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }))
}
