//! BoxNodeLink -- object-safe dynamic dispatch wrapper for NodeLink.
//!
//! 1. Define an object-safe `NodeLinkDyn` trait with boxed futures
//! 2. Blanket-impl `NodeLinkDyn` for all `T: NodeLink`
//! 3. `BoxNodeLink` wraps `Arc<dyn NodeLinkDyn>` and delegates
//!
//! The link is shared by every bot and the delivery path, so the wrapper is
//! reference-counted and cheap to clone.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use meshbot_types::channel::ChannelId;
use meshbot_types::error::LinkError;

use super::{InboundStream, NodeLink};

/// Object-safe version of [`NodeLink`] with boxed futures.
pub trait NodeLinkDyn: Send + Sync {
    fn describe(&self) -> String;

    fn is_connected(&self) -> bool;

    fn send_boxed<'a>(
        &'a self,
        text: &'a str,
        channel: ChannelId,
    ) -> Pin<Box<dyn Future<Output = Result<(), LinkError>> + Send + 'a>>;

    fn subscribe(&self) -> InboundStream;

    fn close_boxed(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

impl<T: NodeLink> NodeLinkDyn for T {
    fn describe(&self) -> String {
        NodeLink::describe(self)
    }

    fn is_connected(&self) -> bool {
        NodeLink::is_connected(self)
    }

    fn send_boxed<'a>(
        &'a self,
        text: &'a str,
        channel: ChannelId,
    ) -> Pin<Box<dyn Future<Output = Result<(), LinkError>> + Send + 'a>> {
        Box::pin(self.send(text, channel))
    }

    fn subscribe(&self) -> InboundStream {
        NodeLink::subscribe(self)
    }

    fn close_boxed(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(self.close())
    }
}

/// Type-erased, shared node link.
///
/// Since `NodeLink` uses RPITIT, it cannot be used as a trait object directly.
/// `BoxNodeLink` provides equivalent methods that delegate to the inner
/// `NodeLinkDyn` trait object.
#[derive(Clone)]
pub struct BoxNodeLink {
    inner: Arc<dyn NodeLinkDyn>,
}

impl BoxNodeLink {
    /// Wrap a concrete `NodeLink` implementation.
    pub fn new<T: NodeLink + 'static>(link: T) -> Self {
        Self {
            inner: Arc::new(link),
        }
    }

    pub fn describe(&self) -> String {
        self.inner.describe()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.is_connected()
    }

    /// Send text on a channel.
    pub async fn send(&self, text: &str, channel: ChannelId) -> Result<(), LinkError> {
        self.inner.send_boxed(text, channel).await
    }

    /// Subscribe to inbound text messages.
    pub fn subscribe(&self) -> InboundStream {
        self.inner.subscribe()
    }

    pub async fn close(&self) {
        self.inner.close_boxed().await
    }
}

impl std::fmt::Debug for BoxNodeLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxNodeLink")
            .field("endpoint", &self.inner.describe())
            .field("connected", &self.inner.is_connected())
            .finish()
    }
}
