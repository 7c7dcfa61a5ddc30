//! Channel directory trait and the caching `ChannelManager`.
//!
//! A `ChannelDirectory` knows how to find or allocate a named channel on the
//! node. `ChannelManager` sits in front of it, validates names, and caches
//! the resulting `ChannelRef`s so repeated lookups never touch the node.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashMap;
use meshbot_types::channel::{ChannelId, ChannelRef};
use meshbot_types::error::ChannelError;
use tracing::info;

/// Backend that resolves channel names to node slots.
///
/// Implementations live in meshbot-infra (e.g., `SlotChannelDirectory`).
pub trait ChannelDirectory: Send + Sync {
    /// Return the channel with this name, allocating a slot if needed.
    ///
    /// `name` is already trimmed and non-empty.
    fn create_or_get(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<ChannelRef, ChannelError>> + Send;

    /// All channels currently known to the node, ordered by id.
    fn list(&self) -> impl Future<Output = Result<Vec<ChannelRef>, ChannelError>> + Send;
}

impl<T: ChannelDirectory> ChannelDirectory for Arc<T> {
    fn create_or_get(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<ChannelRef, ChannelError>> + Send {
        (**self).create_or_get(name)
    }

    fn list(&self) -> impl Future<Output = Result<Vec<ChannelRef>, ChannelError>> + Send {
        (**self).list()
    }
}

/// Object-safe version of [`ChannelDirectory`] with boxed futures.
pub trait ChannelDirectoryDyn: Send + Sync {
    fn create_or_get_boxed<'a>(
        &'a self,
        name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ChannelRef, ChannelError>> + Send + 'a>>;

    fn list_boxed(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ChannelRef>, ChannelError>> + Send + '_>>;
}

impl<T: ChannelDirectory> ChannelDirectoryDyn for T {
    fn create_or_get_boxed<'a>(
        &'a self,
        name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<ChannelRef, ChannelError>> + Send + 'a>> {
        Box::pin(self.create_or_get(name))
    }

    fn list_boxed(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ChannelRef>, ChannelError>> + Send + '_>> {
        Box::pin(self.list())
    }
}

/// Idempotent channel creation with a name cache.
pub struct ChannelManager {
    directory: Box<dyn ChannelDirectoryDyn>,
    cache: DashMap<String, ChannelRef>,
}

impl ChannelManager {
    pub fn new<D: ChannelDirectory + 'static>(directory: D) -> Self {
        Self {
            directory: Box::new(directory),
            cache: DashMap::new(),
        }
    }

    /// Create a channel, or return the existing one with the same name.
    ///
    /// The name is trimmed; an empty name is rejected.
    pub async fn create_channel(&self, name: &str) -> Result<ChannelRef, ChannelError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ChannelError::InvalidName(
                "channel name cannot be empty".to_string(),
            ));
        }

        if let Some(existing) = self.cache.get(name) {
            return Ok(existing.clone());
        }

        let channel = self.directory.create_or_get_boxed(name).await?;
        if !self.cache.contains_key(name) {
            info!(channel = %channel, "channel ready");
        }
        self.cache.insert(name.to_string(), channel.clone());
        Ok(channel)
    }

    /// All channels on the node. Refreshes the cache as a side effect.
    pub async fn list_channels(&self) -> Result<Vec<ChannelRef>, ChannelError> {
        let channels = self.directory.list_boxed().await?;
        for channel in &channels {
            self.cache.insert(channel.name.clone(), channel.clone());
        }
        Ok(channels)
    }

    /// Look up a known channel by id.
    pub async fn get(&self, id: ChannelId) -> Result<ChannelRef, ChannelError> {
        if let Some(hit) = self.cache.iter().find(|entry| entry.value().id == id) {
            return Ok(hit.value().clone());
        }
        self.list_channels()
            .await?
            .into_iter()
            .find(|channel| channel.id == id)
            .ok_or_else(|| ChannelError::NotFound(id.to_string()))
    }
}

impl std::fmt::Debug for ChannelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelManager")
            .field("cached", &self.cache.len())
            .finish()
    }
}
