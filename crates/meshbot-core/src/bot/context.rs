//! Handles given to command handlers and run-loops.

use std::sync::Arc;
use std::time::Duration;

use meshbot_types::channel::ChannelRef;
use meshbot_types::error::LinkError;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::lifecycle::{Lifecycle, LifecycleSnapshot};
use crate::channel::ChannelManager;
use crate::command::CommandRegistry;
use crate::link::BoxNodeLink;

/// Everything a command handler may touch: identity, bound channel, the
/// shared link, and the bot's own (frozen) command table.
#[derive(Clone)]
pub struct BotContext {
    pub(crate) name: String,
    pub(crate) class_name: String,
    pub(crate) channel: ChannelRef,
    pub(crate) link: BoxNodeLink,
    pub(crate) channels: Arc<ChannelManager>,
    pub(crate) commands: Arc<CommandRegistry>,
    pub(crate) lifecycle: Arc<Lifecycle>,
    pub(crate) prefix: char,
}

impl BotContext {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The channel this bot is bound to.
    pub fn channel(&self) -> &ChannelRef {
        &self.channel
    }

    pub fn link(&self) -> &BoxNodeLink {
        &self.link
    }

    pub fn channels(&self) -> &Arc<ChannelManager> {
        &self.channels
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    pub async fn snapshot(&self) -> LifecycleSnapshot {
        self.lifecycle.snapshot().await
    }

    /// Send text on the bot's channel.
    pub async fn send(&self, text: impl AsRef<str>) -> Result<(), LinkError> {
        self.link.send(text.as_ref(), self.channel.id).await
    }

    /// Send text on the bot's channel, logging instead of failing.
    pub async fn say(&self, text: impl AsRef<str>) -> bool {
        match self.send(text).await {
            Ok(()) => true,
            Err(error) => {
                warn!(bot = %self.name, channel = %self.channel, %error, "send failed");
                false
            }
        }
    }
}

impl std::fmt::Debug for BotContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotContext")
            .field("name", &self.name)
            .field("class_name", &self.class_name)
            .field("channel", &self.channel)
            .field("commands", &self.commands.len())
            .finish_non_exhaustive()
    }
}

/// Context handed to a bot's run-loop for one run.
///
/// Run-loops must check [`RunContext::is_stopping`] or use
/// [`RunContext::sleep`] at bounded intervals so `stop()` can finish in time.
#[derive(Debug)]
pub struct RunContext {
    bot: BotContext,
    cancel: CancellationToken,
}

impl RunContext {
    pub(crate) fn new(bot: BotContext, cancel: CancellationToken) -> Self {
        Self { bot, cancel }
    }

    pub fn bot(&self) -> &BotContext {
        &self.bot
    }

    pub fn is_stopping(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once `stop()` has been requested.
    pub async fn stopped(&self) {
        self.cancel.cancelled().await
    }

    /// Sleep for `duration`, waking early on stop.
    ///
    /// Returns `false` if the bot is stopping.
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }

    pub async fn send(&self, text: impl AsRef<str>) -> Result<(), LinkError> {
        self.bot.send(text).await
    }

    pub async fn say(&self, text: impl AsRef<str>) -> bool {
        self.bot.say(text).await
    }
}
