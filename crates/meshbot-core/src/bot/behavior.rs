//! BotBehavior trait: the bot-specific half of a bot.
//!
//! Uses RPITIT for `run_loop` with an object-safe `BotBehaviorDyn` twin so
//! the runtime can hold any behavior as `Arc<dyn BotBehaviorDyn>`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use meshbot_types::channel::ChannelRef;
use meshbot_types::error::{BotError, CommandError};

use super::context::RunContext;
use crate::channel::ChannelManager;
use crate::command::CommandRegistry;
use crate::link::BoxNodeLink;

/// Custom commands and periodic work of a bot class.
pub trait BotBehavior: Send + Sync + 'static {
    /// Add this class's commands. `help` and `status` are already registered.
    fn register_commands(&self, commands: &mut CommandRegistry) -> Result<(), CommandError> {
        let _ = commands;
        Ok(())
    }

    /// Periodic work, run on its own task while the bot is running.
    ///
    /// Returning `Ok` before a stop request ends the run; returning `Err`
    /// stops the bot with the error recorded. The default idles until stop.
    fn run_loop(&self, ctx: &RunContext) -> impl Future<Output = Result<(), BotError>> + Send {
        async move {
            ctx.stopped().await;
            Ok(())
        }
    }
}

/// Object-safe version of [`BotBehavior`] with boxed futures.
pub trait BotBehaviorDyn: Send + Sync {
    fn register_commands_dyn(&self, commands: &mut CommandRegistry) -> Result<(), CommandError>;

    fn run_loop_boxed<'a>(
        &'a self,
        ctx: &'a RunContext,
    ) -> Pin<Box<dyn Future<Output = Result<(), BotError>> + Send + 'a>>;
}

impl<T: BotBehavior> BotBehaviorDyn for T {
    fn register_commands_dyn(&self, commands: &mut CommandRegistry) -> Result<(), CommandError> {
        self.register_commands(commands)
    }

    fn run_loop_boxed<'a>(
        &'a self,
        ctx: &'a RunContext,
    ) -> Pin<Box<dyn Future<Output = Result<(), BotError>> + Send + 'a>> {
        Box::pin(self.run_loop(ctx))
    }
}

/// What a bot class factory receives.
#[derive(Debug, Clone)]
pub struct BotDeps {
    pub name: String,
    pub channel: ChannelRef,
    pub link: BoxNodeLink,
    pub channels: Arc<ChannelManager>,
}
