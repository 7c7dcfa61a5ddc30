//! Command handler trait.

use std::future::Future;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use meshbot_types::error::CommandError;

use super::Invocation;
use crate::bot::BotContext;

/// Something that can run a command.
///
/// Implemented for every `async fn(BotContext, Invocation) -> Result<(), CommandError>`
/// and for closures of the same shape, so bots usually register plain
/// functions or closures capturing shared state.
pub trait CommandHandler: Send + Sync {
    fn call(&self, ctx: BotContext, invocation: Invocation)
    -> BoxFuture<'static, Result<(), CommandError>>;
}

impl<F, Fut> CommandHandler for F
where
    F: Fn(BotContext, Invocation) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), CommandError>> + Send + 'static,
{
    fn call(
        &self,
        ctx: BotContext,
        invocation: Invocation,
    ) -> BoxFuture<'static, Result<(), CommandError>> {
        (self)(ctx, invocation).boxed()
    }
}
