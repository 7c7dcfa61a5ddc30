//! Commands every bot answers: `help` and `status`.

use std::time::Duration;

use meshbot_types::error::CommandError;

use super::context::BotContext;
use crate::command::{CommandRegistry, Invocation};

pub(crate) fn register(commands: &mut CommandRegistry) -> Result<(), CommandError> {
    commands.register("help", "Show this help message", help)?;
    commands.register("status", "Show bot status", status)?;
    Ok(())
}

async fn help(ctx: BotContext, _invocation: Invocation) -> Result<(), CommandError> {
    let text = ctx.commands().render_help(ctx.name(), ctx.prefix());
    ctx.send(text).await?;
    Ok(())
}

async fn status(ctx: BotContext, _invocation: Invocation) -> Result<(), CommandError> {
    let snapshot = ctx.snapshot().await;
    let uptime = snapshot.uptime().unwrap_or_default();
    let text = format!(
        "{} Status:\nState: {}\nUptime: {}\nChannel: {}",
        ctx.name(),
        snapshot.state,
        format_uptime(uptime),
        ctx.channel()
    );
    ctx.send(text).await?;
    Ok(())
}

/// Compact uptime, largest unit first: `"2d 3h 0m 5s"`, `"1m 5s"`, `"42s"`.
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let (days, hours) = (total / 86_400, (total % 86_400) / 3_600);
    let (minutes, seconds) = ((total % 3_600) / 60, total % 60);

    if days > 0 {
        format!("{days}d {hours}h {minutes}m {seconds}s")
    } else if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
