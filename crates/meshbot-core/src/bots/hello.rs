//! HelloWorldBot: greets, echoes, and announces itself periodically.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use meshbot_types::error::{BotError, CommandError};
use tokio::time::Instant;

use crate::bot::{BotBehavior, BotContext, BotDeps, RunContext};
use crate::command::{CommandRegistry, Invocation};

/// Seconds between periodic hellos unless changed with `/interval`.
pub const DEFAULT_HELLO_INTERVAL_SECS: u64 = 60;

/// Upper bound on how long the run-loop sleeps before re-checking for stop.
const TICK: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct HelloWorldBot {
    name: String,
    interval_secs: Arc<AtomicU64>,
}

impl HelloWorldBot {
    pub const CLASS_NAME: &'static str = "HelloWorldBot";

    pub fn new(deps: BotDeps) -> Result<Self, BotError> {
        Ok(Self {
            name: deps.name,
            interval_secs: Arc::new(AtomicU64::new(DEFAULT_HELLO_INTERVAL_SECS)),
        })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.load(Ordering::Relaxed))
    }
}

impl BotBehavior for HelloWorldBot {
    fn register_commands(&self, commands: &mut CommandRegistry) -> Result<(), CommandError> {
        commands.register("hello", "Say hello", hello)?;
        commands.register("echo", "Echo a message back", echo)?;

        let interval_secs = Arc::clone(&self.interval_secs);
        commands.register(
            "interval",
            "Set the hello interval in seconds",
            move |ctx, invocation| set_interval(ctx, invocation, Arc::clone(&interval_secs)),
        )?;
        Ok(())
    }

    async fn run_loop(&self, ctx: &RunContext) -> Result<(), BotError> {
        let mut last_hello: Option<Instant> = None;
        loop {
            if last_hello.is_none_or(|at| at.elapsed() >= self.interval()) {
                ctx.say(format!(
                    "Hello everyone! I'm {} and I'm still here!",
                    self.name
                ))
                .await;
                last_hello = Some(Instant::now());
            }
            if !ctx.sleep(TICK).await {
                return Ok(());
            }
        }
    }
}

async fn hello(ctx: BotContext, invocation: Invocation) -> Result<(), CommandError> {
    ctx.send(format!("Hello, {}! How are you today?", invocation.from_id()))
        .await?;
    Ok(())
}

async fn echo(ctx: BotContext, invocation: Invocation) -> Result<(), CommandError> {
    let reply = if invocation.args.is_empty() {
        "You didn't say anything to echo!".to_string()
    } else {
        format!("Echo: {}", invocation.args.join(" "))
    };
    ctx.send(reply).await?;
    Ok(())
}

async fn set_interval(
    ctx: BotContext,
    invocation: Invocation,
    interval_secs: Arc<AtomicU64>,
) -> Result<(), CommandError> {
    let reply = match invocation.arg(0) {
        Some(arg) => {
            let secs = arg
                .parse::<u64>()
                .ok()
                .filter(|&secs| secs > 0)
                .ok_or_else(|| {
                    CommandError::InvalidArguments(format!(
                        "'{arg}' is not a positive number of seconds"
                    ))
                })?;
            interval_secs.store(secs, Ordering::Relaxed);
            format!("Hello interval set to {secs} seconds")
        }
        None => format!(
            "Current hello interval is {} seconds",
            interval_secs.load(Ordering::Relaxed)
        ),
    };
    ctx.send(reply).await?;
    Ok(())
}
