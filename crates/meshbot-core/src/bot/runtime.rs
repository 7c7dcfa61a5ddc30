//! BotRuntime: lifecycle, run-loop task, and command dispatch for one bot.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use meshbot_types::bot::{BotDescriptor, BotState};
use meshbot_types::channel::ChannelRef;
use meshbot_types::config::UnknownCommandPolicy;
use meshbot_types::error::{BotError, CommandError};
use meshbot_types::event::MeshEvent;
use meshbot_types::message::InboundMessage;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::behavior::{BotBehaviorDyn, BotDeps};
use super::context::{BotContext, RunContext};
use super::lifecycle::Lifecycle;
use super::settings::BotSettings;
use super::{DispatchOutcome, builtin, panic_message};
use crate::command::{CommandRegistry, Invocation, parse_command};
use crate::event::EventBus;

struct RunHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// A running (or startable) bot.
///
/// `start`/`stop` are serialized by the run-handle mutex; `handle_message`
/// is serialized by its own mutex so that commands for one bot never run
/// concurrently, while the run-loop keeps going on its own task.
pub struct BotRuntime {
    ctx: BotContext,
    behavior: Arc<dyn BotBehaviorDyn>,
    settings: BotSettings,
    run: Mutex<Option<RunHandle>>,
    dispatch_lock: Mutex<()>,
    events: Option<EventBus>,
}

impl BotRuntime {
    /// Build the bot: built-in commands first, then the behavior's own.
    pub fn new(
        class_name: impl Into<String>,
        deps: BotDeps,
        behavior: Arc<dyn BotBehaviorDyn>,
        settings: BotSettings,
    ) -> Result<Self, BotError> {
        let mut commands = CommandRegistry::new();
        builtin::register(&mut commands)?;
        behavior.register_commands_dyn(&mut commands)?;

        let ctx = BotContext {
            name: deps.name,
            class_name: class_name.into(),
            channel: deps.channel,
            link: deps.link,
            channels: deps.channels,
            commands: Arc::new(commands),
            lifecycle: Arc::new(Lifecycle::new()),
            prefix: settings.prefix,
        };
        debug!(
            bot = %ctx.name,
            channel = %ctx.channel,
            commands = ctx.commands.len(),
            "bot initialized"
        );

        Ok(Self {
            ctx,
            behavior,
            settings,
            run: Mutex::new(None),
            dispatch_lock: Mutex::new(()),
            events: None,
        })
    }

    /// Publish lifecycle events on `events`.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn name(&self) -> &str {
        &self.ctx.name
    }

    pub fn class_name(&self) -> &str {
        &self.ctx.class_name
    }

    pub fn channel(&self) -> &ChannelRef {
        &self.ctx.channel
    }

    pub fn context(&self) -> &BotContext {
        &self.ctx
    }

    pub async fn state(&self) -> BotState {
        self.ctx.lifecycle.state().await
    }

    pub async fn descriptor(&self) -> BotDescriptor {
        let snapshot = self.ctx.lifecycle.snapshot().await;
        BotDescriptor {
            name: self.ctx.name.clone(),
            class_name: self.ctx.class_name.clone(),
            channel: self.ctx.channel.clone(),
            state: snapshot.state,
            started_at: snapshot.started_at,
            last_error: snapshot.last_error,
        }
    }

    /// `Created | Stopped -> Running`, spawning the run-loop.
    pub async fn start(&self) -> Result<(), BotError> {
        let mut run = self.run.lock().await;
        if !self.state().await.can_start() {
            warn!(bot = %self.ctx.name, "bot is already running");
            return Err(BotError::AlreadyRunning(self.ctx.name.clone()));
        }

        // A previous run that failed on its own has already exited.
        if let Some(previous) = run.take() {
            previous.task.abort();
        }

        let generation = self.ctx.lifecycle.begin_run().await;
        self.publish(MeshEvent::BotStarted {
            name: self.ctx.name.clone(),
        });
        let cancel = CancellationToken::new();
        let task = tokio::spawn(drive_run_loop(
            Arc::clone(&self.behavior),
            RunContext::new(self.ctx.clone(), cancel.clone()),
            generation,
            self.events.clone(),
        ));
        *run = Some(RunHandle { cancel, task });
        drop(run);

        info!(bot = %self.ctx.name, channel = %self.ctx.channel, "bot started");
        if self.settings.announce_lifecycle {
            self.ctx
                .say(format!("{} is now online!", self.ctx.name))
                .await;
        }
        Ok(())
    }

    /// `Running -> Stopped`, joining the run-loop within the shutdown timeout.
    ///
    /// A no-op for bots that are not running. On timeout the task is aborted,
    /// the bot is still marked `Stopped`, and `ShutdownTimeout` is returned.
    pub async fn stop(&self) -> Result<(), BotError> {
        let mut run = self.run.lock().await;
        if self.state().await != BotState::Running {
            debug!(bot = %self.ctx.name, "bot is not running");
            return Ok(());
        }

        info!(bot = %self.ctx.name, "stopping bot");
        let result = match run.take() {
            Some(RunHandle { cancel, mut task }) => {
                cancel.cancel();
                let timeout = self.settings.shutdown_timeout;
                match tokio::time::timeout(timeout, &mut task).await {
                    Ok(_) => Ok(()),
                    Err(_) => {
                        task.abort();
                        Err(BotError::ShutdownTimeout {
                            name: self.ctx.name.clone(),
                            timeout,
                        })
                    }
                }
            }
            None => Ok(()),
        };

        let error = result.as_ref().err().map(ToString::to_string);
        if let Some(error) = &error {
            warn!(bot = %self.ctx.name, %error, "run-loop did not exit in time, aborted");
        }
        let transitioned = self.ctx.lifecycle.end_run(error.clone()).await;
        drop(run);
        if !transitioned {
            // The run-loop ended on its own first and already reported it.
            debug!(bot = %self.ctx.name, "bot stopped itself before the stop request");
            return result;
        }
        info!(bot = %self.ctx.name, "bot stopped");
        self.publish(MeshEvent::BotStopped {
            name: self.ctx.name.clone(),
            error,
        });
        if self.settings.announce_lifecycle {
            self.ctx
                .say(format!("{} is going offline!", self.ctx.name))
                .await;
        }
        result
    }

    /// Parse `message` and run the matching command.
    ///
    /// Never fails: unknown commands and handler failures are reported in the
    /// returned outcome (and optionally relayed to the channel).
    pub async fn handle_message(&self, message: &InboundMessage) -> DispatchOutcome {
        let Some(parsed) = parse_command(&message.text, self.settings.prefix) else {
            return DispatchOutcome::Ignored;
        };
        let _serial = self.dispatch_lock.lock().await;
        let command = parsed.name.clone();
        let prefix = self.settings.prefix;

        let handler = match self.ctx.commands.resolve(&command) {
            Ok(entry) => Arc::clone(&entry.handler),
            Err(_) => {
                debug!(bot = %self.ctx.name, %command, "unknown command");
                if self.settings.unknown_command == UnknownCommandPolicy::Notify {
                    self.ctx
                        .say(format!(
                            "Unknown command: {prefix}{command}. Send {prefix}help for a list of commands."
                        ))
                        .await;
                }
                return DispatchOutcome::Unknown { command };
            }
        };

        info!(
            bot = %self.ctx.name,
            %command,
            from = %message.from_id,
            "handling command"
        );
        let invocation = Invocation::new(parsed, message.clone());
        let ctx = self.ctx.clone();
        let call = AssertUnwindSafe(async move { handler.call(ctx, invocation).await });
        let timeout = self.settings.handler_timeout;

        let result = match tokio::time::timeout(timeout, call.catch_unwind()).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(CommandError::Panicked(panic_message(panic.as_ref()))),
            Err(_) => Err(CommandError::TimedOut(timeout)),
        };

        match result {
            Ok(()) => DispatchOutcome::Handled { command },
            Err(error) => {
                warn!(bot = %self.ctx.name, %command, %error, "command failed");
                // Argument errors always go back to the sender.
                let usage = matches!(error, CommandError::InvalidArguments(_));
                if self.settings.relay_errors || usage {
                    self.ctx
                        .say(format!("Error running {prefix}{command}: {error}"))
                        .await;
                }
                DispatchOutcome::Failed {
                    command,
                    error: error.to_string(),
                }
            }
        }
    }

    fn publish(&self, event: MeshEvent) {
        if let Some(events) = &self.events {
            events.publish(event);
        }
    }
}

impl std::fmt::Debug for BotRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotRuntime")
            .field("ctx", &self.ctx)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

async fn drive_run_loop(
    behavior: Arc<dyn BotBehaviorDyn>,
    run_ctx: RunContext,
    generation: u64,
    events: Option<EventBus>,
) {
    let outcome = AssertUnwindSafe(behavior.run_loop_boxed(&run_ctx))
        .catch_unwind()
        .await;
    let failure = match outcome {
        Ok(Ok(())) => None,
        Ok(Err(error)) => Some(error.to_string()),
        Err(panic) => Some(format!(
            "run-loop panicked: {}",
            panic_message(panic.as_ref())
        )),
    };

    // Requested stops are settled by `stop()`.
    if run_ctx.is_stopping() {
        return;
    }

    let bot = run_ctx.bot();
    let settled = match &failure {
        Some(failure) => bot.lifecycle.fail(generation, failure.clone()).await,
        None => bot.lifecycle.finish(generation).await,
    };
    if !settled {
        return;
    }

    match &failure {
        Some(failure) => error!(bot = %bot.name, error = %failure, "run-loop failed, bot stopped"),
        None => info!(bot = %bot.name, "run-loop finished, bot stopped"),
    }
    if let Some(events) = events {
        events.publish(MeshEvent::BotStopped {
            name: bot.name.clone(),
            error: failure,
        });
    }
}
