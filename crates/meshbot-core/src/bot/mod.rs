//! Bot lifecycle and per-bot command dispatch.
//!
//! A bot is a [`BotRuntime`] (lifecycle, run-loop task, dispatcher) wrapping a
//! user-supplied [`BotBehavior`] (custom commands, periodic work).

pub mod behavior;
pub mod builtin;
pub mod context;
pub mod lifecycle;
pub mod runtime;
pub mod settings;

use std::any::Any;

pub use behavior::{BotBehavior, BotBehaviorDyn, BotDeps};
pub use context::{BotContext, RunContext};
pub use lifecycle::{Lifecycle, LifecycleSnapshot};
pub use runtime::BotRuntime;
pub use settings::BotSettings;

/// What happened to one inbound message inside one bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not a command (no prefix).
    Ignored,
    /// Prefixed, but no such command on this bot.
    Unknown { command: String },
    /// The handler ran to completion.
    Handled { command: String },
    /// The handler returned an error, panicked, or timed out.
    Failed { command: String, error: String },
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
