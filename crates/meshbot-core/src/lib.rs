//! Bot orchestration and command dispatch engine for meshbot.
//!
//! This crate defines the "ports" the engine consumes (`NodeLink`,
//! `ChannelDirectory`) and everything built on them: per-bot command
//! registries and dispatch, the bot runtime with its cooperative run-loop,
//! the supervisor that owns all bots, and the inbound delivery path. It
//! depends only on `meshbot-types` -- never on `meshbot-infra` or any IO crate.

pub mod bot;
pub mod bots;
pub mod channel;
pub mod command;
pub mod delivery;
pub mod event;
pub mod link;
pub mod supervisor;

#[cfg(test)]
pub(crate) mod testing;
