//! Shared domain types for meshbot.
//!
//! This crate contains the domain types used across the meshbot workspace:
//! channels, bot descriptors and lifecycle states, inbound mesh messages,
//! events, configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod bot;
pub mod channel;
pub mod config;
pub mod error;
pub mod event;
pub mod message;
