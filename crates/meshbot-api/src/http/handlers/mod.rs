//! REST API handler modules.

pub mod bot;
pub mod channel;
pub mod message;
pub mod status;
pub mod ws;
