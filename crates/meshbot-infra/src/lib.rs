//! Infrastructure layer for meshbot.
//!
//! Implementations of the ports defined in `meshbot-core`: node links (TCP
//! gateway bridge, in-memory loopback), the node-style slot channel table,
//! and the `config.toml` loader.

pub mod channel;
pub mod config;
pub mod link;
