//! `NodeLink` implementations.

pub mod frame;
pub mod loopback;
pub mod tcp;

pub use loopback::LoopbackLink;
pub use tcp::{TcpLinkConfig, TcpNodeLink};
