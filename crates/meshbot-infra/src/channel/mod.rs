//! `ChannelDirectory` implementations.

pub mod slots;

pub use slots::SlotChannelDirectory;
