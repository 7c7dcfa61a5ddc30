//! Event bus for supervisor and delivery events.

pub mod bus;

pub use bus::{DEFAULT_EVENT_CAPACITY, EventBus};
