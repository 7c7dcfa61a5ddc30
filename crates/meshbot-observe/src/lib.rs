pub mod tracing_setup;

pub use tracing_setup::{TracingGuard, TracingOptions, init_tracing, shutdown_tracing};
