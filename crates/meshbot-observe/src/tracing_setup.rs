//! Tracing subscriber initialization: console output (pretty or JSON), an
//! optional daily-rolling log file, and optional OpenTelemetry span export.
//!
//! # Usage
//!
//! ```no_run
//! use meshbot_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};
//!
//! let _guard = init_tracing(&TracingOptions::default()).unwrap();
//! tracing::info!("node link up");
//! shutdown_tracing();
//! ```

use std::path::PathBuf;
use std::sync::OnceLock;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Stores the OTel tracer provider so it can be shut down cleanly on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// File name prefix for rolled log files (`meshbot.log.YYYY-MM-DD`).
pub const LOG_FILE_PREFIX: &str = "meshbot.log";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TracingOptions {
    /// Emit console logs as JSON lines instead of human-readable text.
    pub json: bool,
    /// Also write logs to a daily-rolling file in this directory.
    pub log_dir: Option<PathBuf>,
    /// Bridge spans to OpenTelemetry with a stdout exporter.
    pub otel: bool,
    /// Number of `-v` flags; used when `RUST_LOG` is unset.
    pub verbosity: u8,
}

/// Keeps the non-blocking file writer alive. Drop it last.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug)]
pub struct TracingGuard {
    _file: Option<WorkerGuard>,
}

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialize the global tracing subscriber.
///
/// Respects `RUST_LOG`; falls back to [`default_directive`] otherwise.
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set.
pub fn init_tracing(options: &TracingOptions) -> Result<TracingGuard, Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(options.verbosity)));

    let (json_layer, pretty_layer) = if options.json {
        (
            Some(tracing_subscriber::fmt::layer().json().with_target(true)),
            None,
        )
    } else {
        (None, Some(tracing_subscriber::fmt::layer().with_target(true)))
    };

    let (file_layer, file_guard) = match &options.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let otel_layer = if options.otel {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("meshbot");
        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .with(file_layer)
        .with(otel_layer)
        .try_init()?;

    Ok(TracingGuard { _file: file_guard })
}

/// Flush pending spans and shut down the OpenTelemetry tracer provider.
///
/// No-op when OTel was not enabled.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get() {
        if let Err(e) = provider.shutdown() {
            eprintln!("Warning: OTel tracer provider shutdown error: {e}");
        }
    }
}
