//! meshbot entry point.
//!
//! Binary name: `meshbot`
//!
//! Loads configuration, applies command-line overrides, then prints
//! information (`config`, `classes`) or runs the bots (`run`).

mod cli;
mod http;
mod state;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use meshbot_infra::config::{
    config_path, default_log_dir, load_config_file, resolve_data_dir,
};
use meshbot_observe::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = resolve_data_dir();
    let source = cli.config.clone().unwrap_or_else(|| config_path(&data_dir));
    let mut config = load_config_file(&source).await;

    match cli.command {
        Commands::Config => cli::config::show(&config, &source, cli.json)?,

        Commands::Classes => cli::classes::list(&config, cli.json)?,

        Commands::Run(args) => {
            args.apply(&mut config);

            let log_dir = config
                .logging
                .log_dir
                .as_ref()
                .map(PathBuf::from)
                .unwrap_or_else(|| default_log_dir(&data_dir));
            tokio::fs::create_dir_all(&log_dir)
                .await
                .with_context(|| format!("failed to create log dir {}", log_dir.display()))?;

            let _guard = init_tracing(&TracingOptions {
                json: cli.json || config.logging.json,
                log_dir: Some(log_dir),
                otel: config.logging.otel,
                verbosity: cli.verbose,
            })
            .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;
            tracing::info!(config = %source.display(), "configuration loaded");

            let result = cli::run::run(&args, config, data_dir).await;
            shutdown_tracing();
            result?;
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
