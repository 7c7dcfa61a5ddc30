//! `meshbot run`: wire the engine, serve the dashboard, shut down cleanly.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;
use meshbot_core::delivery::spawn_delivery;
use meshbot_core::link::BoxNodeLink;
use meshbot_core::supervisor::BatchReport;
use meshbot_infra::link::{LoopbackLink, TcpLinkConfig, TcpNodeLink};
use meshbot_types::config::GlobalConfig;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cli::RunArgs;
use crate::http::router::build_router;
use crate::state::AppState;

fn build_link(args: &RunArgs, config: &GlobalConfig) -> BoxNodeLink {
    if args.loopback {
        BoxNodeLink::new(LoopbackLink::new().with_echo(true))
    } else {
        BoxNodeLink::new(TcpNodeLink::connect(TcpLinkConfig::from(&config.node)))
    }
}

fn log_batch(action: &str, report: &BatchReport) {
    for failure in &report.failed {
        warn!(bot = %failure.name, error = %failure.error, "failed to {action} bot");
    }
    info!(
        ok = report.succeeded.len(),
        failed = report.failed.len(),
        skipped = report.skipped.len(),
        "{action} all bots"
    );
}

pub async fn run(args: &RunArgs, config: GlobalConfig, data_dir: PathBuf) -> Result<()> {
    let link = build_link(args, &config);
    info!(link = %link.describe(), "node link ready");

    let ui_addr = format!("{}:{}", config.ui.host, config.ui.port);
    let listener = tokio::net::TcpListener::bind(&ui_addr)
        .await
        .with_context(|| format!("failed to bind dashboard on {ui_addr}"))?;

    let test_channel = args.create_test_channel.then(|| config.test_channel.clone());
    let state = AppState::init(config, data_dir, link.clone()).await?;
    let supervisor = Arc::clone(&state.supervisor);

    if let Some(name) = test_channel {
        match supervisor.channels().create_channel(&name).await {
            Ok(channel) => info!(channel = %channel, "test channel ready"),
            Err(e) => error!(channel = %name, error = %e, "failed to create test channel"),
        }
    }

    if args.start_bots {
        log_batch("start", &supervisor.start_all().await);
    }

    let delivery_cancel = CancellationToken::new();
    let delivery = spawn_delivery(
        Arc::clone(&supervisor),
        link.subscribe(),
        delivery_cancel.clone(),
    );

    println!(
        "  {} meshbot dashboard API on {}",
        style("📡").bold(),
        style(format!("http://{ui_addr}/api/v1")).cyan()
    );
    println!("  {}", style("Press Ctrl+C to stop").dim());

    let served = axum::serve(listener, build_router(state))
        .with_graceful_shutdown(crate::shutdown_signal())
        .await;
    if let Err(e) = &served {
        error!(error = %e, "dashboard server failed");
    }

    info!("shutting down");
    log_batch("stop", &supervisor.stop_all().await);
    delivery_cancel.cancel();
    if let Err(e) = delivery.await {
        warn!(error = %e, "delivery task ended abnormally");
    }
    link.close().await;

    served.context("dashboard server failed")
}
