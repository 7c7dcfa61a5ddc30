//! Node and fleet status handler.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use meshbot_types::bot::BotState;

use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub version: &'static str,
    pub node: NodeStatus,
    pub bots: BotCounts,
    pub classes: Vec<String>,
    pub command_prefix: char,
    pub data_dir: String,
    pub uptime_secs: i64,
}

#[derive(Debug, Serialize)]
pub struct NodeStatus {
    pub endpoint: String,
    pub connected: bool,
}

#[derive(Debug, Default, Serialize)]
pub struct BotCounts {
    pub total: usize,
    pub created: usize,
    pub running: usize,
    pub stopped: usize,
}

/// GET /api/v1/status
pub async fn get_status(State(state): State<AppState>) -> Json<ApiResponse<StatusReport>> {
    let start = Instant::now();
    let supervisor = &state.supervisor;

    let mut bots = BotCounts::default();
    for bot in supervisor.list_bots().await {
        bots.total += 1;
        match bot.state {
            BotState::Created => bots.created += 1,
            BotState::Running => bots.running += 1,
            BotState::Stopped => bots.stopped += 1,
        }
    }

    let report = StatusReport {
        version: env!("CARGO_PKG_VERSION"),
        node: NodeStatus {
            endpoint: supervisor.link().describe(),
            connected: supervisor.link().is_connected(),
        },
        bots,
        classes: supervisor.list_classes(),
        command_prefix: state.config.dispatch.command_prefix,
        data_dir: state.data_dir.display().to_string(),
        uptime_secs: (chrono::Utc::now() - state.started_at).num_seconds(),
    };

    Json(ApiResponse::success(report, start))
}
