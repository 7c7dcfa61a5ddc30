//! Bot lifecycle handlers for the REST API.

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use meshbot_core::supervisor::BatchReport;
use meshbot_types::bot::{BotDescriptor, BotState, CreateBotRequest};
use meshbot_types::channel::ChannelId;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Query parameters for `GET /bots`.
#[derive(Debug, Default, Deserialize)]
pub struct BotListQuery {
    /// Only bots in this state (`created`, `running`, `stopped`).
    pub state: Option<String>,
    /// Only bots bound to this channel id.
    pub channel: Option<u32>,
}

fn bot_links(resp: ApiResponse<BotDescriptor>) -> ApiResponse<BotDescriptor> {
    let name = resp
        .data
        .as_ref()
        .map(|bot| bot.name.clone())
        .unwrap_or_default();
    resp.with_link("self", &format!("/api/v1/bots/{name}"))
        .with_link("start", &format!("/api/v1/bots/{name}/start"))
        .with_link("stop", &format!("/api/v1/bots/{name}/stop"))
}

/// GET /api/v1/bots - List bots, optionally filtered.
pub async fn list_bots(
    State(state): State<AppState>,
    Query(query): Query<BotListQuery>,
) -> Result<Json<ApiResponse<Vec<BotDescriptor>>>, AppError> {
    let start = Instant::now();

    let state_filter = match &query.state {
        Some(s) => Some(s.parse::<BotState>().map_err(AppError::Validation)?),
        None => None,
    };
    let channel_filter = query.channel.map(ChannelId);

    let bots: Vec<BotDescriptor> = state
        .supervisor
        .list_bots()
        .await
        .into_iter()
        .filter(|bot| state_filter.is_none_or(|s| bot.state == s))
        .filter(|bot| channel_filter.is_none_or(|c| bot.channel.id == c))
        .collect();

    Ok(Json(
        ApiResponse::success(bots, start).with_link("self", "/api/v1/bots"),
    ))
}

/// POST /api/v1/bots - Create a bot on a named channel.
pub async fn create_bot(
    State(state): State<AppState>,
    Json(body): Json<CreateBotRequest>,
) -> Result<Json<ApiResponse<BotDescriptor>>, AppError> {
    let start = Instant::now();

    let mut bot = state
        .supervisor
        .create_bot_on(&body.class_name, &body.name, &body.channel)
        .await?;
    if body.start {
        bot = state.supervisor.start_bot(&bot.name).await?;
    }

    Ok(Json(bot_links(ApiResponse::success(bot, start))))
}

/// GET /api/v1/bots/{name}
pub async fn get_bot(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<BotDescriptor>>, AppError> {
    let start = Instant::now();
    let bot = state.supervisor.get_bot(&name).await?;
    Ok(Json(bot_links(ApiResponse::success(bot, start))))
}

/// DELETE /api/v1/bots/{name} - Stop (if running) and remove a bot.
pub async fn delete_bot(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<BotDescriptor>>, AppError> {
    let start = Instant::now();
    let bot = state.supervisor.remove_bot(&name).await?;
    Ok(Json(ApiResponse::success(bot, start)))
}

/// POST /api/v1/bots/{name}/start
pub async fn start_bot(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<BotDescriptor>>, AppError> {
    let start = Instant::now();
    let bot = state.supervisor.start_bot(&name).await?;
    Ok(Json(bot_links(ApiResponse::success(bot, start))))
}

/// POST /api/v1/bots/{name}/stop
pub async fn stop_bot(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<BotDescriptor>>, AppError> {
    let start = Instant::now();
    let bot = state.supervisor.stop_bot(&name).await?;
    Ok(Json(bot_links(ApiResponse::success(bot, start))))
}

/// POST /api/v1/bots/start-all
pub async fn start_all(State(state): State<AppState>) -> Json<ApiResponse<BatchReport>> {
    let start = Instant::now();
    let report = state.supervisor.start_all().await;
    Json(ApiResponse::success(report, start))
}

/// POST /api/v1/bots/stop-all
pub async fn stop_all(State(state): State<AppState>) -> Json<ApiResponse<BatchReport>> {
    let start = Instant::now();
    let report = state.supervisor.stop_all().await;
    Json(ApiResponse::success(report, start))
}

/// GET /api/v1/classes - Registered bot classes, sorted.
pub async fn list_classes(State(state): State<AppState>) -> Json<ApiResponse<Vec<String>>> {
    let start = Instant::now();
    Json(ApiResponse::success(state.supervisor.list_classes(), start))
}
