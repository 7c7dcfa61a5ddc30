//! Channel handlers for the REST API.

use std::time::Instant;

use axum::Json;
use axum::extract::State;

use meshbot_types::channel::{ChannelRef, CreateChannelRequest};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/channels
pub async fn list_channels(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ChannelRef>>>, AppError> {
    let start = Instant::now();
    let channels = state.supervisor.channels().list_channels().await?;
    Ok(Json(
        ApiResponse::success(channels, start).with_link("self", "/api/v1/channels"),
    ))
}

/// POST /api/v1/channels - Create a channel, or return the existing one.
pub async fn create_channel(
    State(state): State<AppState>,
    Json(body): Json<CreateChannelRequest>,
) -> Result<Json<ApiResponse<ChannelRef>>, AppError> {
    let start = Instant::now();
    let channel = state.supervisor.channels().create_channel(&body.name).await?;
    Ok(Json(ApiResponse::success(channel, start)))
}
