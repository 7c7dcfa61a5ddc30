//! Outbound message handler for the REST API.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use meshbot_types::channel::ChannelId;
use meshbot_types::message::SendMessageRequest;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SentMessage {
    pub channel: ChannelId,
    pub text: String,
}

/// POST /api/v1/messages - Send text on a channel.
pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<ApiResponse<SentMessage>>, AppError> {
    let start = Instant::now();

    if body.text.trim().is_empty() {
        return Err(AppError::Validation("message text must not be empty".to_string()));
    }
    // Unknown channel ids are rejected before touching the node.
    let channel = state.supervisor.channels().get(body.channel).await?;

    state.supervisor.send_message(&body.text, channel.id).await?;
    tracing::info!(channel = %channel, "message sent from dashboard");

    Ok(Json(ApiResponse::success(
        SentMessage {
            channel: channel.id,
            text: body.text,
        },
        start,
    )))
}
