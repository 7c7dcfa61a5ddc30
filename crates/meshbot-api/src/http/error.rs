//! Application error type mapping to HTTP status codes and envelope format.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use meshbot_types::error::{BotError, ChannelError, LinkError, SupervisorError};

use crate::http::response::ApiResponse;

#[derive(Debug)]
pub enum AppError {
    Supervisor(SupervisorError),
    Channel(ChannelError),
    Link(LinkError),
    Validation(String),
}

impl From<SupervisorError> for AppError {
    fn from(e: SupervisorError) -> Self {
        AppError::Supervisor(e)
    }
}

impl From<ChannelError> for AppError {
    fn from(e: ChannelError) -> Self {
        AppError::Channel(e)
    }
}

impl From<LinkError> for AppError {
    fn from(e: LinkError) -> Self {
        AppError::Link(e)
    }
}

fn link_status(e: &LinkError) -> (StatusCode, &'static str) {
    match e {
        LinkError::NotConnected | LinkError::Closed => {
            (StatusCode::SERVICE_UNAVAILABLE, "NODE_UNAVAILABLE")
        }
        LinkError::Transport(_) => (StatusCode::BAD_GATEWAY, "NODE_ERROR"),
    }
}

fn channel_status(e: &ChannelError) -> (StatusCode, &'static str) {
    match e {
        ChannelError::InvalidName(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        ChannelError::NotFound(_) => (StatusCode::NOT_FOUND, "CHANNEL_NOT_FOUND"),
        ChannelError::NoFreeSlot { .. } => (StatusCode::CONFLICT, "NO_FREE_SLOT"),
        ChannelError::Link(e) => link_status(e),
    }
}

impl AppError {
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Supervisor(e) => match e {
                SupervisorError::NotFound(_) => (StatusCode::NOT_FOUND, "BOT_NOT_FOUND"),
                SupervisorError::DuplicateName(_) => (StatusCode::CONFLICT, "NAME_CONFLICT"),
                SupervisorError::DuplicateClass(_) => (StatusCode::CONFLICT, "CLASS_CONFLICT"),
                SupervisorError::UnknownClass(_) => (StatusCode::BAD_REQUEST, "UNKNOWN_CLASS"),
                SupervisorError::InvalidName(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                SupervisorError::Bot(BotError::AlreadyRunning(_)) => {
                    (StatusCode::CONFLICT, "ALREADY_RUNNING")
                }
                SupervisorError::Bot(BotError::ShutdownTimeout { .. }) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "SHUTDOWN_TIMEOUT")
                }
                SupervisorError::Bot(_) => (StatusCode::INTERNAL_SERVER_ERROR, "BOT_ERROR"),
                SupervisorError::Channel(e) => channel_status(e),
            },
            AppError::Channel(e) => channel_status(e),
            AppError::Link(e) => link_status(e),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Supervisor(e) => e.to_string(),
            AppError::Channel(e) => e.to_string(),
            AppError::Link(e) => e.to_string(),
            AppError::Validation(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        if status.is_server_error() {
            tracing::warn!(code, error = %self.message(), "request failed");
        }
        (status, Json(ApiResponse::error(code, &self.message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn maps_supervisor_errors() {
        let cases = [
            (SupervisorError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (SupervisorError::DuplicateName("x".into()), StatusCode::CONFLICT),
            (SupervisorError::UnknownClass("x".into()), StatusCode::BAD_REQUEST),
            (SupervisorError::InvalidName("x".into()), StatusCode::BAD_REQUEST),
            (
                BotError::AlreadyRunning("x".into()).into(),
                StatusCode::CONFLICT,
            ),
            (
                BotError::ShutdownTimeout {
                    name: "x".into(),
                    timeout: Duration::from_secs(1),
                }
                .into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ChannelError::NoFreeSlot { max: 8 }.into(),
                StatusCode::CONFLICT,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(AppError::from(error).status().0, expected);
        }
    }

    #[test]
    fn link_down_is_unavailable() {
        let (status, code) = AppError::from(LinkError::NotConnected).status();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(code, "NODE_UNAVAILABLE");
    }
}
