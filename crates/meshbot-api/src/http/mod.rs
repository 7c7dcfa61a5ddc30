//! Dashboard REST API.
//!
//! Axum router at `/api/v1/` with an envelope response format, plus a
//! WebSocket event feed at `/api/v1/events`.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
