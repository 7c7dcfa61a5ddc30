//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`; `/health` sits at the root.
//! Middleware: CORS, request tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Bots
        .route(
            "/bots",
            get(handlers::bot::list_bots).post(handlers::bot::create_bot),
        )
        .route("/bots/start-all", post(handlers::bot::start_all))
        .route("/bots/stop-all", post(handlers::bot::stop_all))
        .route(
            "/bots/{name}",
            get(handlers::bot::get_bot).delete(handlers::bot::delete_bot),
        )
        .route("/bots/{name}/start", post(handlers::bot::start_bot))
        .route("/bots/{name}/stop", post(handlers::bot::stop_bot))
        .route("/classes", get(handlers::bot::list_classes))
        // Channels
        .route(
            "/channels",
            get(handlers::channel::list_channels).post(handlers::channel::create_channel),
        )
        // Traffic
        .route("/messages", post(handlers::message::send_message))
        .route("/events", get(handlers::ws::ws_handler))
        .route("/status", get(handlers::status::get_status));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
