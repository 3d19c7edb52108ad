use super::handlers;
use super::state::AppState;
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    let segments = ServeDir::new(state.session.output_dir());

    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Producer ingest
        .route("/ws/stream", get(handlers::ingest_stream))
        // Broadcast status
        .route("/status", get(handlers::session_status))
        // Playlist and segments for listeners
        .nest_service("/live", segments)
        // Players are usually served from another origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
