use super::state::AppState;
use super::ws::WsChunkSource;
use axum::{
    extract::{ws::rejection::WebSocketUpgradeRejection, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /ws/stream
/// Accept a live producer and relay its audio into the broadcast
pub async fn ingest_stream(
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            warn!("Rejected non-WebSocket ingest request: {}", rejection);
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: "Expected a WebSocket upgrade".to_string(),
                }),
            )
                .into_response();
        }
    };

    let relay = state.relay.clone();
    ws.on_upgrade(move |socket| async move {
        match relay.handle(WsChunkSource::new(socket)).await {
            Ok(stats) => info!(
                "Ingest connection closed after {} bytes",
                stats.bytes_forwarded
            ),
            Err(e) => error!("Ingest connection terminated: {:#}", e),
        }
    })
}

/// GET /status
/// Broadcast session status
pub async fn session_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.status().await))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
