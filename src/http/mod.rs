//! HTTP surface around the broadcast core
//!
//! - GET /ws/stream - WebSocket ingest for the live producer
//! - GET /live/* - HLS playlist and segments
//! - GET /status - Broadcast session status
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;
mod ws;

pub use routes::create_router;
pub use state::AppState;
pub use ws::WsChunkSource;
