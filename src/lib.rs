pub mod broadcast;
pub mod config;
pub mod http;
pub mod relay;

pub use broadcast::{
    BroadcastConfig, BroadcastSession, BroadcastSink, EncoderSettings, SessionStatus,
    StartOutcome,
};
pub use config::Config;
pub use http::{create_router, AppState, WsChunkSource};
pub use relay::{ChunkSource, Frame, IngestRelay, RelayStats};
