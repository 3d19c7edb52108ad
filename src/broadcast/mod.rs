//! Broadcast session management
//!
//! This module owns the external encoder that turns a producer's raw audio
//! into an HLS playlist plus rolling segments:
//! - Encoder launch and the argument contract listeners rely on
//! - Clearing the output directory before each session
//! - Forwarding encoder diagnostics to the log
//! - Backpressure-aware writes with crash detection
//! - Graceful stop with a bounded wait before killing the encoder

mod config;
mod session;
mod sink;
mod status;

pub use config::{BroadcastConfig, EncoderSettings, PLAYLIST_NAME};
pub use session::BroadcastSession;
pub use sink::BroadcastSink;
pub use status::{SessionStatus, StartOutcome};
