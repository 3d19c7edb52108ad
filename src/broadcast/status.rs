use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Snapshot of the broadcast session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    /// Whether an encoder is currently accepting audio
    pub active: bool,

    /// Identifier of the current (or most recent) session
    pub session_id: Option<String>,

    /// When the current (or most recent) session started
    pub started_at: Option<DateTime<Utc>>,

    /// Chunks delivered to the encoder during that session
    pub chunks_written: u64,

    /// Bytes delivered to the encoder during that session
    pub bytes_written: u64,

    /// Playlist listeners should load
    pub playlist: PathBuf,
}

/// Result of a `start` call.
///
/// `start` never fails outward; this only tells the caller which path was
/// taken. The session's `is_active` flag remains the source of truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new encoder process was launched
    Started,
    /// A session was already running; nothing was done
    AlreadyActive,
    /// The encoder binary does not exist at the configured path
    EncoderMissing,
    /// The encoder process could not be spawned
    LaunchFailed,
}

impl StartOutcome {
    pub fn is_running(self) -> bool {
        matches!(self, StartOutcome::Started | StartOutcome::AlreadyActive)
    }
}
