use super::status::StartOutcome;

/// Destination for a live producer's audio
///
/// Implemented by [`BroadcastSession`](super::BroadcastSession); the relay
/// only ever talks to this trait, so tests can substitute a recorder.
/// None of these operations fail outward: failures become `is_active() == false`.
#[async_trait::async_trait]
pub trait BroadcastSink: Send + Sync {
    /// Begin a session (no-op if one is already running)
    async fn start(&self) -> StartOutcome;

    /// Forward one chunk of raw audio (dropped if no session is running)
    async fn write(&self, chunk: &[u8]);

    /// End the current session (no-op if none is running)
    async fn stop(&self);

    /// Whether a session is currently accepting audio
    fn is_active(&self) -> bool;
}
