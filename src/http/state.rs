use crate::broadcast::BroadcastSession;
use crate::relay::IngestRelay;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The single broadcast session, shared by every connection
    pub session: Arc<BroadcastSession>,

    /// Relay feeding producer connections into `session`
    pub relay: IngestRelay,
}

impl AppState {
    pub fn new(session: Arc<BroadcastSession>) -> Self {
        let relay = IngestRelay::new(session.clone());
        Self { session, relay }
    }
}
