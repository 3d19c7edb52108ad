use super::source::{ChunkSource, Frame};
use crate::broadcast::BroadcastSink;
use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Totals for one producer connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelayStats {
    /// Data frames handed to the broadcast sink.
    ///
    /// Counted on hand-off, not delivery: a sink with no running session
    /// drops the chunk. The session's own status reports what reached the
    /// encoder.
    pub chunks_forwarded: u64,
    /// Bytes handed to the broadcast sink (same caveat)
    pub bytes_forwarded: u64,
}

/// Bridges one live producer connection to the broadcast session
#[derive(Clone)]
pub struct IngestRelay {
    sink: Arc<dyn BroadcastSink>,
}

impl IngestRelay {
    pub fn new(sink: Arc<dyn BroadcastSink>) -> Self {
        Self { sink }
    }

    /// Relay a producer connection until it closes.
    ///
    /// The broadcast is started on entry and stopped exactly once on every
    /// exit path, including errors and cancellation of this future. Receive
    /// errors are returned only after the stop has completed.
    pub async fn handle<S: ChunkSource>(&self, mut source: S) -> Result<RelayStats> {
        info!("Producer connected, starting broadcast");

        let outcome = self.sink.start().await;
        if !outcome.is_running() {
            warn!(
                "Broadcast did not start ({:?}), incoming audio will be dropped",
                outcome
            );
        }

        let guard = StopGuard::new(Arc::clone(&self.sink));
        let result = self.pump(&mut source).await;
        guard.release().await;

        match &result {
            Ok(stats) => info!(
                "Producer disconnected ({} chunks, {} bytes)",
                stats.chunks_forwarded, stats.bytes_forwarded
            ),
            Err(e) => warn!("Producer connection failed: {:#}", e),
        }

        result
    }

    async fn pump<S: ChunkSource>(&self, source: &mut S) -> Result<RelayStats> {
        let mut stats = RelayStats::default();

        loop {
            match source.next_frame().await? {
                Some(Frame::Data(chunk)) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    self.sink.write(&chunk).await;
                    stats.chunks_forwarded += 1;
                    stats.bytes_forwarded += chunk.len() as u64;
                }
                Some(Frame::Close) => {
                    debug!("Close frame received");
                    if let Err(e) = source.close().await {
                        debug!("Failed to acknowledge close: {}", e);
                    }
                    break;
                }
                None => {
                    debug!("Producer stream ended without a close frame");
                    break;
                }
            }
        }

        Ok(stats)
    }
}

/// Stops the broadcast when the relay leaves its loop.
///
/// `release` stops inline. If the guard is dropped unreleased (the relay
/// future was cancelled or panicked), the stop is spawned on the runtime.
struct StopGuard {
    sink: Option<Arc<dyn BroadcastSink>>,
}

impl StopGuard {
    fn new(sink: Arc<dyn BroadcastSink>) -> Self {
        Self { sink: Some(sink) }
    }

    async fn release(mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop().await;
        }
    }
}

impl Drop for StopGuard {
    fn drop(&mut self) {
        let Some(sink) = self.sink.take() else {
            return;
        };

        warn!("Relay aborted, stopping broadcast in background");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    sink.stop().await;
                });
            }
            Err(_) => warn!("No runtime available, broadcast left to its owner"),
        }
    }
}
