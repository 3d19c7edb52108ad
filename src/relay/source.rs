use anyhow::Result;

/// One message received from a producer connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Raw audio bytes, forwarded as-is
    Data(Vec<u8>),
    /// The producer asked to close the connection
    Close,
}

/// A duplex producer connection, reduced to what the relay needs
///
/// Implementations wrap a transport (WebSocket, test script, ...).
#[async_trait::async_trait]
pub trait ChunkSource: Send {
    /// Wait for the next frame.
    ///
    /// `Ok(None)` means the transport ended without a close frame.
    async fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Acknowledge a close frame received from the producer
    async fn close(&mut self) -> Result<()>;
}
