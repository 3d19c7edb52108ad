use crate::relay::{ChunkSource, Frame};
use anyhow::{Context, Result};
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use futures::stream::StreamExt;

/// Adapts an upgraded WebSocket to the relay's [`ChunkSource`]
pub struct WsChunkSource {
    socket: WebSocket,
}

impl WsChunkSource {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

#[async_trait::async_trait]
impl ChunkSource for WsChunkSource {
    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        while let Some(msg) = self.socket.next().await {
            match msg.context("Failed to receive from producer")? {
                Message::Binary(data) => return Ok(Some(Frame::Data(data))),
                // Producers that send text are relayed byte for byte
                Message::Text(text) => return Ok(Some(Frame::Data(text.into_bytes()))),
                Message::Close(_) => return Ok(Some(Frame::Close)),
                // Pongs are answered by axum
                Message::Ping(_) | Message::Pong(_) => continue,
            }
        }

        Ok(None)
    }

    async fn close(&mut self) -> Result<()> {
        self.socket
            .send(Message::Close(Some(CloseFrame {
                code: close_code::NORMAL,
                reason: "Closed by producer".into(),
            })))
            .await
            .context("Failed to acknowledge close")
    }
}
