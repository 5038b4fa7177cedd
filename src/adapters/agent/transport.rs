//! WebSocket transport for the E-IMZO agent.
//!
//! One connection per exchange: connect, send the request (in size-bounded
//! frames), wait for the complete reply, close. The agent never pipelines, so
//! there is nothing to keep alive between calls.

use crate::domain::types::AgentUrl;
use crate::infra::error::{SigningError, SigningResult};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::{Data, OpCode};
use tokio_tungstenite::tungstenite::protocol::frame::Frame;
use tokio_tungstenite::tungstenite::Message;

/// Outgoing frame payload size, matching the original sender's buffer.
pub const FRAME_BUFFER_SIZE: usize = 8192;

/// Default bound on a whole request/response exchange.
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-exchange WebSocket transport.
#[derive(Debug, Clone)]
pub struct AgentTransport {
    endpoint: AgentUrl,
    timeout: Duration,
}

impl AgentTransport {
    #[must_use]
    pub fn new(endpoint: AgentUrl) -> Self {
        Self {
            endpoint,
            timeout: DEFAULT_EXCHANGE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn endpoint(&self) -> &AgentUrl {
        &self.endpoint
    }

    /// Send one request and wait for the complete reply.
    ///
    /// # Errors
    ///
    /// Returns `AgentError` on connect, send or read failure, and on timeout.
    pub async fn roundtrip(&self, request: &str) -> SigningResult<String> {
        tokio::time::timeout(self.timeout, self.exchange(request))
            .await
            .map_err(|_| {
                SigningError::AgentError(format!(
                    "Agent did not reply within {:?} at {}",
                    self.timeout, self.endpoint
                ))
            })?
    }

    async fn exchange(&self, request: &str) -> SigningResult<String> {
        log::debug!("connecting to agent at {}", self.endpoint);
        let (mut ws, _) = connect_async(self.endpoint.as_str()).await.map_err(|e| {
            SigningError::AgentError(format!("Failed to connect to agent: {e}"))
        })?;

        let bytes = request.as_bytes();
        if bytes.len() <= FRAME_BUFFER_SIZE {
            ws.send(Message::Text(request.to_string())).await?;
        } else {
            // Oversized requests (large PKCS7 containers) go out as an
            // initial text frame plus continuations, final flag on the last.
            for (index, (chunk, is_final)) in split_frames(bytes, FRAME_BUFFER_SIZE)
                .into_iter()
                .enumerate()
            {
                let opcode = if index == 0 {
                    OpCode::Data(Data::Text)
                } else {
                    OpCode::Data(Data::Continue)
                };
                let frame = Frame::message(chunk.to_vec(), opcode, is_final);
                ws.feed(Message::Frame(frame)).await?;
            }
            ws.flush().await?;
        }

        let reply = loop {
            let message = ws.next().await.ok_or_else(|| {
                SigningError::AgentError("Agent closed the connection before replying".to_string())
            })??;
            match message {
                Message::Text(text) => break text,
                Message::Binary(data) => {
                    break String::from_utf8(data).map_err(|e| {
                        SigningError::AgentError(format!("Agent reply is not UTF-8: {e}"))
                    })?
                }
                Message::Close(_) => {
                    return Err(SigningError::AgentError(
                        "Agent closed the connection before replying".to_string(),
                    ))
                }
                // Control frames between request and reply are fine.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        };

        if let Err(e) = ws.close(None).await {
            log::debug!("agent connection close failed: {e}");
        }

        Ok(reply)
    }
}

/// Split a payload into frame-sized chunks, flagging the last one final.
fn split_frames(payload: &[u8], frame_size: usize) -> Vec<(&[u8], bool)> {
    if payload.is_empty() {
        return vec![(payload, true)];
    }
    let count = payload.chunks(frame_size).count();
    payload
        .chunks(frame_size)
        .enumerate()
        .map(|(i, chunk)| (chunk, i + 1 == count))
        .collect()
}
