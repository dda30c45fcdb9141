//! WebSocket transport

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::{GatewayError, GatewayResult};
use crate::events::DisconnectReason;
use crate::protocol::GatewayMessage;
use crate::transport::{Connector, TransportEvent, TransportHandle, DEFAULT_BUFFER_SIZE};

/// Default time allowed for the opening handshake
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens `ws://` connections with tokio-tungstenite
#[derive(Debug, Clone)]
pub struct WsConnector {
    buffer_size: usize,
    connect_timeout: Duration,
}

impl Default for WsConnector {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            connect_timeout: CONNECT_TIMEOUT,
        }
    }
}

impl WsConnector {
    #[must_use]
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn open(&self, url: &str) -> GatewayResult<TransportHandle> {
        let (socket, _response) = tokio::time::timeout(self.connect_timeout, connect_async(url))
            .await
            .map_err(|_| GatewayError::ConnectTimeout)?
            .map_err(|e| GatewayError::Connect(e.to_string()))?;

        tracing::info!(url = %url, "WebSocket connection established");

        let (mut ws_sink, mut ws_stream) = socket.split();
        let (out_tx, mut out_rx) = mpsc::channel::<GatewayMessage>(self.buffer_size);
        let (in_tx, in_rx) = mpsc::channel::<TransportEvent>(self.buffer_size);

        // Frames from the server
        let reader_tx = in_tx.clone();
        let recv_task = tokio::spawn(async move {
            let reason = loop {
                match ws_stream.next().await {
                    Some(Ok(Message::Text(text))) => match GatewayMessage::from_json(&text) {
                        Ok(msg) => {
                            tracing::trace!(event = %msg.event, "Frame received");
                            if reader_tx.send(TransportEvent::Message(msg)).await.is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Dropping undecodable frame");
                        }
                    },
                    Some(Ok(Message::Binary(_))) => {
                        tracing::debug!("Binary frames not supported");
                    }
                    Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                    Some(Ok(Message::Close(frame))) => {
                        let reason = frame
                            .map(|f| f.reason.to_string())
                            .filter(|r| !r.is_empty());
                        tracing::info!(reason = ?reason, "Server closed connection");
                        break DisconnectReason::ServerClosed(reason);
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "WebSocket error");
                        break DisconnectReason::Error(e.to_string());
                    }
                    None => break DisconnectReason::StreamEnded,
                }
            };
            let _ = reader_tx.send(TransportEvent::Closed(reason)).await;
        });

        // Frames to the server
        let send_task = tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let json = match msg.to_json() {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!(event = %msg.event, error = %e, "Failed to encode frame");
                        continue;
                    }
                };
                if let Err(e) = ws_sink.send(Message::Text(json)).await {
                    tracing::warn!(error = %e, "Failed to send frame");
                    let _ = in_tx
                        .send(TransportEvent::Closed(DisconnectReason::Error(e.to_string())))
                        .await;
                    return;
                }
            }

            // Close the WebSocket when the queue is dropped
            let _ = ws_sink.close().await;
        });

        Ok(TransportHandle::new(out_tx, in_rx, vec![recv_task]).with_writer(send_task))
    }
}
