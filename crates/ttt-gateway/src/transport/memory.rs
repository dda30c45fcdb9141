//! In-process transport
//!
//! Each `open` hands the far end of the new connection to whoever holds the
//! peer receiver, so coordinators can be driven without a socket.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{GatewayError, GatewayResult};
use crate::events::DisconnectReason;
use crate::protocol::{Command, GatewayMessage, Push};
use crate::transport::{Connector, TransportEvent, TransportHandle, DEFAULT_BUFFER_SIZE};

/// Connector backed by channels
#[derive(Debug, Clone)]
pub struct MemoryConnector {
    peers: Option<mpsc::UnboundedSender<MemoryPeer>>,
}

impl MemoryConnector {
    /// Connector plus the stream of server ends it opens
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MemoryPeer>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { peers: Some(tx) }, rx)
    }

    /// Connector whose every attempt fails
    #[must_use]
    pub fn refusing() -> Self {
        Self { peers: None }
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn open(&self, url: &str) -> GatewayResult<TransportHandle> {
        let peers = self
            .peers
            .as_ref()
            .ok_or_else(|| GatewayError::Connect(format!("connection refused: {url}")))?;

        let (out_tx, out_rx) = mpsc::channel(DEFAULT_BUFFER_SIZE);
        let (in_tx, in_rx) = mpsc::channel(DEFAULT_BUFFER_SIZE);
        peers
            .send(MemoryPeer {
                sent: out_rx,
                inbound: in_tx,
            })
            .map_err(|_| GatewayError::Connect(format!("connection refused: {url}")))?;

        Ok(TransportHandle::new(out_tx, in_rx, Vec::new()))
    }
}

/// Server end of a memory connection
#[derive(Debug)]
pub struct MemoryPeer {
    sent: mpsc::Receiver<GatewayMessage>,
    inbound: mpsc::Sender<TransportEvent>,
}

impl MemoryPeer {
    /// Next command the client sent
    pub async fn recv_command(&mut self) -> Option<Command> {
        let msg = self.sent.recv().await?;
        Command::from_message(&msg).ok()
    }

    /// Command already queued by the client, if any
    pub fn try_recv_command(&mut self) -> Option<Command> {
        let msg = self.sent.try_recv().ok()?;
        Command::from_message(&msg).ok()
    }

    /// Deliver a push to the client
    pub async fn push(&self, push: Push) -> GatewayResult<()> {
        self.deliver(push.to_message()?).await
    }

    /// Deliver a raw envelope to the client
    pub async fn deliver(&self, message: GatewayMessage) -> GatewayResult<()> {
        self.inbound
            .send(TransportEvent::Message(message))
            .await
            .map_err(|_| GatewayError::ChannelClosed)
    }

    /// Drop the connection from the server side
    pub async fn close(&self, reason: DisconnectReason) {
        let _ = self.inbound.send(TransportEvent::Closed(reason)).await;
    }

    /// Whether the client side has been torn down
    pub fn is_closed(&self) -> bool {
        self.inbound.is_closed()
    }
}
