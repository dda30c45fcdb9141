//! Transports
//!
//! A [`Connector`] opens a connection and hands back a [`TransportHandle`]:
//! a bounded outbound queue, an inbound event stream and the tasks pumping
//! them. Dropping the handle aborts the tasks and discards queued frames;
//! [`TransportHandle::close`] lets the writer flush and close first.

mod memory;
mod websocket;

pub use memory::{MemoryConnector, MemoryPeer};
pub use websocket::WsConnector;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::GatewayResult;
use crate::events::DisconnectReason;
use crate::protocol::GatewayMessage;

/// Default bound of the outbound and inbound queues
pub const DEFAULT_BUFFER_SIZE: usize = 100;

/// Something that happened on the connection
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A decoded frame
    Message(GatewayMessage),
    /// The connection is gone; always the last event
    Closed(DisconnectReason),
}

/// Live connection
#[derive(Debug)]
pub struct TransportHandle {
    outbound: mpsc::Sender<GatewayMessage>,
    inbound: mpsc::Receiver<TransportEvent>,
    tasks: Vec<JoinHandle<()>>,
    writer: Option<JoinHandle<()>>,
}

impl TransportHandle {
    #[must_use]
    pub fn new(
        outbound: mpsc::Sender<GatewayMessage>,
        inbound: mpsc::Receiver<TransportEvent>,
        tasks: Vec<JoinHandle<()>>,
    ) -> Self {
        Self {
            outbound,
            inbound,
            tasks,
            writer: None,
        }
    }

    /// Task draining the outbound queue; it outlives a graceful `close`
    #[must_use]
    pub fn with_writer(mut self, writer: JoinHandle<()>) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Stop reading and let the writer flush queued frames and close
    pub(crate) fn close(mut self) {
        // Detached, not aborted: it ends once the outbound sender drops
        drop(self.writer.take());
    }

    /// Queue a frame without waiting
    pub(crate) fn try_send(
        &self,
        message: GatewayMessage,
    ) -> Result<(), mpsc::error::TrySendError<GatewayMessage>> {
        self.outbound.try_send(message)
    }

    /// Next inbound event; a vanished pump reads as a lost connection
    pub(crate) async fn recv(&mut self) -> TransportEvent {
        self.inbound
            .recv()
            .await
            .unwrap_or(TransportEvent::Closed(DisconnectReason::StreamEnded))
    }
}

impl Drop for TransportHandle {
    fn drop(&mut self) {
        for task in self.tasks.iter().chain(self.writer.iter()) {
            task.abort();
        }
    }
}

/// Opens connections to the backend
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, url: &str) -> GatewayResult<TransportHandle>;
}
