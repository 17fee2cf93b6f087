//! Connection handles.
//!
//! A handle is the registry's only view of a peer: an identity plus the
//! capability to send a text payload or to be closed. Transports plug in by
//! implementing [`Connection`].

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::{sink::SinkExt, stream::SplitSink};
use std::net::SocketAddr;
use tokio::sync::{mpsc, Mutex};

use crate::error::SendError;

/// Trait every transport backend implements
#[async_trait]
pub trait Connection: Send + Sync {
    /// Registry key for this connection
    fn id(&self) -> &str;

    /// Remote peer address, when the transport knows it
    fn remote_addr(&self) -> Option<SocketAddr> {
        None
    }

    /// Send one text payload to the peer
    async fn send(&self, payload: &str) -> Result<(), SendError>;

    /// Close the connection. Sends after this fail with [`SendError::Closed`].
    async fn close(&self) -> Result<(), SendError>;
}

/// Write half of an axum WebSocket
pub struct WsConnection {
    id: String,
    addr: SocketAddr,
    /// Frames from the dispatcher and from broadcasts are serialized here
    sink: Mutex<Option<SplitSink<WebSocket, Message>>>,
}

impl WsConnection {
    pub fn new(addr: SocketAddr, sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            id: addr.to_string(),
            addr,
            sink: Mutex::new(Some(sink)),
        }
    }

    /// Answer a ping frame
    pub async fn pong(&self, data: axum::body::Bytes) -> Result<(), SendError> {
        self.send_frame(Message::Pong(data)).await
    }

    async fn send_frame(&self, frame: Message) -> Result<(), SendError> {
        let mut guard = self.sink.lock().await;
        let sink = guard.as_mut().ok_or(SendError::Closed)?;
        if let Err(e) = sink.send(frame).await {
            // A failed write leaves the sink unusable
            *guard = None;
            return Err(SendError::Transport(e.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for WsConnection {
    fn id(&self) -> &str {
        &self.id
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        Some(self.addr)
    }

    async fn send(&self, payload: &str) -> Result<(), SendError> {
        self.send_frame(Message::Text(payload.to_string().into())).await
    }

    async fn close(&self) -> Result<(), SendError> {
        let Some(mut sink) = self.sink.lock().await.take() else {
            return Ok(());
        };
        sink.close()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))
    }
}

/// In-process connection backed by an unbounded channel.
///
/// Dropping the receiver makes further sends fail, which is how a peer
/// disappearing looks to the registry.
pub struct ChannelConnection {
    id: String,
    addr: Option<SocketAddr>,
    tx: Mutex<Option<mpsc::UnboundedSender<String>>>,
}

impl ChannelConnection {
    pub fn new(id: impl Into<String>) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Self {
            id: id.into(),
            addr: None,
            tx: Mutex::new(Some(tx)),
        };
        (conn, rx)
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }
}

#[async_trait]
impl Connection for ChannelConnection {
    fn id(&self) -> &str {
        &self.id
    }

    fn remote_addr(&self) -> Option<SocketAddr> {
        self.addr
    }

    async fn send(&self, payload: &str) -> Result<(), SendError> {
        let guard = self.tx.lock().await;
        let tx = guard.as_ref().ok_or(SendError::Closed)?;
        tx.send(payload.to_string())
            .map_err(|_| SendError::Transport("receiver dropped".to_string()))
    }

    async fn close(&self) -> Result<(), SendError> {
        self.tx.lock().await.take();
        Ok(())
    }
}
