//! Per-connection message dispatch.
//!
//! One inbound payload in, one reply out to the same connection. Nothing
//! here fails outward: faults become error replies and transport failures
//! become registry evictions.

use std::sync::Arc;

use crate::classify::{classify, type_name, Classification};
use crate::error::{DispatchError, RegistryError};
use crate::protocol::{ReceivedDetail, ServerMessage};
use crate::registry::Registry;

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Classify a text payload and send the reply back to `connection_id`
    pub async fn handle(&self, connection_id: &str, raw: &str) -> ServerMessage {
        tracing::debug!("Received from {}: {}", connection_id, raw);

        let reply = respond(classify(raw));
        match serde_json::to_string(&reply) {
            Ok(payload) => {
                self.deliver(connection_id, &payload).await;
                reply
            }
            Err(e) => self.reply_with_fault(connection_id, e.into()).await,
        }
    }

    /// Binary frames are accepted when they hold UTF-8 text
    pub async fn handle_bytes(&self, connection_id: &str, raw: &[u8]) -> ServerMessage {
        match std::str::from_utf8(raw) {
            Ok(text) => self.handle(connection_id, text).await,
            Err(e) => self.reply_with_fault(connection_id, e.into()).await,
        }
    }

    /// Turn a fault into an error reply for the originating connection.
    /// The connection stays registered.
    pub async fn reply_with_fault(
        &self,
        connection_id: &str,
        fault: DispatchError,
    ) -> ServerMessage {
        tracing::error!("Error processing message from {}: {}", connection_id, fault);

        let reply = ServerMessage::error(&fault);
        match serde_json::to_string(&reply) {
            Ok(payload) => self.deliver(connection_id, &payload).await,
            Err(e) => tracing::error!("Failed to encode error response: {}", e),
        }
        reply
    }

    async fn deliver(&self, connection_id: &str, payload: &str) {
        match self.registry.send_to(connection_id, payload).await {
            Ok(()) => {}
            // Already evicted by the registry
            Err(e @ RegistryError::Send { .. }) => {
                tracing::error!("Error sending response: {}", e);
            }
            Err(e) => {
                tracing::warn!("Dropping response: {}", e);
            }
        }
    }
}

/// Build the reply for a classified payload
pub fn respond(classification: Classification) -> ServerMessage {
    match classification {
        Classification::Structured { kind, content, raw } => {
            tracing::info!("Message type: {}, Content: {}", kind, content);
            match kind.as_str() {
                "ping" => ServerMessage::pong(),
                "echo" => ServerMessage::echo(raw),
                _ => ServerMessage::received(ReceivedDetail::MessageType(kind)),
            }
        }
        Classification::OpaqueJson(value) => {
            tracing::info!("JSON data: {}", value);
            ServerMessage::received(ReceivedDetail::DataType(type_name(&value).to_string()))
        }
        Classification::PlainText(text) => {
            tracing::info!("Plain text message: {}", text);
            ServerMessage::received(ReceivedDetail::MessageLength(text.chars().count()))
        }
    }
}
