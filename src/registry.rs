//! Connection registry.
//!
//! The registry is the single source of truth for which connections may
//! receive sends. All membership changes and snapshots go through one
//! `RwLock`; the lock is never held across a send.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::connection::Connection;
use crate::error::RegistryError;
use crate::types::{ClientInfo, ConnectionId};

/// Shared reference to a registered connection
pub type ConnectionRef = Arc<dyn Connection>;

#[derive(Default)]
pub struct Registry {
    connections: RwLock<HashMap<ConnectionId, ConnectionRef>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. Rejects ids that are already present.
    pub async fn add(&self, conn: ConnectionRef) -> Result<(), RegistryError> {
        let mut connections = self.connections.write().await;
        let id = conn.id().to_string();
        if connections.contains_key(&id) {
            tracing::warn!("Rejecting duplicate connection id: {}", id);
            return Err(RegistryError::DuplicateId(id));
        }
        connections.insert(id.clone(), conn);
        tracing::info!(
            "New client connected: {} - Total connections: {}",
            id,
            connections.len()
        );
        Ok(())
    }

    /// Remove a connection by id. Unknown ids are a no-op.
    pub async fn remove(&self, id: &str) -> Option<ConnectionRef> {
        let mut connections = self.connections.write().await;
        let removed = connections.remove(id);
        if removed.is_some() {
            tracing::info!(
                "Client disconnected: {} - Total connections: {}",
                id,
                connections.len()
            );
        }
        removed
    }

    /// Remove `conn` only if it is still the handle registered under its id.
    ///
    /// A handle taken from an older snapshot must never evict a newer
    /// connection that reused the same id. Returns whether it was removed.
    pub async fn evict(&self, conn: &ConnectionRef) -> bool {
        let removed = {
            let mut connections = self.connections.write().await;
            match connections.get(conn.id()) {
                Some(current) if Arc::ptr_eq(current, conn) => {
                    connections.remove(conn.id());
                    tracing::info!(
                        "Client disconnected: {} - Total connections: {}",
                        conn.id(),
                        connections.len()
                    );
                    true
                }
                _ => false,
            }
        };

        if removed {
            if let Err(e) = conn.close().await {
                tracing::debug!("Closing evicted client {} failed: {}", conn.id(), e);
            }
        }
        removed
    }

    /// Send a payload to one connection.
    ///
    /// A transport failure evicts the connection before the error is returned.
    pub async fn send_to(&self, id: &str, payload: &str) -> Result<(), RegistryError> {
        let conn = self
            .get(id)
            .await
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        if let Err(e) = conn.send(payload).await {
            tracing::error!("Error sending message to client {}: {}", id, e);
            self.evict(&conn).await;
            return Err(RegistryError::Send {
                id: id.to_string(),
                source: e,
            });
        }
        Ok(())
    }

    /// Whether this exact handle is still the one registered under its id
    pub async fn is_registered(&self, conn: &ConnectionRef) -> bool {
        matches!(
            self.connections.read().await.get(conn.id()),
            Some(current) if Arc::ptr_eq(current, conn)
        )
    }

    pub async fn get(&self, id: &str) -> Option<ConnectionRef> {
        self.connections.read().await.get(id).cloned()
    }

    /// Point-in-time copy of the membership, safe to iterate while the
    /// registry keeps changing.
    pub async fn snapshot(&self) -> Vec<ConnectionRef> {
        self.connections.read().await.values().cloned().collect()
    }

    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn describe_all(&self) -> Vec<ClientInfo> {
        let mut clients: Vec<ClientInfo> = self
            .connections
            .read()
            .await
            .values()
            .map(|c| ClientInfo::new(c.id(), c.remote_addr()))
            .collect();
        clients.sort_by(|a, b| a.address.cmp(&b.address));
        clients
    }

    /// Drain the registry and close every connection (used on shutdown)
    pub async fn close_all(&self) -> usize {
        let drained: Vec<ConnectionRef> = {
            let mut connections = self.connections.write().await;
            connections.drain().map(|(_, c)| c).collect()
        };

        for conn in &drained {
            if let Err(e) = conn.close().await {
                tracing::debug!("Closing client {} failed: {}", conn.id(), e);
            }
        }
        drained.len()
    }
}
