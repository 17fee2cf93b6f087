use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Opaque connection identity (remote address for WebSocket peers)
pub type ConnectionId = String;

/// Observability view of one registered connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientInfo {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub address: String,
}

impl ClientInfo {
    pub fn new(id: &str, remote_addr: Option<SocketAddr>) -> Self {
        Self {
            host: remote_addr.map(|a| a.ip().to_string()),
            port: remote_addr.map(|a| a.port()),
            address: id.to_string(),
        }
    }
}

/// Outcome of one fan-out pass
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BroadcastReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed_ids: Vec<ConnectionId>,
}

impl BroadcastReport {
    pub fn failed(&self) -> usize {
        self.failed_ids.len()
    }
}
