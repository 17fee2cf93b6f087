use futures::future::join_all;
use std::sync::Arc;

use crate::registry::Registry;
use crate::types::BroadcastReport;

/// Fans a payload out to every registered connection
#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<Registry>,
}

impl Broadcaster {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Send `payload` verbatim to every connection in a registry snapshot.
    ///
    /// Sends run concurrently and each one fails on its own; every connection
    /// that failed is evicted once the pass is over.
    pub async fn broadcast_all(&self, payload: &str) -> BroadcastReport {
        let snapshot = self.registry.snapshot().await;
        if snapshot.is_empty() {
            tracing::warn!("No active connections for broadcast");
            return BroadcastReport::default();
        }

        let results = join_all(snapshot.iter().map(|conn| conn.send(payload))).await;

        let mut report = BroadcastReport {
            attempted: snapshot.len(),
            ..Default::default()
        };
        let mut failed = Vec::new();
        for (conn, result) in snapshot.iter().zip(results) {
            match result {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    tracing::error!("Error broadcasting to client {}: {}", conn.id(), e);
                    report.failed_ids.push(conn.id().to_string());
                    failed.push(conn);
                }
            }
        }

        for conn in failed {
            self.registry.evict(conn).await;
        }

        tracing::info!(
            attempted = report.attempted,
            succeeded = report.succeeded,
            failed = report.failed(),
            "Broadcast complete"
        );
        report
    }
}
