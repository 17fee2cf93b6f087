//! HTTP API endpoints for connection status and message delivery.
//!
//! These endpoints let other services inspect the hub and push messages to
//! connected clients without holding a WebSocket themselves.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::RegistryError;
use crate::state::AppState;
use crate::types::ClientInfo;

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub active_connections: usize,
    pub clients: Vec<ClientInfo>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BroadcastResponse {
    pub status: String,
    pub message: String,
    /// Connections the message was delivered to
    pub recipient_count: usize,
    pub failed_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendResponse {
    pub status: String,
    pub message: String,
    pub recipient: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

fn error_response(code: StatusCode, message: impl Into<String>) -> Response {
    let body = ErrorResponse {
        status: "error".to_string(),
        message: message.into(),
    };
    (code, Json(body)).into_response()
}

/// Serialize a request body that must be a JSON object
fn object_payload(payload: Result<Json<Value>, JsonRejection>) -> Result<String, Response> {
    let Json(value) = payload
        .map_err(|e| error_response(StatusCode::BAD_REQUEST, format!("Invalid JSON: {}", e)))?;
    match value {
        Value::Object(map) => serde_json::to_string(&map).map_err(|e| {
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Encoding failed: {}", e),
            )
        }),
        other => Err(error_response(
            StatusCode::BAD_REQUEST,
            format!(
                "Message must be a JSON object, got {}",
                crate::classify::type_name(&other)
            ),
        )),
    }
}

/// Connection status.
///
/// GET /api/ws/status
pub async fn ws_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        active_connections: state.registry.count().await,
        clients: state.registry.describe_all().await,
        status: "running".to_string(),
    })
}

/// Broadcast a JSON object to every connected client.
///
/// POST /api/ws/broadcast
pub async fn broadcast_message(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let payload = match object_payload(payload) {
        Ok(p) => p,
        Err(response) => return response,
    };

    let report = state.broadcaster.broadcast_all(&payload).await;
    Json(BroadcastResponse {
        status: "success".to_string(),
        message: "Broadcasted to all clients".to_string(),
        recipient_count: report.succeeded,
        failed_count: report.failed(),
    })
    .into_response()
}

/// Send a JSON object to one client, addressed by `host:port`.
///
/// POST /api/ws/send/{address}
pub async fn send_to_client(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let payload = match object_payload(payload) {
        Ok(p) => p,
        Err(response) => return response,
    };

    match state.registry.send_to(&address, &payload).await {
        Ok(()) => Json(SendResponse {
            status: "success".to_string(),
            message: "Message sent".to_string(),
            recipient: address,
        })
        .into_response(),
        Err(e @ RegistryError::NotFound(_)) => error_response(StatusCode::NOT_FOUND, e.to_string()),
        Err(e) => {
            tracing::error!("Targeted send failed: {}", e);
            error_response(StatusCode::GONE, e.to_string())
        }
    }
}
