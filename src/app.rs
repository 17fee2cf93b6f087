use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{api, state::AppState, ws};

/// Build the HTTP/WebSocket router.
///
/// Serve it with `into_make_service_with_connect_info::<SocketAddr>()`;
/// the WebSocket route keys connections by remote address.
pub fn router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/ws/status", get(api::ws_status))
        .route("/api/ws/broadcast", post(api::broadcast_message))
        .route("/api/ws/send/{address}", post(api::send_to_client));

    let mut app = Router::new()
        .route("/ws", get(ws::ws_handler))
        .merge(api_routes)
        .layer(TraceLayer::new_for_http());

    if state.config.cors_permissive {
        app = app.layer(CorsLayer::permissive());
    }

    app.with_state(state)
}
