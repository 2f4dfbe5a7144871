//! Health check endpoint

use axum::Json;
use axum::extract::State;

use crate::core::ServerState;

/// GET /health
pub async fn health_check(State(state): State<ServerState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "shop-server",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": state.storage.backend(),
    }))
}
