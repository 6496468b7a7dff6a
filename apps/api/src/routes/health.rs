use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// The API itself is up if this answers; the resume service is reported
/// separately since uploads and analysis depend on it.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let resume_service = if state.extractor.reachable().await {
        "reachable"
    } else {
        "unreachable"
    };
    Json(json!({
        "status": "ok",
        "service": "careernav-api",
        "version": env!("CARGO_PKG_VERSION"),
        "resume_service": resume_service,
    }))
}
