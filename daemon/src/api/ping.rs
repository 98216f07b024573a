use axum::{extract::State, http::StatusCode};
use std::sync::Arc;

use crate::state::AppState;

/// Health check: 200 once the model is in memory, 503 before that.
pub async fn ping(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.is_model_loaded() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
