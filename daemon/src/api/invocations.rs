use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use byoserve_runtime_api::Entity;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct InvocationRequest {
    pub input: String,
}

#[derive(Debug, Serialize)]
pub struct InvocationResponse {
    pub output: Vec<Entity>,
}

/// Everything that can go wrong while serving one invocation. All of it ends
/// up as an empty 500; the variants only matter for the server log.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    #[error("expected an application/json body, got {0:?}")]
    UnsupportedMediaType(Option<String>),

    #[error("malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    #[error("model not loaded")]
    ModelNotLoaded,

    #[error("model error: {0}")]
    Model(anyhow::Error),

    #[error("inference task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for InvocationError {
    fn into_response(self) -> Response {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

pub async fn invoke(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    tracing::debug!("Invocation request received");

    match handle(&state, &headers, &body).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            tracing::error!("Error occurred: {}", e);
            e.into_response()
        }
    }
}

async fn handle(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<InvocationResponse, InvocationError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    if !content_type.is_some_and(is_json) {
        return Err(InvocationError::UnsupportedMediaType(
            content_type.map(str::to_string),
        ));
    }

    let request: InvocationRequest = serde_json::from_slice(body)?;
    let output = state.extract(request.input).await?;
    Ok(InvocationResponse { output })
}

/// `application/json` or any `application/*+json` type, parameters ignored.
fn is_json(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_json_content_types() {
        assert!(is_json("application/json"));
        assert!(is_json("Application/JSON; charset=utf-8"));
        assert!(is_json("application/vnd.api+json"));
        assert!(!is_json("text/plain"));
        assert!(!is_json("application/x-www-form-urlencoded"));
    }
}
