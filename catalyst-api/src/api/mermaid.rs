//! Free-form Mermaid diagram endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use super::deliverables::llm_failure;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct MermaidRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct MermaidResponse {
    pub mermaid: String,
}

/// POST /mermaid/generate
pub async fn generate_mermaid(
    State(state): State<AppState>,
    Json(request): Json<MermaidRequest>,
) -> ApiResult<Json<MermaidResponse>> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("Prompt is required".to_string()));
    }

    let mermaid = state
        .workflow
        .diagrammer()
        .generate_from_prompt(&request.prompt)
        .await
        .map_err(llm_failure)?;

    Ok(Json(MermaidResponse { mermaid }))
}

pub fn mermaid_routes() -> Router<AppState> {
    Router::new().route("/mermaid/generate", post(generate_mermaid))
}
