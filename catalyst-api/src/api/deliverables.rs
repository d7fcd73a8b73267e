//! Deliverable generation and notes export endpoints

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::services::{DeliverableKind, LlmError, NotesError};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct MeetingNotesRequest {
    pub notes: String,
    pub output_type: String,
}

#[derive(Debug, Serialize)]
pub struct ProcessedOutput {
    pub content: String,
    pub output_type: DeliverableKind,
}

#[derive(Debug, Deserialize)]
pub struct NotesExportRequest {
    pub content: String,
    pub page_title: String,
    /// Add to this database instead of creating a page
    #[serde(default)]
    pub database_id: Option<String>,
    #[serde(default)]
    pub parent_page_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NotesExportResponse {
    pub success: bool,
    pub notion_url: String,
    pub message: String,
}

pub(crate) fn llm_failure(err: LlmError) -> ApiError {
    match err {
        LlmError::NotConfigured => ApiError::ServiceUnavailable(err.to_string()),
        other => ApiError::Internal(other.to_string()),
    }
}

/// POST /process
pub async fn process_notes(
    State(state): State<AppState>,
    Json(request): Json<MeetingNotesRequest>,
) -> ApiResult<Json<ProcessedOutput>> {
    let kind: DeliverableKind = request.output_type.parse().map_err(ApiError::BadRequest)?;

    if request.notes.trim().is_empty() {
        return Err(ApiError::BadRequest("Meeting notes are required".to_string()));
    }

    let content = state
        .deliverables
        .generate(kind, &request.notes)
        .await
        .map_err(llm_failure)?;

    Ok(Json(ProcessedOutput { content, output_type: kind }))
}

/// POST /export-notion
pub async fn export_notes(
    State(state): State<AppState>,
    Json(request): Json<NotesExportRequest>,
) -> ApiResult<Json<NotesExportResponse>> {
    let result = match request.database_id.as_deref().filter(|id| !id.trim().is_empty()) {
        Some(database_id) => {
            state
                .notes
                .add_to_database(&request.content, &request.page_title, database_id)
                .await
        }
        None => {
            state
                .notes
                .create_page(&request.content, &request.page_title, request.parent_page_id.as_deref())
                .await
        }
    };

    match result {
        Ok(page) => Ok(Json(NotesExportResponse {
            success: true,
            notion_url: page.url,
            message: "Successfully exported to Notion".to_string(),
        })),
        Err(NotesError::NotConfigured) => {
            Err(ApiError::ServiceUnavailable(NotesError::NotConfigured.to_string()))
        }
        Err(NotesError::Network(e)) => Err(ApiError::Internal(format!("Notion export failed: {}", e))),
        Err(other) => Err(ApiError::BadRequest(other.to_string())),
    }
}

pub fn deliverable_routes() -> Router<AppState> {
    Router::new()
        .route("/process", post(process_notes))
        .route("/export-notion", post(export_notes))
}
