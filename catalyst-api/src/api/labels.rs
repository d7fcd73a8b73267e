//! Label CRUD endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use catalyst_common::color::is_hex_color;
use catalyst_common::models::{Label, LabelUpdate, NewLabel};
use uuid::Uuid;

use super::ProjectFilter;
use crate::{ApiError, ApiResult, AppState};

pub async fn list_labels(
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
) -> ApiResult<Json<Vec<Label>>> {
    Ok(Json(state.storage.list_labels(filter.project_id).await?))
}

pub async fn create_label(
    State(state): State<AppState>,
    Json(label): Json<NewLabel>,
) -> ApiResult<(StatusCode, Json<Label>)> {
    if label.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Label name is required".to_string()));
    }
    if let Some(color) = label.color.as_deref() {
        if !is_hex_color(color) {
            return Err(ApiError::BadRequest(format!("Color must be #rrggbb, got '{}'", color)));
        }
    }

    let created = state.storage.create_label(label).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_label(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Label>> {
    state
        .storage
        .get_label(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Label {} not found", id)))
}

pub async fn update_label(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<LabelUpdate>,
) -> ApiResult<Json<Label>> {
    if let Some(color) = update.color.as_deref() {
        if !is_hex_color(color) {
            return Err(ApiError::BadRequest(format!("Color must be #rrggbb, got '{}'", color)));
        }
    }

    state
        .storage
        .update_label(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Label {} not found", id)))
}

/// DELETE /api/labels/:id
///
/// The label is detached from every ticket carrying it.
pub async fn delete_label(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if state.storage.delete_label(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Label {} not found", id)))
    }
}

pub fn label_routes() -> Router<AppState> {
    Router::new()
        .route("/api/labels", get(list_labels).post(create_label))
        .route("/api/labels/:id", get(get_label).put(update_label).delete(delete_label))
}
