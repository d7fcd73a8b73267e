//! Module (feature group) CRUD endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use catalyst_common::models::{Module, ModuleUpdate, NewModule};
use uuid::Uuid;

use super::ProjectFilter;
use crate::{ApiError, ApiResult, AppState};

pub async fn list_modules(
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
) -> ApiResult<Json<Vec<Module>>> {
    Ok(Json(state.storage.list_modules(filter.project_id).await?))
}

pub async fn create_module(
    State(state): State<AppState>,
    Json(module): Json<NewModule>,
) -> ApiResult<(StatusCode, Json<Module>)> {
    if module.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Module name is required".to_string()));
    }

    let created = state.storage.create_module(module).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_module(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Module>> {
    state
        .storage
        .get_module(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Module {} not found", id)))
}

pub async fn update_module(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<ModuleUpdate>,
) -> ApiResult<Json<Module>> {
    state
        .storage
        .update_module(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Module {} not found", id)))
}

pub async fn delete_module(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if state.storage.delete_module(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Module {} not found", id)))
    }
}

pub fn module_routes() -> Router<AppState> {
    Router::new()
        .route("/api/modules", get(list_modules).post(create_module))
        .route("/api/modules/:id", get(get_module).put(update_module).delete(delete_module))
}
