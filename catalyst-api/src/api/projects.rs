//! Project CRUD endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use catalyst_common::models::{NewProject, Project, ProjectUpdate};
use uuid::Uuid;

use crate::{ApiError, ApiResult, AppState};

/// GET /api/projects
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.storage.list_projects().await?))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    Json(project): Json<NewProject>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    if project.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Project name is required".to_string()));
    }
    if project.resolved_identifier().is_empty() {
        return Err(ApiError::BadRequest("Project identifier is required".to_string()));
    }

    let created = state.storage.create_project(project).await?;
    tracing::info!(project_id = %created.id, name = %created.name, "Project created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/projects/:id
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Project>> {
    state
        .storage
        .get_project(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Project {} not found", id)))
}

/// PUT /api/projects/:id
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<ProjectUpdate>,
) -> ApiResult<Json<Project>> {
    if matches!(update.name.as_deref(), Some(name) if name.trim().is_empty()) {
        return Err(ApiError::BadRequest("Project name cannot be blank".to_string()));
    }

    state
        .storage
        .update_project(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Project {} not found", id)))
}

/// DELETE /api/projects/:id
///
/// Removes the project's tickets, labels, cycles and modules with it.
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if state.storage.delete_project(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Project {} not found", id)))
    }
}

pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/api/projects", get(list_projects).post(create_project))
        .route(
            "/api/projects/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
}
