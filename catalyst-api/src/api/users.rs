//! User CRUD endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use catalyst_common::color::is_hex_color;
use catalyst_common::models::{NewUser, User, UserUpdate};
use uuid::Uuid;

use crate::{ApiError, ApiResult, AppState};

fn check_color(color: Option<&str>) -> ApiResult<()> {
    match color {
        Some(color) if !is_hex_color(color) => Err(ApiError::BadRequest(format!(
            "Color must be #rrggbb, got '{}'",
            color
        ))),
        _ => Ok(()),
    }
}

pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.storage.list_users().await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(user): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    if user.name.trim().is_empty() {
        return Err(ApiError::BadRequest("User name is required".to_string()));
    }
    check_color(user.color.as_deref())?;

    let created = state.storage.create_user(user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_user(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<User>> {
    state
        .storage
        .get_user(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<UserUpdate>,
) -> ApiResult<Json<User>> {
    if matches!(update.name.as_deref(), Some(name) if name.trim().is_empty()) {
        return Err(ApiError::BadRequest("User name cannot be blank".to_string()));
    }
    check_color(update.color.clone().flatten().as_deref())?;

    state
        .storage
        .update_user(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("User {} not found", id)))
}

/// DELETE /api/users/:id
///
/// Tickets assigned to the user become unassigned.
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if state.storage.delete_user(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("User {} not found", id)))
    }
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/:id", get(get_user).put(update_user).delete(delete_user))
}
