//! Cycle (sprint) CRUD endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use catalyst_common::models::{Cycle, CycleUpdate, NewCycle};
use chrono::NaiveDate;
use uuid::Uuid;

use super::ProjectFilter;
use crate::{ApiError, ApiResult, AppState};

fn check_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> ApiResult<()> {
    match (start, end) {
        (Some(start), Some(end)) if end < start => Err(ApiError::BadRequest(format!(
            "Cycle ends ({}) before it starts ({})",
            end, start
        ))),
        _ => Ok(()),
    }
}

pub async fn list_cycles(
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
) -> ApiResult<Json<Vec<Cycle>>> {
    Ok(Json(state.storage.list_cycles(filter.project_id).await?))
}

pub async fn create_cycle(
    State(state): State<AppState>,
    Json(cycle): Json<NewCycle>,
) -> ApiResult<(StatusCode, Json<Cycle>)> {
    if cycle.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Cycle name is required".to_string()));
    }
    check_range(cycle.start_date, cycle.end_date)?;

    let created = state.storage.create_cycle(cycle).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_cycle(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Cycle>> {
    state
        .storage
        .get_cycle(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Cycle {} not found", id)))
}

pub async fn update_cycle(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<CycleUpdate>,
) -> ApiResult<Json<Cycle>> {
    let current = state
        .storage
        .get_cycle(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Cycle {} not found", id)))?;
    check_range(
        update.start_date.unwrap_or(current.start_date),
        update.end_date.unwrap_or(current.end_date),
    )?;

    state
        .storage
        .update_cycle(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Cycle {} not found", id)))
}

/// DELETE /api/cycles/:id
pub async fn delete_cycle(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if state.storage.delete_cycle(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Cycle {} not found", id)))
    }
}

pub fn cycle_routes() -> Router<AppState> {
    Router::new()
        .route("/api/cycles", get(list_cycles).post(create_cycle))
        .route("/api/cycles/:id", get(get_cycle).put(update_cycle).delete(delete_cycle))
}
