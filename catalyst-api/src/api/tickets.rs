//! Ticket CRUD endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use catalyst_common::models::{NewTicket, Ticket, TicketUpdate};
use uuid::Uuid;

use super::ProjectFilter;
use crate::{ApiError, ApiResult, AppState};

fn check_hours(hours: Option<f64>) -> ApiResult<()> {
    match hours {
        Some(h) if !h.is_finite() || h < 0.0 => Err(ApiError::BadRequest(format!(
            "estimated_hours must be a non-negative number, got {}",
            h
        ))),
        _ => Ok(()),
    }
}

/// GET /api/tickets[?project_id=]
pub async fn list_tickets(
    State(state): State<AppState>,
    Query(filter): Query<ProjectFilter>,
) -> ApiResult<Json<Vec<Ticket>>> {
    Ok(Json(state.storage.list_tickets(filter.project_id).await?))
}

/// POST /api/tickets
pub async fn create_ticket(
    State(state): State<AppState>,
    Json(ticket): Json<NewTicket>,
) -> ApiResult<(StatusCode, Json<Ticket>)> {
    if ticket.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Ticket title is required".to_string()));
    }
    check_hours(ticket.estimated_hours)?;

    let created = state.storage.create_ticket(ticket).await?;
    tracing::info!(ticket_id = %created.id, project_id = %created.project_id, "Ticket created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/tickets/:id
pub async fn get_ticket(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Ticket>> {
    state
        .storage
        .get_ticket(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Ticket {} not found", id)))
}

/// PUT /api/tickets/:id
///
/// Absent fields are left alone, `null` clears nullable fields and
/// `label_ids` replaces the whole label set.
pub async fn update_ticket(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<TicketUpdate>,
) -> ApiResult<Json<Ticket>> {
    if matches!(update.title.as_deref(), Some(title) if title.trim().is_empty()) {
        return Err(ApiError::BadRequest("Ticket title cannot be blank".to_string()));
    }
    check_hours(update.estimated_hours.flatten())?;

    state
        .storage
        .update_ticket(id, update)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Ticket {} not found", id)))
}

/// DELETE /api/tickets/:id
///
/// Subtasks are deleted along with their parent.
pub async fn delete_ticket(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<StatusCode> {
    if state.storage.delete_ticket(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Ticket {} not found", id)))
    }
}

pub fn ticket_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tickets", get(list_tickets).post(create_ticket))
        .route("/api/tickets/:id", get(get_ticket).put(update_ticket).delete(delete_ticket))
}
