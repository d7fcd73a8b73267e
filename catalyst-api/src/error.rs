//! Error types for catalyst-api

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::agent::{AgentError, MeetingAnalysis, WorkflowFailure, WorkflowStage};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Uniqueness violation (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Upstream integration not configured or not reachable (503)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Offloaded work exceeded its deadline (504)
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Meeting workflow stopped at a stage (500)
    #[error("Agent workflow failed at {stage} stage: {message}")]
    WorkflowFailed {
        stage: WorkflowStage,
        message: String,
        ticket_specs: Option<MeetingAnalysis>,
    },
}

impl From<catalyst_common::Error> for ApiError {
    fn from(err: catalyst_common::Error) -> Self {
        use catalyst_common::Error;

        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<WorkflowFailure> for ApiError {
    fn from(failure: WorkflowFailure) -> Self {
        ApiError::WorkflowFailed {
            stage: failure.stage,
            message: failure.error.to_string(),
            ticket_specs: failure.ticket_specs,
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::TimeoutExceeded(_) => ApiError::Timeout(err.to_string()),
            AgentError::ExternalServiceUnavailable(msg) => ApiError::ServiceUnavailable(msg),
            AgentError::PersistenceFailure(inner) => inner.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
            ),
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                msg,
            ),
            ApiError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT", msg),
            ApiError::WorkflowFailed {
                stage,
                message,
                ticket_specs,
            } => {
                let body = Json(json!({
                    "error": {
                        "code": "WORKFLOW_FAILED",
                        "message": format!("Agent workflow failed at {} stage: {}", stage, message),
                        "stage": stage,
                        "ticket_specs": ticket_specs,
                    }
                }));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::NotFound("x".to_string()), StatusCode::NOT_FOUND),
            (ApiError::BadRequest("x".to_string()), StatusCode::BAD_REQUEST),
            (ApiError::Conflict("x".to_string()), StatusCode::CONFLICT),
            (ApiError::Internal("x".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
            (ApiError::ServiceUnavailable("x".to_string()), StatusCode::SERVICE_UNAVAILABLE),
            (ApiError::Timeout("x".to_string()), StatusCode::GATEWAY_TIMEOUT),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }

    #[test]
    fn test_storage_errors_map_to_client_codes() {
        let conflict = ApiError::from(catalyst_common::Error::Conflict("dup".to_string()));
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

        let invalid = ApiError::from(catalyst_common::Error::InvalidInput("bad".to_string()));
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

        let config = ApiError::from(catalyst_common::Error::Config("broken".to_string()));
        assert_eq!(config.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_empty_completion_surfaces_as_workflow_failure() {
        let failure = WorkflowFailure {
            stage: WorkflowStage::Analysis,
            error: AgentError::from(crate::services::LlmError::EmptyResponse),
            ticket_specs: None,
        };
        let response = ApiError::from(failure).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
