//! Voice endpoints: meeting workflow, transcription, credential status

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::agent::{run_with_timeout, AgentError, WorkflowReport};
use crate::services::speech_client::{SpeechError, Transcription, DEFAULT_MIMETYPE};
use crate::{ApiError, ApiResult, AppState};

/// Transcripts shorter than this (after trimming) are rejected
const MIN_TRANSCRIPT_CHARS: usize = 10;

/// Upload cap for audio files
const MAX_AUDIO_BYTES: usize = 100 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct ProcessMeetingRequest {
    pub transcript: String,
    #[serde(default)]
    pub project_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProcessMeetingResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: WorkflowReport,
}

#[derive(Debug, Serialize)]
pub struct ApiKeyStatus {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// POST /api/voice/process-meeting
///
/// Runs analysis, ticket creation and diagram generation on a background task
/// bounded by the workflow timeout.
pub async fn process_meeting(
    State(state): State<AppState>,
    Json(request): Json<ProcessMeetingRequest>,
) -> ApiResult<Json<ProcessMeetingResponse>> {
    tracing::info!(transcript_chars = request.transcript.len(), "Processing meeting transcript");

    if request.transcript.trim().chars().count() < MIN_TRANSCRIPT_CHARS {
        return Err(ApiError::BadRequest(
            "Transcript is too short. Please provide a meaningful meeting transcript.".to_string(),
        ));
    }

    let workflow = state.workflow.clone();
    let limit = state.config.workflow_timeout;
    let outcome = run_with_timeout(limit, async move {
        workflow
            .run(&request.transcript, request.project_name.as_deref())
            .await
    })
    .await;

    match outcome {
        Ok(Ok(report)) => Ok(Json(ProcessMeetingResponse { success: true, report })),
        Ok(Err(failure)) => {
            state.record_error(failure.to_string()).await;
            Err(failure.into())
        }
        Err(AgentError::TimeoutExceeded(limit)) => {
            let message = format!(
                "Meeting processing timed out after {} seconds. Please try a shorter transcript.",
                limit.as_secs()
            );
            state.record_error(message.clone()).await;
            Err(ApiError::Timeout(message))
        }
        Err(other) => {
            state.record_error(other.to_string()).await;
            Err(other.into())
        }
    }
}

/// GET /api/voice/api-key-status
pub async fn api_key_status(State(state): State<AppState>) -> Json<ApiKeyStatus> {
    if state.speech.is_configured() {
        Json(ApiKeyStatus { configured: true, message: None })
    } else {
        Json(ApiKeyStatus {
            configured: false,
            message: Some("DEEPGRAM_API_KEY not found in environment variables".to_string()),
        })
    }
}

/// POST /api/voice/transcribe-file (multipart field `file`)
pub async fn transcribe_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<Transcription>> {
    if !state.speech.is_configured() {
        return Err(ApiError::ServiceUnavailable(SpeechError::NotConfigured.to_string()));
    }

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let mimetype = field.content_type().unwrap_or(DEFAULT_MIMETYPE).to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
        tracing::info!(filename = %filename, mimetype = %mimetype, bytes = bytes.len(), "Receiving audio file");
        upload = Some((bytes.to_vec(), mimetype));
        break;
    }

    let (audio, mimetype) =
        upload.ok_or_else(|| ApiError::BadRequest("Missing multipart field 'file'".to_string()))?;

    let speech = state.speech.clone();
    let limit = state.config.transcription_timeout;
    let outcome = run_with_timeout(limit, async move { speech.transcribe(audio, &mimetype).await }).await;

    match outcome {
        Ok(Ok(transcription)) => Ok(Json(transcription)),
        Ok(Err(SpeechError::NotConfigured)) => {
            Err(ApiError::ServiceUnavailable(SpeechError::NotConfigured.to_string()))
        }
        Ok(Err(e)) => {
            state.record_error(e.to_string()).await;
            Err(ApiError::Internal(format!("Transcription failed: {}", e)))
        }
        Err(AgentError::TimeoutExceeded(limit)) => Err(ApiError::Timeout(format!(
            "Transcription timed out after {} seconds. Please try a smaller file.",
            limit.as_secs()
        ))),
        Err(other) => Err(other.into()),
    }
}

pub fn voice_routes() -> Router<AppState> {
    Router::new()
        .route("/api/voice/process-meeting", post(process_meeting))
        .route("/api/voice/api-key-status", get(api_key_status))
        .route(
            "/api/voice/transcribe-file",
            post(transcribe_file).layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES)),
        )
}
