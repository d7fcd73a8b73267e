//! catalyst-api library interface
//!
//! Exposes the router, state and pipeline for integration testing

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod storage;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

use crate::agent::MeetingWorkflow;
use crate::config::ServiceConfig;
use crate::services::{CompletionClient, DeliverableGenerator, NotesClient, SpeechClient};
use crate::storage::Storage;

/// Application state shared across handlers
///
/// Every collaborator is built once at startup and injected here.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub llm: Arc<dyn CompletionClient>,
    pub speech: Arc<SpeechClient>,
    pub notes: Arc<NotesClient>,
    pub config: Arc<ServiceConfig>,
    pub workflow: Arc<MeetingWorkflow>,
    pub deliverables: Arc<DeliverableGenerator>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(
        storage: Arc<dyn Storage>,
        llm: Arc<dyn CompletionClient>,
        speech: SpeechClient,
        notes: NotesClient,
        config: ServiceConfig,
    ) -> Self {
        let workflow = MeetingWorkflow::new(storage.clone(), llm.clone(), &config.llm.agent_model);
        let deliverables = DeliverableGenerator::new(llm.clone(), config.llm.deliverable_model.clone());

        Self {
            storage,
            llm,
            speech: Arc::new(speech),
            notes: Arc::new(notes),
            config: Arc::new(config),
            workflow: Arc::new(workflow),
            deliverables: Arc::new(deliverables),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Remember the most recent failure for /health
    pub async fn record_error(&self, message: impl Into<String>) {
        *self.last_error.write().await = Some(message.into());
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::voice_routes())
        .merge(api::deliverable_routes())
        .merge(api::mermaid_routes())
        .merge(api::project_routes())
        .merge(api::user_routes())
        .merge(api::label_routes())
        .merge(api::cycle_routes())
        .merge(api::module_routes())
        .merge(api::ticket_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
