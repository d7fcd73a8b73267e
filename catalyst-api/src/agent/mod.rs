//! Meeting-to-tickets pipeline
//!
//! Three stages run strictly in sequence:
//!
//! 1. **analysis** - `TranscriptAnalyzer` asks the LLM for ticket specs
//! 2. **creation** - `TicketMaterializer` resolves entities and persists tickets
//! 3. **diagram** - `DiagramGenerator` asks the LLM for a Mermaid flowchart
//!
//! Failures in analysis or creation end the workflow. A diagram failure only
//! leaves the diagram empty. A creation failure hands back the analyzer output
//! so the batch can be replayed without another LLM call.

pub mod analyzer;
pub mod diagram;
pub mod fences;
pub mod materializer;
pub mod matching;
pub mod normalize;

pub use analyzer::{MeetingAnalysis, TicketSpec, TranscriptAnalyzer};
pub use diagram::{DiagramGenerator, DiagramOutcome};
pub use materializer::{MaterializedBatch, TicketMaterializer};

use catalyst_common::models::{Project, Ticket};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::services::llm_client::{CompletionClient, LlmError};
use crate::storage::Storage;

/// Pipeline error taxonomy
#[derive(Debug, Error)]
pub enum AgentError {
    /// LLM output could not be parsed
    #[error("{message}")]
    MalformedResponse { message: String, snippet: String },

    /// LLM output parsed but has the wrong shape
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Timed out after {} seconds", .0.as_secs())]
    TimeoutExceeded(Duration),

    #[error("Error creating tickets: {0}")]
    PersistenceFailure(#[from] catalyst_common::Error),

    #[error("External service unavailable: {0}")]
    ExternalServiceUnavailable(String),

    /// Offloaded task panicked or was aborted
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl From<LlmError> for AgentError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Parse(message) => AgentError::MalformedResponse {
                message: format!("Unreadable LLM response: {}", message),
                snippet: String::new(),
            },
            LlmError::EmptyResponse => AgentError::MalformedResponse {
                message: LlmError::EmptyResponse.to_string(),
                snippet: String::new(),
            },
            other => AgentError::ExternalServiceUnavailable(other.to_string()),
        }
    }
}

/// Pipeline stage names as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStage {
    Analysis,
    Creation,
    Diagram,
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WorkflowStage::Analysis => "analysis",
            WorkflowStage::Creation => "creation",
            WorkflowStage::Diagram => "diagram",
        })
    }
}

/// Successful workflow result
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub tickets: Vec<Ticket>,
    pub project: Project,
    pub diagram: Option<String>,
    pub summary: String,
    pub ticket_count: usize,
}

/// Terminal workflow failure
#[derive(Debug, Error)]
#[error("Agent workflow failed at {stage} stage: {error}")]
pub struct WorkflowFailure {
    pub stage: WorkflowStage,
    pub error: AgentError,
    /// Analyzer output, present when creation failed
    pub ticket_specs: Option<MeetingAnalysis>,
}

/// Runs the three stages against injected collaborators
pub struct MeetingWorkflow {
    analyzer: TranscriptAnalyzer,
    materializer: TicketMaterializer,
    diagrammer: DiagramGenerator,
}

impl MeetingWorkflow {
    pub fn new(storage: Arc<dyn Storage>, llm: Arc<dyn CompletionClient>, model: &str) -> Self {
        Self {
            analyzer: TranscriptAnalyzer::new(llm.clone(), model),
            materializer: TicketMaterializer::new(storage),
            diagrammer: DiagramGenerator::new(llm, model),
        }
    }

    pub fn diagrammer(&self) -> &DiagramGenerator {
        &self.diagrammer
    }

    pub async fn run(
        &self,
        transcript: &str,
        project_name: Option<&str>,
    ) -> Result<WorkflowReport, WorkflowFailure> {
        tracing::info!(transcript_chars = transcript.len(), "Starting meeting workflow");

        let analysis = self.analyzer.analyze(transcript).await.map_err(|error| {
            tracing::error!(stage = %WorkflowStage::Analysis, error = %error, "Workflow stage failed");
            WorkflowFailure {
                stage: WorkflowStage::Analysis,
                error,
                ticket_specs: None,
            }
        })?;

        let batch = match self.materializer.materialize(&analysis, project_name).await {
            Ok(batch) => batch,
            Err(error) => {
                tracing::error!(stage = %WorkflowStage::Creation, error = %error, "Workflow stage failed");
                return Err(WorkflowFailure {
                    stage: WorkflowStage::Creation,
                    error,
                    ticket_specs: Some(analysis),
                });
            }
        };

        let diagram = match self.diagrammer.generate(&batch.tickets, &batch.project.name).await {
            DiagramOutcome::Generated(diagram) => Some(diagram),
            DiagramOutcome::Failed(reason) => {
                tracing::warn!(stage = %WorkflowStage::Diagram, reason = %reason, "Diagram generation failed");
                None
            }
        };

        tracing::info!(ticket_count = batch.tickets.len(), "Meeting workflow finished");

        Ok(WorkflowReport {
            ticket_count: batch.tickets.len(),
            tickets: batch.tickets,
            project: batch.project,
            diagram,
            summary: batch.summary,
        })
    }
}

/// Run `work` on its own task and stop waiting after `limit`
///
/// On timeout the task keeps running detached; only the wait is abandoned.
pub async fn run_with_timeout<F>(limit: Duration, work: F) -> Result<F::Output, AgentError>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let handle = tokio::spawn(work);

    match tokio::time::timeout(limit, handle).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(join_error)) => Err(AgentError::TaskFailed(join_error.to_string())),
        Err(_) => {
            tracing::warn!(limit_secs = limit.as_secs(), "Stopped waiting for offloaded work");
            Err(AgentError::TimeoutExceeded(limit))
        }
    }
}
