//! Mermaid diagram generation
//!
//! The third pipeline stage never fails the workflow: every error collapses
//! into `DiagramOutcome::Failed` and the caller carries on without a diagram.

use catalyst_common::models::{Priority, Ticket};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::fences::strip_code_fence;
use crate::services::llm_client::{CompletionClient, CompletionRequest, LlmError};

const TEMPERATURE: f32 = 0.5;
const MAX_TOKENS: u32 = 2048;

const SYSTEM_PROMPT: &str = r#"You are an expert at creating Mermaid diagrams for project visualization.
Generate a Mermaid flowchart showing the tickets and their relationships.

Return ONLY the Mermaid diagram code (no markdown code blocks, no explanations).

Requirements:
- Use flowchart format (graph TD or graph LR)
- Show ticket dependencies (parent-child relationships)
- Color-code by priority: urgent=red, high=orange, medium=yellow, low=green, none=gray
- Include ticket titles (abbreviated if too long)
- Make it visually clear and readable

Example output format:
graph TD
    A[Ticket 1: Setup] --> B[Ticket 2: Implementation]
    B --> C[Ticket 3: Testing]
    style A fill:#ff6b6b
    style B fill:#ffd93d
    style C fill:#6bcf7f"#;

const FREEFORM_SYSTEM_PROMPT: &str = r#"You are an expert at creating Mermaid diagrams.
Convert the user's description into a single valid Mermaid diagram.

Return ONLY the Mermaid diagram code (no markdown code blocks, no explanations)."#;

/// Result of the diagram stage
#[derive(Debug, Clone, PartialEq)]
pub enum DiagramOutcome {
    Generated(String),
    Failed(String),
}

impl DiagramOutcome {
    pub fn into_diagram(self) -> Option<String> {
        match self {
            DiagramOutcome::Generated(diagram) => Some(diagram),
            DiagramOutcome::Failed(_) => None,
        }
    }
}

/// What the LLM sees of each ticket
#[derive(Debug, Serialize)]
struct TicketDigest<'a> {
    id: Uuid,
    index: usize,
    title: &'a str,
    priority: Priority,
    assignee_id: Option<Uuid>,
    parent_ticket_id: Option<Uuid>,
    estimated_hours: Option<f64>,
}

fn digest(tickets: &[Ticket]) -> Vec<TicketDigest<'_>> {
    tickets
        .iter()
        .enumerate()
        .map(|(index, ticket)| TicketDigest {
            id: ticket.id,
            index,
            title: &ticket.title,
            priority: ticket.priority,
            assignee_id: ticket.assignee_id,
            parent_ticket_id: ticket.parent_ticket_id,
            estimated_hours: ticket.estimated_hours,
        })
        .collect()
}

pub struct DiagramGenerator {
    llm: Arc<dyn CompletionClient>,
    model: String,
}

impl DiagramGenerator {
    pub fn new(llm: Arc<dyn CompletionClient>, model: impl Into<String>) -> Self {
        Self { llm, model: model.into() }
    }

    /// Dependency flowchart for a materialized batch
    pub async fn generate(&self, tickets: &[Ticket], project_name: &str) -> DiagramOutcome {
        let payload = match serde_json::to_string_pretty(&digest(tickets)) {
            Ok(payload) => payload,
            Err(e) => return DiagramOutcome::Failed(format!("Error generating diagram: {}", e)),
        };

        let user = format!(
            "Create a Mermaid diagram for project \"{}\" with these tickets:\n\n{}\n\nGenerate the Mermaid diagram code.",
            project_name, payload
        );

        match self.request(SYSTEM_PROMPT, user).await {
            Ok(diagram) => {
                tracing::info!(chars = diagram.len(), "Generated diagram");
                DiagramOutcome::Generated(diagram)
            }
            Err(e) => DiagramOutcome::Failed(format!("Error generating diagram: {}", e)),
        }
    }

    /// Diagram from a free-form description
    pub async fn generate_from_prompt(&self, prompt: &str) -> Result<String, LlmError> {
        self.request(FREEFORM_SYSTEM_PROMPT, prompt.to_string()).await
    }

    async fn request(&self, system: &str, user: String) -> Result<String, LlmError> {
        let raw = self
            .llm
            .complete(CompletionRequest {
                model: self.model.clone(),
                system: Some(system.to_string()),
                user,
                temperature: TEMPERATURE,
                max_tokens: MAX_TOKENS,
            })
            .await?;

        let diagram = strip_code_fence(&raw, "mermaid");
        if diagram.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(diagram)
    }
}
