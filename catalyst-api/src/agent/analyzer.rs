//! Transcript analyzer
//!
//! Turns a meeting transcript into `MeetingAnalysis`: a project name plus an
//! ordered list of ticket specifications. One LLM call, no retries.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::sync::Arc;

use super::fences::{snippet, strip_code_fence};
use super::AgentError;
use crate::services::llm_client::{CompletionClient, CompletionRequest};

const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 4096;

const SYSTEM_PROMPT: &str = r#"You are an expert project manager analyzing meeting transcripts.
Extract actionable tickets from the meeting discussion.

Return ONLY a valid JSON object with this exact structure (no markdown, no explanations):
{
  "project_name": "string (project name or identifier from meeting)",
  "tickets": [
    {
      "title": "string (concise ticket title)",
      "description": "string (detailed description)",
      "priority": "urgent|high|medium|low|none",
      "estimated_hours": number (estimated hours, can be null),
      "assignee_name": "string (person's name, can be null)",
      "deadline": "YYYY-MM-DD (ISO date, can be null)",
      "labels": ["string (label names)"],
      "dependencies": ["ticket:0 (means depends on ticket at index 0, or null)"]
    }
  ]
}

Important rules:
- Extract real, actionable tasks only
- Use exact priority values: urgent, high, medium, low, or none
- Parse dates into YYYY-MM-DD format
- For dependencies, use "ticket:N" format where N is the index
- If no clear information, use null
- Return valid JSON only"#;

/// One ticket as extracted by the LLM, before entity resolution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketSpec {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
    /// Free text; normalized during materialization
    #[serde(default, deserialize_with = "lenient_text")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "lenient_hours")]
    pub estimated_hours: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub assignee_name: Option<String>,
    /// Date in one of several formats
    #[serde(default, deserialize_with = "lenient_text")]
    pub deadline: Option<String>,
    #[serde(default, deserialize_with = "lenient_labels")]
    pub labels: Vec<String>,
    /// `ticket:N` references to earlier entries
    #[serde(default, deserialize_with = "null_as_empty")]
    pub dependencies: Vec<Value>,
}

/// Analyzer result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeetingAnalysis {
    pub project_name: Option<String>,
    pub tickets: Vec<TicketSpec>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(D::Error::custom(format!("expected text, found {}", other))),
    }
}

fn lenient_hours<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_labels<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parse and validate raw LLM output
pub fn parse_analysis(raw: &str) -> Result<MeetingAnalysis, AgentError> {
    let content = strip_code_fence(raw, "json");

    let value: Value = serde_json::from_str(&content).map_err(|e| {
        tracing::warn!(error = %e, raw = %snippet(&content), "Analyzer returned invalid JSON");
        AgentError::MalformedResponse {
            message: format!("Failed to parse AI response as JSON: {}", e),
            snippet: snippet(&content),
        }
    })?;

    let Value::Object(mut object) = value else {
        return Err(AgentError::ValidationError(
            "Expected a JSON object with project_name and tickets".to_string(),
        ));
    };

    if !object.contains_key("project_name") || !object.contains_key("tickets") {
        return Err(AgentError::ValidationError(
            "Missing required fields: project_name or tickets".to_string(),
        ));
    }

    let project_name = match object.remove("project_name") {
        Some(Value::String(name)) => Some(name),
        Some(Value::Null) | None => None,
        Some(_) => {
            return Err(AgentError::ValidationError("project_name must be a string".to_string()));
        }
    };

    let Some(Value::Array(entries)) = object.remove("tickets") else {
        return Err(AgentError::ValidationError("tickets must be a list".to_string()));
    };

    let tickets = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            serde_json::from_value::<TicketSpec>(entry).map_err(|e| {
                AgentError::ValidationError(format!("Ticket at index {} is invalid: {}", index, e))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MeetingAnalysis { project_name, tickets })
}

/// First pipeline stage
pub struct TranscriptAnalyzer {
    llm: Arc<dyn CompletionClient>,
    model: String,
}

impl TranscriptAnalyzer {
    pub fn new(llm: Arc<dyn CompletionClient>, model: impl Into<String>) -> Self {
        Self { llm, model: model.into() }
    }

    pub async fn analyze(&self, transcript: &str) -> Result<MeetingAnalysis, AgentError> {
        if transcript.trim().is_empty() {
            return Err(AgentError::ValidationError("Transcript is empty".to_string()));
        }

        let user = format!(
            "Analyze this meeting transcript and extract actionable tickets:\n\n{}\n\nReturn the JSON object with project_name and tickets array.",
            transcript
        );

        let raw = self
            .llm
            .complete(CompletionRequest {
                model: self.model.clone(),
                system: Some(SYSTEM_PROMPT.to_string()),
                user,
                temperature: TEMPERATURE,
                max_tokens: MAX_TOKENS,
            })
            .await?;

        let analysis = parse_analysis(&raw)?;

        if analysis.tickets.is_empty() {
            tracing::warn!("No tickets extracted from meeting transcript");
        } else {
            tracing::info!(
                ticket_count = analysis.tickets.len(),
                project_name = ?analysis.project_name,
                "Extracted tickets from meeting"
            );
        }

        Ok(analysis)
    }
}
