//! Meeting-notes deliverables: PRD, user stories, action items, summary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use super::llm_client::{CompletionClient, CompletionRequest, LlmError};

/// Kind of document generated from meeting notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliverableKind {
    Prd,
    UserStory,
    ActionItems,
    Summary,
}

impl DeliverableKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliverableKind::Prd => "prd",
            DeliverableKind::UserStory => "user_story",
            DeliverableKind::ActionItems => "action_items",
            DeliverableKind::Summary => "summary",
        }
    }

    fn temperature(&self) -> f32 {
        match self {
            DeliverableKind::Prd | DeliverableKind::UserStory => 0.7,
            DeliverableKind::ActionItems | DeliverableKind::Summary => 0.5,
        }
    }

    fn max_tokens(&self) -> u32 {
        match self {
            DeliverableKind::Prd | DeliverableKind::UserStory => 2048,
            DeliverableKind::ActionItems | DeliverableKind::Summary => 1024,
        }
    }

    fn prompt(&self, notes: &str) -> String {
        match self {
            DeliverableKind::Prd => format!(
                "You are an expert Product Manager. Convert the following meeting notes into a comprehensive Product Requirements Document (PRD).\n\n\
                 Meeting Notes:\n{}\n\n\
                 Generate a well-structured PRD with the following sections:\n\
                 1. Executive Summary\n\
                 2. Problem Statement\n\
                 3. Goals and Objectives\n\
                 4. User Stories\n\
                 5. Functional Requirements\n\
                 6. Non-Functional Requirements\n\
                 7. Success Metrics\n\
                 8. Timeline and Milestones\n\n\
                 Format the output in clear markdown with proper headings and bullet points.",
                notes
            ),
            DeliverableKind::UserStory => format!(
                "You are an expert Product Manager. Convert the following meeting notes into well-structured user stories.\n\n\
                 Meeting Notes:\n{}\n\n\
                 Generate user stories in the format:\n\
                 - Title: [Brief title]\n\
                 - As a [user type]\n\
                 - I want [goal]\n\
                 - So that [benefit]\n\
                 - Acceptance Criteria:\n  \
                 - [criterion 1]\n  \
                 - [criterion 2]\n  \
                 - [criterion 3]\n\n\
                 Create multiple user stories covering all features and requirements mentioned in the notes. Format in markdown.",
                notes
            ),
            DeliverableKind::ActionItems => format!(
                "You are an expert Project Manager. Extract all action items from the following meeting notes.\n\n\
                 Meeting Notes:\n{}\n\n\
                 Generate a list of action items with the following format:\n\
                 - Task: [Clear description of the task]\n\
                 - Assignee: [Person responsible, if mentioned]\n\
                 - Deadline: [Due date, if mentioned]\n\
                 - Priority: [High/Medium/Low based on context]\n\n\
                 Format the output in markdown with clear sections. If information is not available, mark as \"TBD\".",
                notes
            ),
            DeliverableKind::Summary => format!(
                "You are an expert at summarizing meetings. Create a concise, well-organized summary of the following meeting notes.\n\n\
                 Meeting Notes:\n{}\n\n\
                 Generate a summary with:\n\
                 1. Key Points Discussed\n\
                 2. Decisions Made\n\
                 3. Next Steps\n\
                 4. Open Questions\n\n\
                 Keep it concise but comprehensive. Format in markdown.",
                notes
            ),
        }
    }
}

impl fmt::Display for DeliverableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliverableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prd" => Ok(DeliverableKind::Prd),
            "user_story" => Ok(DeliverableKind::UserStory),
            "action_items" => Ok(DeliverableKind::ActionItems),
            "summary" => Ok(DeliverableKind::Summary),
            other => Err(format!("Invalid output_type: {}", other)),
        }
    }
}

/// Generates markdown deliverables from meeting notes
pub struct DeliverableGenerator {
    llm: Arc<dyn CompletionClient>,
    model: String,
}

impl DeliverableGenerator {
    pub fn new(llm: Arc<dyn CompletionClient>, model: impl Into<String>) -> Self {
        Self { llm, model: model.into() }
    }

    pub async fn generate(&self, kind: DeliverableKind, notes: &str) -> Result<String, LlmError> {
        tracing::info!(kind = %kind, notes_chars = notes.len(), "Generating deliverable");

        self.llm
            .complete(CompletionRequest {
                model: self.model.clone(),
                system: None,
                user: kind.prompt(notes),
                temperature: kind.temperature(),
                max_tokens: kind.max_tokens(),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl CompletionClient for Recorder {
        async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
            self.seen.lock().unwrap().push(request);
            Ok("# Doc".to_string())
        }
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("prd".parse::<DeliverableKind>().unwrap(), DeliverableKind::Prd);
        assert_eq!("user_story".parse::<DeliverableKind>().unwrap(), DeliverableKind::UserStory);
        assert_eq!("action_items".parse::<DeliverableKind>().unwrap(), DeliverableKind::ActionItems);
        assert_eq!("summary".parse::<DeliverableKind>().unwrap(), DeliverableKind::Summary);
        assert!("minutes".parse::<DeliverableKind>().is_err());
    }

    #[tokio::test]
    async fn test_generation_settings_per_kind() {
        let recorder = Arc::new(Recorder { seen: Mutex::new(Vec::new()) });
        let generator = DeliverableGenerator::new(recorder.clone(), "model-x");

        generator.generate(DeliverableKind::Prd, "notes").await.unwrap();
        generator.generate(DeliverableKind::Summary, "notes").await.unwrap();

        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen[0].model, "model-x");
        assert_eq!(seen[0].temperature, 0.7);
        assert_eq!(seen[0].max_tokens, 2048);
        assert!(seen[0].user.contains("Product Requirements Document"));
        assert_eq!(seen[1].temperature, 0.5);
        assert_eq!(seen[1].max_tokens, 1024);
        assert!(seen[1].system.is_none());
    }
}
