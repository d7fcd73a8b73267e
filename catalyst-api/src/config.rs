//! Service configuration for catalyst-api
//!
//! External credentials resolve with ENV → TOML priority; everything else comes
//! from the TOML file with compiled defaults. Resolution happens once at
//! startup and the result is injected into every client.

use catalyst_common::config::TomlConfig;
use std::time::Duration;
use tracing::{info, warn};

pub const DEFAULT_LLM_BASE_URL: &str = "https://integrate.api.nvidia.com/v1";
/// Model used by the meeting analyzer and diagram generator
pub const DEFAULT_AGENT_MODEL: &str = "meta/llama-3.1-70b-instruct";
/// Model used for PRDs, user stories, action items and summaries
pub const DEFAULT_DELIVERABLE_MODEL: &str = "nvidia/llama-3.3-nemotron-super-49b-v1.5";
pub const DEFAULT_SPEECH_BASE_URL: &str = "https://api.deepgram.com/v1";
pub const DEFAULT_NOTES_BASE_URL: &str = "https://api.notion.com/v1";

pub const LLM_API_KEY_ENV: &str = "NVIDIA_API_KEY";
pub const SPEECH_API_KEY_ENV: &str = "DEEPGRAM_API_KEY";
pub const NOTES_API_KEY_ENV: &str = "NOTION_API_KEY";
pub const NOTES_PARENT_PAGE_ENV: &str = "NOTION_PARENT_PAGE_ID";

#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    pub agent_model: String,
    pub deliverable_model: String,
}

#[derive(Debug, Clone)]
pub struct SpeechSettings {
    pub base_url: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NotesSettings {
    pub base_url: String,
    pub api_key: Option<String>,
    /// Default parent page for exported pages
    pub parent_page_id: Option<String>,
}

/// Resolved configuration for every outbound integration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub llm: LlmSettings,
    pub speech: SpeechSettings,
    pub notes: NotesSettings,
    pub workflow_timeout: Duration,
    pub transcription_timeout: Duration,
}

impl Default for ServiceConfig {
    /// Compiled defaults with no credentials
    fn default() -> Self {
        Self {
            llm: LlmSettings {
                base_url: DEFAULT_LLM_BASE_URL.to_string(),
                api_key: None,
                agent_model: DEFAULT_AGENT_MODEL.to_string(),
                deliverable_model: DEFAULT_DELIVERABLE_MODEL.to_string(),
            },
            speech: SpeechSettings {
                base_url: DEFAULT_SPEECH_BASE_URL.to_string(),
                api_key: None,
            },
            notes: NotesSettings {
                base_url: DEFAULT_NOTES_BASE_URL.to_string(),
                api_key: None,
                parent_page_id: None,
            },
            workflow_timeout: Duration::from_secs(300),
            transcription_timeout: Duration::from_secs(120),
        }
    }
}

impl ServiceConfig {
    /// Resolve from environment and TOML
    pub fn resolve(toml_config: &TomlConfig) -> Self {
        let defaults = Self::default();

        Self {
            llm: LlmSettings {
                base_url: toml_config
                    .llm
                    .base_url
                    .clone()
                    .unwrap_or(defaults.llm.base_url),
                api_key: resolve_credential("LLM API key", LLM_API_KEY_ENV, toml_config.llm.api_key.as_deref()),
                agent_model: toml_config
                    .llm
                    .agent_model
                    .clone()
                    .unwrap_or(defaults.llm.agent_model),
                deliverable_model: toml_config
                    .llm
                    .deliverable_model
                    .clone()
                    .unwrap_or(defaults.llm.deliverable_model),
            },
            speech: SpeechSettings {
                base_url: toml_config
                    .speech
                    .base_url
                    .clone()
                    .unwrap_or(defaults.speech.base_url),
                api_key: resolve_credential(
                    "Speech API key",
                    SPEECH_API_KEY_ENV,
                    toml_config.speech.api_key.as_deref(),
                ),
            },
            notes: NotesSettings {
                base_url: toml_config
                    .notes
                    .base_url
                    .clone()
                    .unwrap_or(defaults.notes.base_url),
                api_key: resolve_credential(
                    "Notes API key",
                    NOTES_API_KEY_ENV,
                    toml_config.notes.api_key.as_deref(),
                ),
                parent_page_id: resolve_credential(
                    "Notes parent page",
                    NOTES_PARENT_PAGE_ENV,
                    toml_config.notes.parent_page_id.as_deref(),
                ),
            },
            workflow_timeout: Duration::from_secs(toml_config.timeouts.workflow_secs),
            transcription_timeout: Duration::from_secs(toml_config.timeouts.transcription_secs),
        }
    }
}

/// Resolve one credential with ENV → TOML priority
///
/// A missing credential is not an error at startup; the client that needs it
/// reports itself unconfigured when called.
pub fn resolve_credential(label: &str, env_var: &str, toml_value: Option<&str>) -> Option<String> {
    let env_value = std::env::var(env_var).ok().filter(|v| is_valid_key(v));
    let toml_value = toml_value.filter(|v| is_valid_key(v));

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} found in multiple sources: environment, TOML. Using environment (highest priority).",
            label
        );
    }

    if let Some(value) = env_value {
        info!("{} loaded from environment variable {}", label, env_var);
        return Some(value.trim().to_string());
    }

    if let Some(value) = toml_value {
        info!("{} loaded from TOML config", label);
        return Some(value.trim().to_string());
    }

    warn!("{} not configured (set {} or the TOML config)", label, env_var);
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
