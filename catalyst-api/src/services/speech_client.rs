//! Speech-to-text client (Deepgram pre-recorded transcription)

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::SpeechSettings;

/// Query string sent with every transcription request
const LISTEN_OPTIONS: &str = "model=nova-2&smart_format=true&diarize=true&punctuate=true&paragraphs=true&utterances=true&language=en";

pub const DEFAULT_MIMETYPE: &str = "audio/wav";

/// Speech client errors
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("DEEPGRAM_API_KEY is not configured")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{0}")]
    NoResults(String),
}

/// Transcript with the metadata callers display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub transcript: String,
    pub metadata: TranscriptionMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionMetadata {
    /// Audio duration in seconds
    pub duration: f64,
    pub channels: u32,
}

#[derive(Debug, Deserialize)]
struct ListenResponse {
    metadata: Option<ListenMetadata>,
    results: Option<ListenResults>,
}

#[derive(Debug, Deserialize)]
struct ListenMetadata {
    duration: Option<f64>,
    channels: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ListenResults {
    #[serde(default)]
    channels: Vec<ListenChannel>,
}

#[derive(Debug, Deserialize)]
struct ListenChannel {
    #[serde(default)]
    alternatives: Vec<ListenAlternative>,
}

#[derive(Debug, Deserialize)]
struct ListenAlternative {
    transcript: Option<String>,
}

impl ListenResponse {
    fn into_transcription(self) -> Result<Transcription, SpeechError> {
        let channel = self
            .results
            .and_then(|results| results.channels.into_iter().next())
            .ok_or_else(|| SpeechError::NoResults("No transcription results returned".to_string()))?;

        let alternative = channel
            .alternatives
            .into_iter()
            .next()
            .ok_or_else(|| SpeechError::NoResults("No transcript alternatives found".to_string()))?;

        let metadata = TranscriptionMetadata {
            duration: self.metadata.as_ref().and_then(|m| m.duration).unwrap_or(0.0),
            channels: self.metadata.as_ref().and_then(|m| m.channels).unwrap_or(1),
        };

        Ok(Transcription {
            transcript: alternative.transcript.unwrap_or_default(),
            metadata,
        })
    }
}

pub struct SpeechClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl SpeechClient {
    pub fn new(settings: &SpeechSettings) -> Result<Self, SpeechError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Transcribe a pre-recorded audio file
    pub async fn transcribe(&self, audio: Vec<u8>, mimetype: &str) -> Result<Transcription, SpeechError> {
        let api_key = self.api_key.as_deref().ok_or(SpeechError::NotConfigured)?;

        let url = format!("{}/listen?{}", self.base_url, LISTEN_OPTIONS);
        tracing::info!(bytes = audio.len(), mimetype = %mimetype, "Transcribing audio file");

        let response = self
            .http_client
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, format!("Token {}", api_key))
            .header(reqwest::header::CONTENT_TYPE, mimetype)
            .body(audio)
            .send()
            .await
            .map_err(|e| SpeechError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(SpeechError::Api(status.as_u16(), error_text));
        }

        let parsed: ListenResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::Parse(e.to_string()))?;

        let transcription = parsed.into_transcription()?;
        tracing::info!(chars = transcription.transcript.len(), "Transcription complete");
        Ok(transcription)
    }
}
