//! Outbound integrations: LLM completion, speech-to-text, notes export

pub mod deliverables;
pub mod llm_client;
pub mod notes_client;
pub mod speech_client;

pub use deliverables::{DeliverableGenerator, DeliverableKind};
pub use llm_client::{ChatCompletionClient, CompletionClient, CompletionRequest, LlmError};
pub use notes_client::{ExportedPage, NotesClient, NotesError};
pub use speech_client::{SpeechClient, SpeechError, Transcription};
