//! AgapAI Story Core
//!
//! The turn-based narrative engine: prompt selection, request composition,
//! structured extraction of model output and the orchestrator tying them
//! together, plus the backend adapters the service wires in at startup.

pub mod cohere;
pub mod composer;
pub mod extractor;
pub mod image;
pub mod llm_client;
pub mod orchestrator;
pub mod prompt;
pub mod story;

#[cfg(test)]
mod test_support;

pub use composer::{ModelRequest, RequestComposer};
pub use extractor::{ExtractionResult, extract};
pub use llm_client::{BackendError, NarrativeModel};
pub use orchestrator::{ChoicePolicy, ConversationOrchestrator, OrchestrationError};
pub use story::{Identity, PromptKind, Role, StoryOutput, Turn};
