//! Cohere chat backend.
//!
//! Maps a [`ModelRequest`] onto Cohere's v1 chat endpoint: the instruction
//! text travels as the `preamble` and prior turns as `chat_history`.

use crate::{
    composer::ModelRequest,
    llm_client::{BackendError, NarrativeModel},
    story::Role,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub const COHERE_API_BASE: &str = "https://api.cohere.com/v1";
pub const DEFAULT_COHERE_MODEL: &str = "command-r-plus";

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    preamble: &'a str,
    chat_history: Vec<ChatHistoryEntry<'a>>,
    message: &'a str,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatHistoryEntry<'a> {
    role: &'static str,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    text: Option<String>,
}

fn cohere_role(role: Role) -> &'static str {
    match role {
        Role::User => "USER",
        Role::Assistant => "CHATBOT",
    }
}

fn chat_body<'a>(model: &'a str, request: &'a ModelRequest) -> ChatBody<'a> {
    ChatBody {
        model,
        preamble: &request.instruction_text,
        chat_history: request
            .history
            .iter()
            .map(|turn| ChatHistoryEntry {
                role: cohere_role(turn.role),
                message: &turn.text,
            })
            .collect(),
        message: &request.message,
        max_tokens: request.max_tokens,
    }
}

/// A `NarrativeModel` backed by Cohere's chat API.
#[derive(Clone)]
pub struct CohereModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl CohereModel {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| BackendError::ClientBuild(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            api_base: COHERE_API_BASE.to_string(),
        })
    }

    /// Points the client at a different API base, e.g. a proxy.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[async_trait]
impl NarrativeModel for CohereModel {
    async fn generate(&self, request: ModelRequest) -> Result<String, BackendError> {
        debug!(model = %self.model, turns = request.history.len(), "Requesting Cohere chat");

        let response = self
            .client
            .post(format!("{}/chat", self.api_base.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&chat_body(&self.model, &request))
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Rejected(format!("status {}: {}", status.as_u16(), body)));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Parse(e.to_string()))?;

        // Empty text is still an answer; the extractor decides what it is worth.
        chat.text.ok_or(BackendError::EmptyResponse)
    }
}
