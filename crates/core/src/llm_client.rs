use crate::{
    composer::ModelRequest,
    story::{Role, Turn},
};
use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, CreateChatCompletionResponse,
    },
};
use async_trait::async_trait;
use tracing::debug;

/// Failures of a narrative backend. None of these are retried by the core.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
    #[error("Invalid model request: {0}")]
    InvalidRequest(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Backend rejected the request: {0}")]
    Rejected(String),
    #[error("Failed to parse backend response: {0}")]
    Parse(String),
    #[error("Backend response had no text content")]
    EmptyResponse,
}

impl From<OpenAIError> for BackendError {
    fn from(err: OpenAIError) -> Self {
        match err {
            OpenAIError::Reqwest(e) => Self::Network(e.to_string()),
            OpenAIError::ApiError(e) => Self::Rejected(e.message),
            OpenAIError::JSONDeserialize(e) => Self::Parse(e.to_string()),
            OpenAIError::InvalidArgument(msg) => Self::InvalidRequest(msg),
            other => Self::Network(other.to_string()),
        }
    }
}

/// A language model that continues the story.
///
/// Implementations map a [`ModelRequest`] onto one backend call and return
/// the raw answer text untouched; interpreting that text is the extractor's job.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NarrativeModel: Send + Sync {
    /// Makes a single, non-streaming call and returns the raw response text.
    async fn generate(&self, request: ModelRequest) -> Result<String, BackendError>;
}

/// An implementation of `NarrativeModel` for any OpenAI-compatible API.
pub struct OpenAICompatibleModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAICompatibleModel {
    /// Creates a new client for an OpenAI-compatible service.
    ///
    /// # Arguments
    ///
    /// * `config` - The configuration for the OpenAI client, including API key and base URL.
    /// * `model` - The model identifier to use for chat completions (e.g., "gpt-4o").
    pub fn new(config: OpenAIConfig, model: String) -> Self {
        Self {
            client: Client::with_config(config),
            model,
        }
    }
}

/// Lays a request out as chat messages: the instruction text as the system
/// message, then the history in order, then this turn's message.
pub fn to_chat_messages(
    request: &ModelRequest,
) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
    let mut messages: Vec<ChatCompletionRequestMessage> =
        Vec::with_capacity(request.history.len() + 2);
    messages.push(
        ChatCompletionRequestSystemMessageArgs::default()
            .content(request.instruction_text.clone())
            .build()?
            .into(),
    );
    for Turn { role, text } in &request.history {
        let message: ChatCompletionRequestMessage = match role {
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(text.clone())
                .build()?
                .into(),
            Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(text.clone())
                .build()?
                .into(),
        };
        messages.push(message);
    }
    messages.push(
        ChatCompletionRequestUserMessageArgs::default()
            .content(request.message.clone())
            .build()?
            .into(),
    );
    Ok(messages)
}

#[async_trait]
impl NarrativeModel for OpenAICompatibleModel {
    async fn generate(&self, request: ModelRequest) -> Result<String, BackendError> {
        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(to_chat_messages(&request)?)
            .max_completion_tokens(request.max_tokens)
            .build()?;

        debug!(model = %self.model, turns = request.history.len(), "Requesting chat completion");
        let response: CreateChatCompletionResponse = self.client.chat().create(chat_request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(BackendError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ModelRequest {
        ModelRequest {
            instruction_text: "Tell a story.".to_string(),
            history: vec![Turn::user("Hi"), Turn::assistant("Hello!")],
            message: "Open a bakery".to_string(),
            max_tokens: 2048,
        }
    }

    #[test]
    fn test_chat_messages_follow_request_order() {
        let messages = to_chat_messages(&request()).unwrap();

        assert_eq!(messages.len(), 4);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(messages[2], ChatCompletionRequestMessage::Assistant(_)));
        assert!(matches!(messages[3], ChatCompletionRequestMessage::User(_)));
    }

    #[test]
    fn test_chat_messages_without_history() {
        let mut request = request();
        request.history.clear();

        let messages = to_chat_messages(&request).unwrap();

        assert_eq!(messages.len(), 2);
        let json = serde_json::to_value(&messages).unwrap();
        assert_eq!(json[0]["role"], "system");
        assert_eq!(json[0]["content"], "Tell a story.");
        assert_eq!(json[1]["role"], "user");
        assert_eq!(json[1]["content"], "Open a bakery");
    }

    #[test]
    fn test_backend_error_display() {
        assert_eq!(
            BackendError::Rejected("rate limited".to_string()).to_string(),
            "Backend rejected the request: rate limited"
        );
        assert_eq!(
            BackendError::EmptyResponse.to_string(),
            "Backend response had no text content"
        );
    }

    #[test]
    fn test_client_build_error_display() {
        assert_eq!(
            BackendError::ClientBuild("no TLS backend".to_string()).to_string(),
            "Failed to build HTTP client: no TLS backend"
        );
    }

    #[test]
    fn test_openai_invalid_argument_maps_to_invalid_request() {
        let err: BackendError = OpenAIError::InvalidArgument("bad".to_string()).into();
        assert!(matches!(err, BackendError::InvalidRequest(msg) if msg == "bad"));
    }
}
