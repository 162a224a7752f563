//! API Models
//!
//! Request and response bodies of the story service, with `utoipa` schemas
//! for the OpenAPI document. Bodies keep the field names the web client
//! already sends (`chat_history`, `user_input`, `user_info`, `imageUrl_base64`).

use agapai_core::{Identity, Role, StoryOutput, Turn};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    #[serde(alias = "USER")]
    User,
    #[serde(alias = "CHATBOT", alias = "chatbot")]
    Assistant,
}

impl From<MessageRole> for Role {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => Role::User,
            MessageRole::Assistant => Role::Assistant,
        }
    }
}

/// One prior message of the story conversation.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone)]
pub struct ChatMessage {
    #[schema(value_type = String, example = "user")]
    pub role: MessageRole,
    #[schema(example = "I want to open a small bakery.")]
    pub message: String,
}

impl From<ChatMessage> for Turn {
    fn from(msg: ChatMessage) -> Self {
        Turn {
            role: msg.role.into(),
            text: msg.message,
        }
    }
}

/// Details about the reader used to personalize the story.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    #[schema(example = "Ana")]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl From<UserInfo> for Identity {
    fn from(info: UserInfo) -> Self {
        Identity {
            id: info.uid,
            first_name: info.first_name,
            last_name: info.last_name,
            email: info.email,
        }
    }
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct StoryRequest {
    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
    #[schema(example = "Save half of my profits every week")]
    pub user_input: String,
    #[serde(default)]
    pub user_info: Option<UserInfo>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct StoryResponse {
    pub narrative: String,
    pub choices: Vec<String>,
}

impl From<StoryOutput> for StoryResponse {
    fn from(output: StoryOutput) -> Self {
        Self {
            narrative: output.narrative,
            choices: output.choices,
        }
    }
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct ImageRequest {
    #[schema(example = "A young woman opening her first sari-sari store")]
    pub prompt: String,
}

#[derive(Serialize, Deserialize, ToSchema, Debug)]
pub struct ImageResponse {
    #[serde(rename = "imageUrl_base64")]
    pub image_base64: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}
