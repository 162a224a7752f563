//! Request Composition
//!
//! Builds the payload handed to a [`NarrativeModel`](crate::llm_client::NarrativeModel)
//! from the selected prompt kind, the caller's history, the reader's input and
//! optional identity details.

use crate::{
    prompt::PromptTemplates,
    story::{Identity, PromptKind, Turn},
};

/// Upper bound on tokens the model may generate for one turn.
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Longest identity field, in characters, that is embedded in instruction text.
pub const MAX_IDENTITY_FIELD_CHARS: usize = 128;

/// Appended to every continuation message so the model answers with JSON only.
pub const JSON_REMINDER: &str = "Remember: respond with only a JSON object containing the keys \"narrative\" and \"choices\".";

/// The fixed message sent in place of the reader's input on the closing turn.
pub const SUMMARY_REQUEST: &str =
    "Please summarize my story so far and give me the key financial takeaways.";

/// Everything a narrative backend needs to produce the next turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRequest {
    /// The governing instruction text (system prompt / preamble).
    pub instruction_text: String,
    /// Prior turns, oldest first, exactly as supplied by the caller.
    pub history: Vec<Turn>,
    /// The message for this turn.
    pub message: String,
    pub max_tokens: u32,
}

/// Assembles [`ModelRequest`]s from a fixed set of templates.
#[derive(Debug, Clone, Default)]
pub struct RequestComposer {
    templates: PromptTemplates,
}

impl RequestComposer {
    pub fn new(templates: PromptTemplates) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &PromptTemplates {
        &self.templates
    }

    /// Composes the request for one turn.
    ///
    /// On a [`PromptKind::Summarize`] turn the reader's input only served to
    /// pick the template; the message becomes [`SUMMARY_REQUEST`] and the
    /// identity is ignored.
    pub fn compose(
        &self,
        kind: PromptKind,
        history: &[Turn],
        user_input: &str,
        identity: Option<&Identity>,
    ) -> ModelRequest {
        let mut instruction_text = self.templates.for_kind(kind).to_string();

        let message = match kind {
            PromptKind::Continue => {
                if let Some(block) = identity.and_then(personalization_block) {
                    instruction_text.push_str("\n\n");
                    instruction_text.push_str(&block);
                }
                format!("{user_input}\n\n{JSON_REMINDER}")
            }
            PromptKind::Summarize => SUMMARY_REQUEST.to_string(),
        };

        ModelRequest {
            instruction_text,
            history: history.to_vec(),
            message,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

/// Renders the personalization block, or `None` when every field is blank.
fn personalization_block(identity: &Identity) -> Option<String> {
    let first_name = sanitize_field(&identity.first_name);
    let last_name = sanitize_field(&identity.last_name);
    let email = sanitize_field(&identity.email);
    let id = sanitize_field(&identity.id);

    let name = [first_name.as_str(), last_name.as_str()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let mut lines = Vec::new();
    if !name.is_empty() {
        lines.push(format!("- Name: {name}"));
    }
    if !email.is_empty() {
        lines.push(format!("- Email: {email}"));
    }
    if !id.is_empty() {
        lines.push(format!("- UID: {id}"));
    }
    if lines.is_empty() {
        return None;
    }

    let mut block = String::from("User information:\n");
    block.push_str(&lines.join("\n"));
    block.push_str(
        "\n\nUse this information to make the story feel personal to them, greeting them by name when appropriate.",
    );
    Some(block)
}

/// Flattens an untrusted identity field onto a single bounded line.
///
/// Control characters become spaces, whitespace runs collapse, and the result
/// is cut to [`MAX_IDENTITY_FIELD_CHARS`].
fn sanitize_field(raw: &str) -> String {
    let flattened: String = raw
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    flattened
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_IDENTITY_FIELD_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}
