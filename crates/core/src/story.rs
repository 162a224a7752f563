/// Who authored a turn in the story conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// A single role-tagged message in the conversation history.
///
/// The history is supplied by the caller on every turn and is only ever read
/// by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Optional details about the reader, used only to personalize the story.
///
/// Every field is untrusted caller input and may be blank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// The structured result of a story turn: the next story segment and the
/// choices the reader can pick from.
///
/// Non-terminal turns are expected to carry two or three choices; a summary
/// turn carries none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryOutput {
    pub narrative: String,
    pub choices: Vec<String>,
}

impl StoryOutput {
    /// Whether this output has the shape expected for a turn of `kind`.
    pub fn has_expected_shape(&self, kind: PromptKind) -> bool {
        if self.narrative.trim().is_empty() {
            return false;
        }
        match kind {
            PromptKind::Continue => matches!(self.choices.len(), 2 | 3),
            PromptKind::Summarize => self.choices.is_empty(),
        }
    }
}

/// Which instruction template governs the next model call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    /// Continue the story and offer the next choices.
    Continue,
    /// Close the story with a summary and takeaways.
    Summarize,
}
