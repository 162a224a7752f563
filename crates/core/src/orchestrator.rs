//! Conversation Turn Orchestrator
//!
//! Runs one story turn end to end: select the prompt, compose the request,
//! call the narrative model and extract a structured result. The orchestrator
//! keeps no state between calls; the story's progress lives entirely in the
//! history the caller sends.

use crate::{
    composer::RequestComposer,
    extractor::{ExtractionResult, extract},
    llm_client::{BackendError, NarrativeModel},
    prompt,
    story::{Identity, PromptKind, StoryOutput, Turn},
};
use std::sync::Arc;
use tracing::{debug, warn};

pub const FALLBACK_NARRATIVE: &str =
    "I'm sorry, I got my thoughts tangled. Could you please try again?";
pub const FALLBACK_CHOICE: &str = "Let's try that again.";

/// The output returned in place of a response that could not be extracted.
pub fn fallback_output() -> StoryOutput {
    StoryOutput {
        narrative: FALLBACK_NARRATIVE.to_string(),
        choices: vec![FALLBACK_CHOICE.to_string()],
    }
}

/// How far a parsed model answer is trusted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChoicePolicy {
    /// Return whatever the model produced, as long as it parsed.
    #[default]
    Trust,
    /// Treat a blank narrative, or a choice count that does not fit the turn
    /// (2 or 3 when continuing, none when summarizing), as malformed.
    Enforce,
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    #[error("Narrative backend failed: {0}")]
    Backend(#[from] BackendError),
    #[error("Narrative backend returned a malformed response")]
    Malformed { raw: String },
}

/// Drives story turns against an injected [`NarrativeModel`].
pub struct ConversationOrchestrator {
    model: Arc<dyn NarrativeModel>,
    composer: RequestComposer,
    choice_policy: ChoicePolicy,
}

impl ConversationOrchestrator {
    pub fn new(model: Arc<dyn NarrativeModel>, composer: RequestComposer) -> Self {
        Self {
            model,
            composer,
            choice_policy: ChoicePolicy::default(),
        }
    }

    pub fn with_choice_policy(mut self, choice_policy: ChoicePolicy) -> Self {
        self.choice_policy = choice_policy;
        self
    }

    pub fn choice_policy(&self) -> ChoicePolicy {
        self.choice_policy
    }

    /// Runs one turn, recovering from malformed model output.
    ///
    /// A response that cannot be extracted becomes [`fallback_output`], so the
    /// only error that escapes is [`OrchestrationError::Backend`].
    pub async fn run_turn(
        &self,
        history: &[Turn],
        user_input: &str,
        identity: Option<&Identity>,
    ) -> Result<StoryOutput, OrchestrationError> {
        match self.run_turn_strict(history, user_input, identity).await {
            Err(OrchestrationError::Malformed { raw }) => {
                warn!(raw_len = raw.len(), raw = %raw, "Malformed narrative response; using fallback");
                Ok(fallback_output())
            }
            other => other,
        }
    }

    /// Runs one turn and reports malformed model output as
    /// [`OrchestrationError::Malformed`] instead of recovering from it.
    pub async fn run_turn_strict(
        &self,
        history: &[Turn],
        user_input: &str,
        identity: Option<&Identity>,
    ) -> Result<StoryOutput, OrchestrationError> {
        let kind = prompt::select(user_input);
        debug!(?kind, history_len = history.len(), personalized = identity.is_some(), "Prompt selected");

        let request = self.composer.compose(kind, history, user_input, identity);
        let raw_text = self.model.generate(request).await?;

        match extract(&raw_text) {
            ExtractionResult::Parsed(output) if self.accepts(&output, kind) => Ok(output),
            ExtractionResult::Parsed(output) => {
                debug!(?kind, choices = output.choices.len(), "Parsed output rejected by choice policy");
                Err(OrchestrationError::Malformed { raw: raw_text })
            }
            ExtractionResult::Malformed(raw) => Err(OrchestrationError::Malformed { raw }),
        }
    }

    fn accepts(&self, output: &StoryOutput, kind: PromptKind) -> bool {
        match self.choice_policy {
            ChoicePolicy::Trust => true,
            ChoicePolicy::Enforce => output.has_expected_shape(kind),
        }
    }
}
