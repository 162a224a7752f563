//! Prompt Selection
//!
//! Decides which instruction template governs the next model call. The story
//! has exactly two modes: it keeps going until the reader sends the closing
//! phrase, at which point the model is asked for a summary instead.

use crate::story::PromptKind;
use std::collections::HashMap;

/// The exact reader input that ends the story and asks for a summary.
pub const FINISH_SENTINEL: &str = "Finish my story";

/// Prompt directory key for the story-continuation template.
pub const STORY_PROMPT_KEY: &str = "story_prompt";
/// Prompt directory key for the summary template.
pub const SUMMARY_PROMPT_KEY: &str = "summary_prompt";

const DEFAULT_STORY_PROMPT: &str = include_str!("../prompts/story_prompt.md");
const DEFAULT_SUMMARY_PROMPT: &str = include_str!("../prompts/summary_prompt.md");

/// Maps the reader's latest input to the prompt kind for this turn.
///
/// Only an exact, case-sensitive match of [`FINISH_SENTINEL`] selects
/// [`PromptKind::Summarize`].
pub fn select(user_input: &str) -> PromptKind {
    if user_input == FINISH_SENTINEL {
        PromptKind::Summarize
    } else {
        PromptKind::Continue
    }
}

/// The instruction templates for both story modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    pub story: String,
    pub summary: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            story: DEFAULT_STORY_PROMPT.trim().to_string(),
            summary: DEFAULT_SUMMARY_PROMPT.trim().to_string(),
        }
    }
}

impl PromptTemplates {
    /// Builds templates from a map of prompt files keyed by file stem,
    /// falling back to the built-in template for any key that is missing.
    pub fn from_map(prompts: &HashMap<String, String>) -> Self {
        let defaults = Self::default();
        let pick = |key: &str, fallback: String| {
            prompts
                .get(key)
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty())
                .unwrap_or(fallback)
        };
        Self {
            story: pick(STORY_PROMPT_KEY, defaults.story),
            summary: pick(SUMMARY_PROMPT_KEY, defaults.summary),
        }
    }

    /// The instruction template for `kind`.
    pub fn for_kind(&self, kind: PromptKind) -> &str {
        match kind {
            PromptKind::Continue => &self.story,
            PromptKind::Summarize => &self.summary,
        }
    }
}
