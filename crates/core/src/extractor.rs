//! Structured output extraction from free-form model text.
//!
//! Models tend to wrap the JSON they were asked for in prose or markdown
//! fences, so the payload is taken as the span between the first `{` and the
//! last `}` before it is parsed.

use crate::story::StoryOutput;
use serde::Deserialize;

/// The outcome of extracting a [`StoryOutput`] from raw model text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionResult {
    /// A well-formed payload was found and parsed.
    Parsed(StoryOutput),
    /// No usable payload; carries the raw text unchanged.
    Malformed(String),
}

#[derive(Deserialize)]
struct StoryPayload {
    narrative: String,
    choices: Vec<String>,
}

/// Returns the span from the first `{` to the last `}` inclusive, if the
/// opening brace comes before the closing one.
pub fn bracket_bound(raw_text: &str) -> Option<&str> {
    let start = raw_text.find('{')?;
    let end = raw_text.rfind('}')?;
    if start < end {
        Some(&raw_text[start..=end])
    } else {
        None
    }
}

/// Extracts a [`StoryOutput`] from `raw_text`.
///
/// Never fails: anything that is not a bracket-bounded object with a string
/// `narrative` and a string-array `choices` yields
/// [`ExtractionResult::Malformed`]. The parsed fields are returned verbatim.
pub fn extract(raw_text: &str) -> ExtractionResult {
    let Some(candidate) = bracket_bound(raw_text) else {
        return ExtractionResult::Malformed(raw_text.to_string());
    };

    match serde_json::from_str::<StoryPayload>(candidate) {
        Ok(payload) => ExtractionResult::Parsed(StoryOutput {
            narrative: payload.narrative,
            choices: payload.choices,
        }),
        Err(_) => ExtractionResult::Malformed(raw_text.to_string()),
    }
}
