//! Weighted prompts and the active-set rules.
//!
//! The UI owns the prompt grid; the core only ever receives immutable
//! snapshots (`PromptMap`) and derives the payload actually sent to the
//! remote session from them.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Id of the substitute prompt used when no user prompt carries any weight.
pub const DEFAULT_PROMPT_ID: &str = "default-prompt";

/// Text of the substitute prompt.
pub const DEFAULT_PROMPT_TEXT: &str = "4 to teh floor";

/// A single prompt cell as owned by the UI collaborator.
///
/// `prompt_id` is unique and stable for the UI lifetime; the remote session
/// identifies prompts by `text`, not by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub prompt_id: String,
    pub text: String,
    /// Steering strength in `[0, 2]`.
    pub weight: f64,
    /// MIDI CC assignment, `-1` if unassigned.
    pub cc: i32,
    pub color: String,
}

/// The payload shape transmitted to the remote session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedPrompt {
    pub text: String,
    pub weight: f64,
}

impl From<&Prompt> for WeightedPrompt {
    fn from(p: &Prompt) -> Self {
        Self {
            text: p.text.clone(),
            weight: p.weight,
        }
    }
}

/// Immutable prompt snapshot, keyed by prompt id.
pub type PromptMap = HashMap<String, Prompt>;

/// Derive the set of prompts to transmit from a snapshot.
///
/// Rules:
/// - No prompt with `weight > 0` at all: a single default prompt
///   (`default-prompt`, weight 1.0) so the session always receives guidance.
/// - Otherwise the weight-positive prompts minus any whose text the session
///   has filtered. If every weighted prompt is filtered this is empty,
///   which tells the session to continue unsteered.
pub fn active_prompts(prompts: &PromptMap, filtered: &HashSet<String>) -> Vec<WeightedPrompt> {
    let weighted: Vec<&Prompt> = prompts.values().filter(|p| p.weight > 0.0).collect();

    if weighted.is_empty() {
        return vec![WeightedPrompt {
            text: DEFAULT_PROMPT_TEXT.to_string(),
            weight: 1.0,
        }];
    }

    weighted
        .into_iter()
        .filter(|p| !filtered.contains(&p.text))
        .map(WeightedPrompt::from)
        .collect()
}
