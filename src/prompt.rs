//! Prompt Composer — wraps the learner's narrative in the fixed
//! instructional template.
//!
//! The template is an opaque, versioned artifact under `prompts/` and is
//! embedded at compile time. It is never parsed or parameterized; prompt
//! content changes are file changes, not code changes. The narrative is
//! forwarded verbatim — no escaping, filtering, or truncation — so its
//! length is bounded only by the completion provider's own input limits.

use serde::{Deserialize, Serialize};

/// The instructional template that defines output format, tone, and
/// safety constraints for the training note.
pub const NOTE_SYSTEM_PROMPT: &str = include_str!("../prompts/fpn_system.md");

/// Fixed sentence prefixed to the learner's narrative in the user message.
const NARRATIVE_PREAMBLE: &str = "Here is the learner's fictional or de-identified case \
description or session notes. Please follow the training flow and Todd's preferred \
AIC-Flex note format:\n\n";

/// One role + content pair in the completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Build the fixed two-message sequence for one generation request:
/// the unmodified template, then the wrapper sentence plus the verbatim
/// narrative.
pub fn compose(narrative: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(NOTE_SYSTEM_PROMPT),
        ChatMessage::user(format!("{NARRATIVE_PREAMBLE}{narrative}")),
    ]
}
