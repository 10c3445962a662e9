//! Prompt construction
//!
//! Flattens a multi-turn conversation into the single text handed to the
//! generation backend.
//!
//! Format: each retained turn is rendered as `"<Role>: <content>"` (or bare
//! `content` when role prefixes are disabled) and turns are joined with a
//! single `"\n"`. The rendering is applied uniformly because it feeds both the
//! backend and the word-count usage figures.

use crate::config::PromptConfig;
use crate::handlers::openai::types::{ChatMessage, MessageRole};
use std::fmt;

/// Separator between rendered turns
pub const PROMPT_SEPARATOR: &str = "\n";

/// Which turns make it into the prompt and how they are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptOptions {
    /// Keep prior assistant turns as context
    pub include_assistant: bool,
    /// Render turns as `"<Role>: <content>"`
    pub role_prefix: bool,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            include_assistant: true,
            role_prefix: true,
        }
    }
}

impl From<&PromptConfig> for PromptOptions {
    fn from(config: &PromptConfig) -> Self {
        Self {
            include_assistant: config.include_assistant,
            role_prefix: config.role_prefix,
        }
    }
}

impl PromptOptions {
    fn retains(&self, role: &MessageRole) -> bool {
        match role {
            MessageRole::System | MessageRole::User => true,
            MessageRole::Assistant => self.include_assistant,
            MessageRole::Other(_) => false,
        }
    }
}

/// Prompt derived from a conversation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptText {
    text: String,
    parts: usize,
}

impl PromptText {
    /// The joined prompt
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Number of turns that contributed to the prompt
    pub fn parts(&self) -> usize {
        self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for PromptText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Build the prompt for a conversation
///
/// Messages are visited in order. System and user turns are always kept,
/// assistant turns only when `include_assistant` is set, and every other role
/// is skipped. No retained turns yields an empty prompt.
pub fn build_prompt(messages: &[ChatMessage], options: &PromptOptions) -> PromptText {
    let mut rendered: Vec<String> = Vec::with_capacity(messages.len());

    for message in messages {
        if !options.retains(message.role()) {
            if !message.role().is_recognized() {
                tracing::debug!(
                    role = %message.role(),
                    "Ignoring message with unrecognized role"
                );
            }
            continue;
        }

        let part = match message.role().prompt_label() {
            Some(label) if options.role_prefix => format!("{}: {}", label, message.content()),
            _ => message.content().to_string(),
        };
        rendered.push(part);
    }

    PromptText {
        parts: rendered.len(),
        text: rendered.join(PROMPT_SEPARATOR),
    }
}
