//! Deterministic echo backend
//!
//! Stands in for a real model: acknowledges the most recent user turn.

use super::{GenerationError, Generator};
use async_trait::async_trait;

/// Marker that precedes user turns in a role-prefixed prompt
pub const USER_MARKER: &str = "User:";

/// Prefix of every echo reply
pub const ECHO_PREFIX: &str = "I understand your message: ";

/// Mock generator that echoes the last user turn back
///
/// If the prompt contains [`USER_MARKER`], the text after its last
/// occurrence is echoed (trimmed). Otherwise the whole prompt is echoed.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoGenerator;

impl EchoGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Compute the reply for a prompt without going through the async trait
    pub fn reply_for(prompt: &str) -> String {
        let echoed = match prompt.rsplit_once(USER_MARKER) {
            Some((_, last_turn)) => last_turn.trim(),
            None => prompt,
        };
        format!("{ECHO_PREFIX}{echoed}")
    }
}

#[async_trait]
impl Generator for EchoGenerator {
    fn name(&self) -> &str {
        "echo"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        Ok(Self::reply_for(prompt))
    }
}
