//! Generation collaborators
//!
//! The chat adapter never produces text itself. It hands the derived prompt to
//! a [`Generator`] and wraps whatever comes back in an OpenAI envelope.
//!
//! Two backends ship with the crate:
//! - [`EchoGenerator`] - deterministic mock that echoes the last user turn
//! - [`LlamaCppGenerator`] - forwards the prompt to a llama.cpp server

pub mod echo;
pub mod llamacpp;

pub use echo::EchoGenerator;
pub use llamacpp::LlamaCppGenerator;

use crate::config::{GenerationBackend, GenerationConfig};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Errors a generation backend can report
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("backend did not answer within {timeout_seconds} seconds")]
    Timeout { timeout_seconds: u64 },

    #[error("generation was cancelled")]
    Cancelled,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("invalid backend response: {0}")]
    InvalidResponse(String),
}

/// Turns a prompt into response text
///
/// Implementations own their latency, retry and serialization concerns.
/// The adapter only bounds the call with its own deadline.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Short backend name used in logs and error messages
    fn name(&self) -> &str;

    /// Generate a reply for `prompt`
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Build the generator selected by the `[generation]` config section
pub fn from_config(config: &GenerationConfig) -> AppResult<Arc<dyn Generator>> {
    let generator: Arc<dyn Generator> = match config.backend() {
        GenerationBackend::Echo => Arc::new(EchoGenerator::new()),
        GenerationBackend::Llamacpp => {
            let generator = LlamaCppGenerator::from_config(config).map_err(|e| {
                AppError::Config(format!("Failed to create llama.cpp backend: {}", e))
            })?;
            Arc::new(generator)
        }
    };

    tracing::debug!(backend = generator.name(), "Generation backend ready");
    Ok(generator)
}
