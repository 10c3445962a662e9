//! llama.cpp server backend
//!
//! Forwards prompts to the native `POST /completion` endpoint of a running
//! `llama-server`. Only non-streaming completions are used.

use super::{GenerationError, Generator};
use crate::config::GenerationConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum number of characters of an error body kept in error messages
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Request body for llama.cpp's `/completion` endpoint
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    n_predict: u32,
    temperature: f64,
    stream: bool,
}

/// Subset of the `/completion` reply we care about
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    content: String,
}

/// Generator backed by a llama.cpp HTTP server
#[derive(Debug, Clone)]
pub struct LlamaCppGenerator {
    client: reqwest::Client,
    completion_url: String,
    max_tokens: u32,
    temperature: f64,
    timeout_seconds: u64,
}

impl LlamaCppGenerator {
    /// Create a generator talking to `base_url` (e.g. `http://127.0.0.1:8081`)
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        max_tokens: u32,
        temperature: f64,
        timeout_seconds: u64,
    ) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            completion_url: format!("{}/completion", base_url.trim_end_matches('/')),
            max_tokens,
            temperature,
            timeout_seconds,
        })
    }

    /// Create a generator from the `[generation]` config section
    pub fn from_config(config: &GenerationConfig) -> Result<Self, GenerationError> {
        Self::new(
            config.base_url(),
            config.max_tokens(),
            config.temperature(),
            config.timeout_seconds(),
        )
    }

    /// Full URL of the completion endpoint
    pub fn completion_url(&self) -> &str {
        &self.completion_url
    }

    fn classify(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout {
                timeout_seconds: self.timeout_seconds,
            }
        } else if err.is_decode() {
            GenerationError::InvalidResponse(err.to_string())
        } else {
            GenerationError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl Generator for LlamaCppGenerator {
    fn name(&self) -> &str {
        "llamacpp"
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = CompletionRequest {
            prompt,
            n_predict: self.max_tokens,
            temperature: self.temperature,
            stream: false,
        };

        let response = self
            .client
            .post(&self.completion_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
            tracing::debug!(
                url = %self.completion_url,
                status = %status,
                body = %snippet,
                "llama.cpp server returned an error status"
            );
            return Err(GenerationError::Backend(format!("HTTP {}: {}", status, snippet)));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| self.classify(e))?;

        tracing::debug!(
            url = %self.completion_url,
            content_length = completion.content.len(),
            "llama.cpp completion received"
        );

        Ok(completion.content.trim().to_string())
    }
}
