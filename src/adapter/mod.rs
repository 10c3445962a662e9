//! Chat completion adapter
//!
//! Translates an OpenAI-style conversation into a single prompt, asks the
//! generation backend for a reply and wraps it in a chat completion envelope
//! with word-count usage.
//!
//! The adapter holds no mutable state. One instance is built at startup and
//! shared by every request.

pub mod prompt;
pub mod tokens;

pub use prompt::{PROMPT_SEPARATOR, PromptOptions, PromptText, build_prompt};
pub use tokens::{count_words, word_usage};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::generation::{GenerationError, Generator};
use crate::handlers::openai::types::{ChatCompletion, ChatCompletionRequest, current_timestamp};
use crate::middleware::RequestId;
use crate::models::ModelRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Aborts the generation task when the request is dropped or times out
struct GenerationTask(JoinHandle<Result<String, GenerationError>>);

impl Drop for GenerationTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Stateless request/response translator in front of a [`Generator`]
pub struct ChatAdapter {
    generator: Arc<dyn Generator>,
    model_id: String,
    options: PromptOptions,
    empty_prompt_reply: String,
    generation_timeout: Duration,
}

impl ChatAdapter {
    /// Create an adapter answering as `model_id`
    pub fn new(
        generator: Arc<dyn Generator>,
        model_id: impl Into<String>,
        options: PromptOptions,
        empty_prompt_reply: impl Into<String>,
        generation_timeout: Duration,
    ) -> Self {
        Self {
            generator,
            model_id: model_id.into(),
            options,
            empty_prompt_reply: empty_prompt_reply.into(),
            generation_timeout,
        }
    }

    /// Create an adapter from configuration
    ///
    /// Responses name the registry's primary model.
    pub fn from_config(
        config: &Config,
        registry: &ModelRegistry,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self::new(
            generator,
            registry.primary().as_str(),
            PromptOptions::from(&config.prompt),
            config.prompt.empty_prompt_reply.clone(),
            Duration::from_secs(config.generation.timeout_seconds()),
        )
    }

    /// Model id reported in every response
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Name of the generation backend
    pub fn backend_name(&self) -> &str {
        self.generator.name()
    }

    /// Prompt construction options in effect
    pub fn options(&self) -> &PromptOptions {
        &self.options
    }

    /// Derive the prompt for a request
    pub fn build_prompt(&self, request: &ChatCompletionRequest) -> PromptText {
        build_prompt(request.messages(), &self.options)
    }

    /// Produce the reply text for a prompt
    ///
    /// An empty prompt never reaches the backend; the configured canned reply
    /// is returned instead. Backend calls are bounded by the generation
    /// timeout.
    pub async fn generate(&self, prompt: &PromptText, request_id: RequestId) -> AppResult<String> {
        if prompt.is_empty() {
            tracing::debug!(
                request_id = %request_id,
                "Empty prompt - using canned reply"
            );
            return Ok(self.empty_prompt_reply.clone());
        }

        let backend = self.generator.name();
        let started = std::time::Instant::now();

        // Own task so a panicking backend becomes an error response
        let generator = Arc::clone(&self.generator);
        let text = prompt.as_str().to_string();
        let mut task = GenerationTask(tokio::spawn(async move {
            generator.generate(&text).await
        }));

        let joined = tokio::time::timeout(self.generation_timeout, &mut task.0)
            .await
            .map_err(|_| AppError::GenerationTimeout {
                backend: backend.to_string(),
                timeout_seconds: self.generation_timeout.as_secs(),
            })?;

        let reply = match joined {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(GenerationError::Cancelled),
            Err(e) => {
                return Err(AppError::Internal(format!(
                    "generation task on {} failed: {}",
                    backend, e
                )));
            }
        }
        .map_err(|e| AppError::from_generation(backend, e))?;

        tracing::debug!(
            request_id = %request_id,
            backend = %backend,
            generation_ms = started.elapsed().as_millis() as u64,
            reply_length = reply.len(),
            "Generation finished"
        );

        Ok(reply)
    }

    /// Answer a chat completion request
    pub async fn complete(
        &self,
        request: &ChatCompletionRequest,
        request_id: RequestId,
    ) -> AppResult<ChatCompletion> {
        tracing::debug!(
            request_id = %request_id,
            requested_model = request.model().unwrap_or("<none>"),
            messages_count = request.messages().len(),
            stream = request.stream(),
            "Received chat completion request"
        );

        if request.stream() {
            tracing::debug!(
                request_id = %request_id,
                "Streaming requested but not supported - answering with a single response"
            );
        }

        let prompt = self.build_prompt(request);

        tracing::debug!(
            request_id = %request_id,
            prompt_parts = prompt.parts(),
            prompt_words = count_words(prompt.as_str()),
            "Prompt built"
        );

        let reply = self.generate(&prompt, request_id).await?;
        let usage = word_usage(prompt.as_str(), &reply);
        let created = current_timestamp(Some(&request_id));

        let completion = ChatCompletion::new(reply, self.model_id.clone(), usage, created);

        tracing::info!(
            request_id = %request_id,
            completion_id = %completion.id,
            model = %completion.model,
            prompt_tokens = usage.prompt_tokens(),
            completion_tokens = usage.completion_tokens(),
            "Chat completion successful"
        );

        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::EchoGenerator;
    use async_trait::async_trait;

    const CANNED: &str = "Hello! How can I help you today?";

    fn echo_adapter(options: PromptOptions) -> ChatAdapter {
        ChatAdapter::new(
            Arc::new(EchoGenerator::new()),
            "local-llama",
            options,
            CANNED,
            Duration::from_secs(5),
        )
    }

    /// Generator that panics if called
    struct UnreachableGenerator;

    #[async_trait]
    impl Generator for UnreachableGenerator {
        fn name(&self) -> &str {
            "unreachable"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            panic!("generator must not be called for an empty prompt");
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl Generator for FailingGenerator {
        fn name(&self) -> &str {
            "failing"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::Backend("model not loaded".to_string()))
        }
    }

    struct SlowGenerator;

    #[async_trait]
    impl Generator for SlowGenerator {
        fn name(&self) -> &str {
            "slow"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }
    }

    struct PanickingGenerator;

    #[async_trait]
    impl Generator for PanickingGenerator {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            panic!("backend bug");
        }
    }

    #[tokio::test]
    async fn test_complete_single_user_message() {
        let adapter = echo_adapter(PromptOptions::default());
        let request = ChatCompletionRequest::builder()
            .user_message("Hello, how are you?")
            .build();

        let completion = adapter.complete(&request, RequestId::new()).await.unwrap();

        assert_eq!(
            completion.content(),
            "I understand your message: Hello, how are you?"
        );
        assert_eq!(completion.model, "local-llama");
        assert_eq!(completion.usage.prompt_tokens(), 5);
        assert_eq!(completion.usage.completion_tokens(), 8);
        assert_eq!(completion.usage.total_tokens(), 13);
    }

    #[tokio::test]
    async fn test_complete_ignores_requested_model() {
        let adapter = echo_adapter(PromptOptions::default());
        let request = ChatCompletionRequest::builder()
            .model("gpt-4o")
            .user_message("hi")
            .build();

        let completion = adapter.complete(&request, RequestId::new()).await.unwrap();
        assert_eq!(completion.model, "local-llama");
    }

    #[tokio::test]
    async fn test_empty_prompt_uses_canned_reply_without_backend() {
        let adapter = ChatAdapter::new(
            Arc::new(UnreachableGenerator),
            "local-llama",
            PromptOptions::default(),
            CANNED,
            Duration::from_secs(5),
        );
        let request = ChatCompletionRequest::default();

        let completion = adapter.complete(&request, RequestId::new()).await.unwrap();
        assert_eq!(completion.content(), CANNED);
        assert_eq!(completion.usage.prompt_tokens(), 0);
        assert_eq!(completion.usage.completion_tokens(), 7);
    }

    #[tokio::test]
    async fn test_assistant_only_conversation_when_excluded_is_empty_prompt() {
        let adapter = echo_adapter(PromptOptions {
            include_assistant: false,
            role_prefix: true,
        });
        let request = ChatCompletionRequest::builder()
            .assistant_message("I said something earlier")
            .build();

        let completion = adapter.complete(&request, RequestId::new()).await.unwrap();
        assert_eq!(completion.content(), CANNED);
    }

    #[tokio::test]
    async fn test_backend_failure_is_generation_failure() {
        let adapter = ChatAdapter::new(
            Arc::new(FailingGenerator),
            "local-llama",
            PromptOptions::default(),
            CANNED,
            Duration::from_secs(5),
        );
        let request = ChatCompletionRequest::builder().user_message("hi").build();

        let err = adapter
            .complete(&request, RequestId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::GenerationFailed { .. }));
        assert!(err.to_string().contains("model not loaded"));
    }

    #[tokio::test]
    async fn test_panicking_backend_is_internal_error() {
        let adapter = ChatAdapter::new(
            Arc::new(PanickingGenerator),
            "local-llama",
            PromptOptions::default(),
            CANNED,
            Duration::from_secs(5),
        );
        let request = ChatCompletionRequest::builder().user_message("hi").build();

        let err = adapter
            .complete(&request, RequestId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(err.kind(), "internal_error");
        assert!(err.to_string().contains("panicking"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_backend_times_out() {
        let adapter = ChatAdapter::new(
            Arc::new(SlowGenerator),
            "local-llama",
            PromptOptions::default(),
            CANNED,
            Duration::from_secs(2),
        );
        let request = ChatCompletionRequest::builder().user_message("hi").build();

        let err = adapter
            .complete(&request, RequestId::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::GenerationTimeout {
                timeout_seconds: 2,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_identical_requests_give_identical_content_and_usage() {
        let adapter = echo_adapter(PromptOptions::default());
        let request = ChatCompletionRequest::builder()
            .system_message("Be brief.")
            .user_message("What's the weather like?")
            .build();

        let first = adapter.complete(&request, RequestId::new()).await.unwrap();
        let second = adapter.complete(&request, RequestId::new()).await.unwrap();

        assert_eq!(first.content(), second.content());
        assert_eq!(first.usage, second.usage);
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_from_config_uses_primary_model() {
        let config = Config::default();
        let registry = ModelRegistry::from_config(&config.models).unwrap();
        let adapter = ChatAdapter::from_config(&config, &registry, Arc::new(EchoGenerator::new()));

        assert_eq!(adapter.model_id(), "local-llama");
        assert_eq!(adapter.backend_name(), "echo");
        assert_eq!(adapter.options(), &PromptOptions::default());
    }
}
