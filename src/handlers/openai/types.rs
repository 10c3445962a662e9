//! OpenAI-compatible request and response types
//!
//! These types follow the shape of the OpenAI Chat Completions API closely
//! enough for clients such as SillyTavern. Parsing is lenient where clients
//! differ (unknown roles, content-part arrays, `null` content, extra fields)
//! and strict where the data would be meaningless (missing `role`, missing
//! `content` on a system/user/assistant turn, non-object bodies).

use crate::error::{AppError, AppResult};
use crate::middleware::RequestId;
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// =============================================================================
// OpenAI API Object Type Constants
// =============================================================================

/// Object type for non-streaming chat completion responses
pub const OBJECT_CHAT_COMPLETION: &str = "chat.completion";
/// Object type for list responses (e.g., model list)
pub const OBJECT_LIST: &str = "list";
/// Object type for individual model entries
pub const OBJECT_MODEL: &str = "model";

// =============================================================================
// Message Types
// =============================================================================

/// Message role in the conversation
///
/// Roles outside system/user/assistant (e.g. `tool`, `function`) are kept as
/// [`MessageRole::Other`] so the prompt builder can skip them instead of the
/// whole request being rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Other(String),
}

impl MessageRole {
    /// Parse a wire role name (case-sensitive, as OpenAI does)
    pub fn parse(role: &str) -> Self {
        match role {
            "system" => MessageRole::System,
            "user" => MessageRole::User,
            "assistant" => MessageRole::Assistant,
            other => MessageRole::Other(other.to_string()),
        }
    }

    /// Wire name of the role
    pub fn as_str(&self) -> &str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Other(name) => name,
        }
    }

    /// Capitalized label used for role-prefixed prompts
    ///
    /// Returns `None` for unrecognized roles.
    pub fn prompt_label(&self) -> Option<&'static str> {
        match self {
            MessageRole::System => Some("System"),
            MessageRole::User => Some("User"),
            MessageRole::Assistant => Some("Assistant"),
            MessageRole::Other(_) => None,
        }
    }

    /// Check if this is one of the roles the prompt builder understands
    pub fn is_recognized(&self) -> bool {
        !matches!(self, MessageRole::Other(_))
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MessageRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(MessageRole::parse(&s))
    }
}

impl Serialize for MessageRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// One element of an array-form `content`
#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Message content, flattened to text
///
/// Accepts either a plain string or an array of content parts. Text parts
/// are concatenated in order; image and other parts are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
struct MessageContent(String);

impl<'de> Deserialize<'de> for MessageContent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ContentVisitor;

        impl<'de> Visitor<'de> for ContentVisitor {
            type Value = MessageContent;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or an array of content parts")
            }

            fn visit_str<E>(self, value: &str) -> Result<MessageContent, E>
            where
                E: de::Error,
            {
                Ok(MessageContent(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<MessageContent, E>
            where
                E: de::Error,
            {
                Ok(MessageContent(value))
            }

            // Assistant turns carrying `tool_calls` send `"content": null`
            fn visit_unit<E>(self) -> Result<MessageContent, E>
            where
                E: de::Error,
            {
                Ok(MessageContent(String::new()))
            }

            fn visit_none<E>(self) -> Result<MessageContent, E>
            where
                E: de::Error,
            {
                Ok(MessageContent(String::new()))
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<MessageContent, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut text = String::new();
                while let Some(part) = seq.next_element::<ContentPart>()? {
                    if part.kind == "text" {
                        let part_text = part
                            .text
                            .ok_or_else(|| de::Error::missing_field("text"))?;
                        text.push_str(&part_text);
                    }
                }
                Ok(MessageContent(text))
            }
        }

        deserializer.deserialize_any(ContentVisitor)
    }
}

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    role: MessageRole,
    content: String,
}

impl ChatMessage {
    /// Create a new message
    ///
    /// Content is opaque and may be empty.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Get the role
    pub fn role(&self) -> &MessageRole {
        &self.role
    }

    /// Get the content
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl<'de> Deserialize<'de> for ChatMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawMessage {
            role: MessageRole,
            // `None` only when the key is absent; `null` is empty content
            #[serde(default, deserialize_with = "present_content")]
            content: Option<MessageContent>,
        }

        fn present_content<'de, D>(deserializer: D) -> Result<Option<MessageContent>, D::Error>
        where
            D: Deserializer<'de>,
        {
            MessageContent::deserialize(deserializer).map(Some)
        }

        let raw = RawMessage::deserialize(deserializer)?;
        let content = match raw.content {
            Some(content) => content.0,
            // Skipped roles (tool, function, ...) may omit content entirely
            None if !raw.role.is_recognized() => String::new(),
            None => return Err(de::Error::missing_field("content")),
        };

        Ok(ChatMessage {
            role: raw.role,
            content,
        })
    }
}

// =============================================================================
// Chat Completion Request
// =============================================================================

/// OpenAI-compatible chat completion request
///
/// Only `model` and `messages` matter to the shim. `stream` is recorded so it
/// can be logged; responses are never streamed. All other OpenAI fields are
/// accepted and ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<ChatMessage>,
    stream: bool,
}

impl<'de> Deserialize<'de> for ChatCompletionRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawRequest {
            #[serde(default)]
            model: Option<String>,
            // Absent and null both mean "no messages"
            #[serde(default)]
            messages: Option<Vec<ChatMessage>>,
            #[serde(default)]
            stream: Option<bool>,
        }

        let raw = RawRequest::deserialize(deserializer)?;
        Ok(ChatCompletionRequest {
            model: raw.model,
            messages: raw.messages.unwrap_or_default(),
            stream: raw.stream.unwrap_or(false),
        })
    }
}

/// Builder for constructing [`ChatCompletionRequest`] programmatically
///
/// # Examples
///
/// ```
/// use llamashim::handlers::openai::types::ChatCompletionRequest;
///
/// let request = ChatCompletionRequest::builder()
///     .model("local-llama")
///     .system_message("You are helpful.")
///     .user_message("Hello!")
///     .build();
/// assert_eq!(request.messages().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ChatCompletionRequestBuilder {
    model: Option<String>,
    messages: Vec<ChatMessage>,
    stream: bool,
}

impl ChatCompletionRequestBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the requested model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Add a single message to the request
    pub fn message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Add a system message (convenience method)
    pub fn system_message(self, content: impl Into<String>) -> Self {
        self.message(ChatMessage::new(MessageRole::System, content))
    }

    /// Add a user message (convenience method)
    pub fn user_message(self, content: impl Into<String>) -> Self {
        self.message(ChatMessage::new(MessageRole::User, content))
    }

    /// Add an assistant message (convenience method)
    pub fn assistant_message(self, content: impl Into<String>) -> Self {
        self.message(ChatMessage::new(MessageRole::Assistant, content))
    }

    /// Mark the request as streaming
    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Build the request
    pub fn build(self) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model,
            messages: self.messages,
            stream: self.stream,
        }
    }
}

impl ChatCompletionRequest {
    /// Create a new builder for constructing a request programmatically
    pub fn builder() -> ChatCompletionRequestBuilder {
        ChatCompletionRequestBuilder::new()
    }

    /// Parse a request from a raw HTTP body
    ///
    /// The body must be a JSON object. Content-Type is not consulted.
    ///
    /// # Errors
    /// Returns `AppError::MalformedRequest` if the body is not JSON, is not an
    /// object, or has wrongly shaped fields.
    pub fn from_slice(body: &[u8]) -> AppResult<Self> {
        let value: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
            AppError::MalformedRequest(format!("request body is not valid JSON: {}", e))
        })?;

        if !value.is_object() {
            return Err(AppError::MalformedRequest(format!(
                "request body must be a JSON object, got {}",
                json_type_name(&value)
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| AppError::MalformedRequest(format!("invalid chat request: {}", e)))
    }

    /// Get the model the client asked for (informational only)
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Get the messages in conversation order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Check if the client asked for streaming
    pub fn stream(&self) -> bool {
        self.stream
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// =============================================================================
// Chat Completion Response
// =============================================================================

/// Finish reason for a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
}

/// Usage statistics for a chat completion response.
///
/// Fields are private to enforce the invariant that `total_tokens` always
/// equals `prompt_tokens + completion_tokens`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl Usage {
    /// Create usage stats from token counts.
    ///
    /// Automatically calculates `total_tokens` as `prompt_tokens + completion_tokens`.
    /// Counts are clamped so the total never exceeds `u32::MAX`; the
    /// completion count absorbs the clamp so the sum still holds.
    #[inline]
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        let completion_tokens = completion_tokens.min(u32::MAX - prompt_tokens);
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Returns the number of tokens in the prompt.
    #[inline]
    pub fn prompt_tokens(&self) -> u32 {
        self.prompt_tokens
    }

    /// Returns the number of tokens in the completion.
    #[inline]
    pub fn completion_tokens(&self) -> u32 {
        self.completion_tokens
    }

    /// Returns the total number of tokens (prompt + completion).
    #[inline]
    pub fn total_tokens(&self) -> u32 {
        self.total_tokens
    }
}

/// Assistant message in response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    pub role: MessageRole,
    pub content: String,
}

impl AssistantMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// A single choice in the response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: FinishReason,
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

impl ChatCompletion {
    /// Create a new chat completion response with a single `stop` choice
    ///
    /// # Arguments
    /// * `content` - The assistant's response content
    /// * `model_name` - Model identifier reported to the client
    /// * `usage` - Token accounting for this exchange
    /// * `created` - Unix timestamp (use `current_timestamp()` helper)
    pub fn new(content: String, model_name: String, usage: Usage, created: i64) -> Self {
        let id = format!("chatcmpl-{}", uuid::Uuid::new_v4().simple());

        Self {
            id,
            object: OBJECT_CHAT_COMPLETION.to_string(),
            created,
            model: model_name,
            choices: vec![Choice {
                index: 0,
                message: AssistantMessage::new(content),
                finish_reason: FinishReason::Stop,
            }],
            usage,
        }
    }

    /// Content of the first choice
    pub fn content(&self) -> &str {
        self.choices
            .first()
            .map(|c| c.message.content())
            .unwrap_or_default()
    }
}

/// Get the current Unix timestamp for response creation.
///
/// If the system clock is before the UNIX epoch, returns 0 and logs a warning.
pub fn current_timestamp(request_id: Option<&RequestId>) -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_else(|e| {
            if let Some(rid) = request_id {
                tracing::warn!(
                    request_id = %rid,
                    error = %e,
                    "System clock appears to be before UNIX epoch - using 0 as timestamp"
                );
            } else {
                tracing::warn!(
                    error = %e,
                    "System clock appears to be before UNIX epoch - using 0 as timestamp"
                );
            }
            0
        })
}

// =============================================================================
// Models List Response
// =============================================================================

/// A model object for the models list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelObject {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub owned_by: String,
}

impl ModelObject {
    /// Create a new model object
    pub fn new(id: impl Into<String>, owned_by: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object: OBJECT_MODEL.to_string(),
            created: 0, // OpenAI uses 0 for many models
            owned_by: owned_by.into(),
        }
    }
}

/// Response for GET /v1/models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsListResponse {
    pub object: String,
    pub data: Vec<ModelObject>,
}

impl ModelsListResponse {
    /// Create a models list response
    pub fn new(models: Vec<ModelObject>) -> Self {
        Self {
            object: OBJECT_LIST.to_string(),
            data: models,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
