//! OpenAI-compatible chat completions handler
//!
//! Handles POST /v1/chat/completions requests (non-streaming only).

use crate::error::AppError;
use crate::handlers::AppState;
use crate::middleware::RequestId;
use axum::{Extension, Json, extract::State};

use super::extractor::ChatRequestBody;
use super::types::ChatCompletion;

/// POST /v1/chat/completions handler
///
/// # Request
///
/// `{"model": <optional>, "messages": [{"role": ..., "content": ...}, ...]}`.
/// The body is parsed as JSON whatever the Content-Type header says.
/// `model` is informational; the response always names the primary
/// configured model.
///
/// # Response Format
///
/// Returns OpenAI-compatible JSON with:
/// - `id`: Fresh `chatcmpl-...` identifier
/// - `object`: "chat.completion"
/// - `created`: Unix timestamp
/// - `model`: Primary configured model
/// - `choices`: One assistant message with `finish_reason: "stop"`
/// - `usage`: Word counts of prompt and reply (not tokenizer counts)
///
/// Failures return 500 with `{"error": <message>, "type": <kind>}`.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ChatRequestBody(request): ChatRequestBody,
) -> Result<Json<ChatCompletion>, AppError> {
    state
        .adapter()
        .complete(&request, request_id)
        .await
        .map(Json)
        .inspect_err(|e| {
            if e.is_client_fault() {
                tracing::warn!(
                    request_id = %request_id,
                    error = %e,
                    error_type = e.kind(),
                    "Chat completion rejected"
                );
            } else {
                tracing::error!(
                    request_id = %request_id,
                    error = %e,
                    error_type = e.kind(),
                    backend = state.adapter().backend_name(),
                    "Chat completion failed"
                );
            }
        })
}
