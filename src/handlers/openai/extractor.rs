//! Lenient body extractor for chat requests
//!
//! Many OpenAI clients (and hand-written curl calls) omit or mangle the
//! `Content-Type` header. The body is read as raw bytes and parsed as JSON
//! regardless, and every failure becomes an [`AppError::MalformedRequest`]
//! so the client always gets the JSON error envelope.

use crate::error::AppError;
use crate::middleware::RequestId;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};

use super::types::ChatCompletionRequest;

/// Extracts a [`ChatCompletionRequest`] from any request body
///
/// # Example
///
/// ```ignore
/// pub async fn handler(
///     ChatRequestBody(request): ChatRequestBody,
/// ) -> Result<Json<ChatCompletion>, AppError> {
///     // Unparseable bodies never reach this point
/// }
/// ```
pub struct ChatRequestBody(pub ChatCompletionRequest);

impl<S> FromRequest<S> for ChatRequestBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let request_id = req.extensions().get::<RequestId>().copied();

        let result = match Bytes::from_request(req, state).await {
            Ok(body) => ChatCompletionRequest::from_slice(&body),
            Err(rejection) => Err(AppError::MalformedRequest(format!(
                "failed to read request body: {}",
                rejection.body_text()
            ))),
        };

        result.map(ChatRequestBody).inspect_err(|e| match request_id {
            Some(request_id) => tracing::warn!(
                request_id = %request_id,
                error = %e,
                "Rejected malformed chat request"
            ),
            None => tracing::warn!(error = %e, "Rejected malformed chat request"),
        })
    }
}
