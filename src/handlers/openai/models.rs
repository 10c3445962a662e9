//! OpenAI-compatible models list handler
//!
//! Handles GET /v1/models requests.

use crate::handlers::AppState;
use axum::{Json, extract::State};

use super::types::ModelsListResponse;

/// GET /v1/models handler
///
/// Returns the configured models in OpenAI-compatible format:
/// - `object`: "list"
/// - `data`: Array of model objects, each with `id`, `object` ("model"),
///   `created` (0) and `owned_by`
///
/// The list is never empty. The first entry is the model named in chat
/// completion responses.
pub async fn handler(State(state): State<AppState>) -> Json<ModelsListResponse> {
    let models = state.registry().list();

    tracing::debug!(total_models = models.len(), "Listing models");

    Json(ModelsListResponse::new(models))
}
