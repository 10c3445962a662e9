//! HTTP request handlers for the llamashim API

use crate::adapter::ChatAdapter;
use crate::config::Config;
use crate::error::AppResult;
use crate::generation::{self, Generator};
use crate::middleware::request_id_middleware;
use crate::models::ModelRegistry;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod health;
pub mod openai;

/// Application state shared across all handlers
///
/// Everything inside is immutable after startup. All fields are Arc'd for
/// cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    registry: Arc<ModelRegistry>,
    adapter: Arc<ChatAdapter>,
}

impl AppState {
    /// Create a new AppState, building the generator named in the config
    ///
    /// # Errors
    /// Returns an error if the model list is invalid or the generation
    /// backend cannot be constructed.
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        let generator = generation::from_config(&config.generation)?;
        Self::with_generator(config, generator)
    }

    /// Create a new AppState around an explicit generator
    pub fn with_generator(config: Arc<Config>, generator: Arc<dyn Generator>) -> AppResult<Self> {
        let registry = ModelRegistry::from_config(&config.models)?;
        let adapter = ChatAdapter::from_config(&config, &registry, generator);

        Ok(Self {
            config,
            registry: Arc::new(registry),
            adapter: Arc::new(adapter),
        })
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get reference to the model registry
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Get reference to the chat adapter
    pub fn adapter(&self) -> &ChatAdapter {
        &self.adapter
    }
}

/// Build the full application router
///
/// Routes:
/// - `GET /health`
/// - `GET /v1/models`
/// - `POST /v1/chat/completions`
pub fn router(state: AppState) -> Router {
    let body_limit = state.config().server.max_body_bytes;

    Router::new()
        .route("/health", get(health::handler))
        .route("/v1/models", get(openai::models::handler))
        .route("/v1/chat/completions", post(openai::completions::handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
