//! Model registry
//!
//! Holds the statically configured list of model identifiers served by this
//! shim. The list is immutable after startup and shared by reference.

pub mod model_id;

pub use model_id::ModelId;

use crate::config::ModelsConfig;
use crate::error::{AppError, AppResult};
use crate::handlers::openai::types::ModelObject;
use std::collections::HashSet;

/// Read-only list of advertised models
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    ids: Vec<ModelId>,
    owned_by: String,
}

impl ModelRegistry {
    /// Build a registry from raw ids
    ///
    /// # Errors
    /// Returns `AppError::Config` if the list is empty, contains an invalid id,
    /// or contains duplicates.
    pub fn new<S: AsRef<str>>(ids: &[S], owned_by: &str) -> AppResult<Self> {
        if ids.is_empty() {
            return Err(AppError::Config(
                "models.served must list at least one model id".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        let mut validated = Vec::with_capacity(ids.len());
        for raw in ids {
            let id = ModelId::new(raw.as_ref())
                .map_err(|e| AppError::Config(format!("models.served: {}", e)))?;
            if !seen.insert(id.clone()) {
                return Err(AppError::Config(format!(
                    "models.served contains duplicate model id '{}'",
                    id
                )));
            }
            validated.push(id);
        }

        Ok(Self {
            ids: validated,
            owned_by: owned_by.to_string(),
        })
    }

    /// Build a registry from the `[models]` config section
    pub fn from_config(config: &ModelsConfig) -> AppResult<Self> {
        Self::new(&config.served, &config.owned_by)
    }

    /// The model named in every chat completion response
    pub fn primary(&self) -> &ModelId {
        // Construction guarantees at least one id
        &self.ids[0]
    }

    /// Number of advertised models
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// List all models in OpenAI wire format, in configuration order
    pub fn list(&self) -> Vec<ModelObject> {
        self.ids
            .iter()
            .map(|id| ModelObject::new(id.as_str(), self.owned_by.as_str()))
            .collect()
    }
}
