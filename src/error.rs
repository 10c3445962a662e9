//! Error types for llamashim
//!
//! All errors implement `IntoResponse` for Axum handlers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::generation::GenerationError;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config file {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Generation failed on {backend}: {reason}")]
    GenerationFailed { backend: String, reason: String },

    #[error("Generation on {backend} timed out after {timeout_seconds} seconds")]
    GenerationTimeout {
        backend: String,
        timeout_seconds: u64,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable error kind reported in the `type` field of error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedRequest(_) => "malformed_request",
            Self::GenerationFailed { .. } => "generation_failure",
            Self::GenerationTimeout { .. } => "generation_timeout",
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::Internal(_) => "internal_error",
        }
    }

    /// Whether the fault lies with the client input rather than the backend
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Self::MalformedRequest(_))
    }

    /// Convert a collaborator error, tagging it with the backend name
    pub fn from_generation(backend: &str, err: GenerationError) -> Self {
        match err {
            GenerationError::Timeout { timeout_seconds } => Self::GenerationTimeout {
                backend: backend.to_string(),
                timeout_seconds,
            },
            GenerationError::Cancelled => Self::GenerationTimeout {
                backend: backend.to_string(),
                timeout_seconds: 0,
            },
            other => Self::GenerationFailed {
                backend: backend.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Chat clients expect a 500 for every failure; `type` tells the kinds apart
        let status = StatusCode::INTERNAL_SERVER_ERROR;

        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "type": self.kind(),
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
