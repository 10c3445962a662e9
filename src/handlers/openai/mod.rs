//! OpenAI-compatible API handlers
//!
//! - `POST /v1/chat/completions` - Non-streaming chat completions
//! - `GET /v1/models` - List available models

pub mod completions;
pub mod extractor;
pub mod models;
pub mod types;
