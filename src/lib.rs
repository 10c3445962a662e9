//! llamashim - OpenAI-compatible chat completion shim
//!
//! Exposes `/v1/models` and `/v1/chat/completions` in the shape OpenAI
//! clients expect, flattens each conversation into a single prompt and hands
//! it to a pluggable generation backend.

pub mod adapter;
pub mod cli;
pub mod config;
pub mod error;
pub mod generation;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod telemetry;
