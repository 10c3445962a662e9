//! Command-line interface for llamashim
//!
//! Provides argument parsing and subcommand handling for the llamashim binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// OpenAI-compatible chat completion shim for locally hosted models
#[derive(Parser)]
#[command(name = "llamashim")]
#[command(version)]
#[command(about = "OpenAI-compatible chat completion shim for locally hosted models")]
#[command(
    long_about = "llamashim exposes /v1/models and /v1/chat/completions in the shape \
    OpenAI clients expect, flattening each conversation into a single prompt for a \
    local generation backend."
)]
pub struct Cli {
    /// Path to configuration file (defaults to ./config.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override server.host
    #[arg(long)]
    pub host: Option<String>,

    /// Override server.port
    #[arg(short, long)]
    pub port: Option<u16>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# llamashim Configuration
# ========================
#
# Every setting below is optional; the values shown are the defaults.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER
# ─────────────────────────────────────────────────────────────────────────────

[server]
# Address to bind to (0.0.0.0 for all interfaces, 127.0.0.1 for localhost only)
host = "0.0.0.0"

# Port to listen on
port = 8080

# Requests with larger bodies are rejected as malformed
max_body_bytes = 2097152

# ─────────────────────────────────────────────────────────────────────────────
# MODELS
# ─────────────────────────────────────────────────────────────────────────────
#
# Identifiers listed on GET /v1/models. The first one is reported as the
# model of every chat completion, whatever the client asked for.

[models]
served = ["local-llama"]
owned_by = "local"

# ─────────────────────────────────────────────────────────────────────────────
# PROMPT CONSTRUCTION
# ─────────────────────────────────────────────────────────────────────────────
#
# Conversations are flattened into one prompt, one line per turn:
#
#   System: You are a helpful assistant.
#   User: Hello
#   Assistant: Hi there!
#   User: Tell me a joke
#
# Messages with other roles (tool, function, ...) are skipped.

[prompt]
# Keep earlier assistant turns as context for the backend
include_assistant = true

# Prefix each turn with "System: ", "User: " or "Assistant: "
role_prefix = true

# Reply sent when no message contributes to the prompt (e.g. "messages": [])
empty_prompt_reply = "Hello! How can I help you today?"

# ─────────────────────────────────────────────────────────────────────────────
# GENERATION BACKEND
# ─────────────────────────────────────────────────────────────────────────────

[generation]
# "echo": deterministic mock that repeats the last user turn
# "llamacpp": forward prompts to a llama.cpp server (POST {base_url}/completion)
backend = "echo"

# Give up on the backend after this many seconds (1-300)
timeout_seconds = 60

# llama.cpp settings (ignored by the echo backend)
base_url = "http://127.0.0.1:8081"
max_tokens = 512
temperature = 0.7

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error" (RUST_LOG overrides)
log_level = "info"
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        // Clap's built-in verification for the CLI structure
        Cli::command().debug_assert();
    }

    #[test]
    fn default_arguments() {
        let cli = Cli::parse_from(["llamashim"]);
        assert!(cli.config.is_none());
        assert!(cli.host.is_none());
        assert!(cli.port.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn custom_config_path() {
        let cli = Cli::parse_from(["llamashim", "--config", "custom.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.toml")));
    }

    #[test]
    fn bind_overrides() {
        let cli = Cli::parse_from(["llamashim", "--host", "127.0.0.1", "-p", "5001"]);
        assert_eq!(cli.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(cli.port, Some(5001));
    }

    #[test]
    fn config_subcommand() {
        let cli = Cli::parse_from(["llamashim", "config"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config { output: None })
        ));
    }

    #[test]
    fn config_subcommand_with_output() {
        let cli = Cli::parse_from(["llamashim", "config", "-o", "my-config.toml"]);
        assert!(matches!(
            cli.command,
            Some(Command::Config { output: Some(ref path) }) if path == &PathBuf::from("my-config.toml")
        ));
    }

    #[test]
    fn template_is_valid_toml() {
        let template = generate_config_template();
        let result: Result<toml::Value, _> = toml::from_str(template);
        assert!(
            result.is_ok(),
            "Template should be valid TOML: {:?}",
            result.err()
        );
    }

    #[test]
    fn template_has_all_sections() {
        let template = generate_config_template();
        assert!(template.contains("[server]"));
        assert!(template.contains("[models]"));
        assert!(template.contains("[prompt]"));
        assert!(template.contains("[generation]"));
        assert!(template.contains("[observability]"));
    }
}
