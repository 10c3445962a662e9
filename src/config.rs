//! Configuration management for llamashim
//!
//! Parses TOML configuration files and provides typed access to settings.
//! Every section has defaults, so an empty file (or no file at all) yields a
//! working single-model echo server.

use crate::error::{AppError, AppResult};
use crate::models::ModelRegistry;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Config file used when no `--config` argument is given
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Upper bound for the generation timeout (5 minutes)
pub const MAX_GENERATION_TIMEOUT_SECONDS: u64 = 300;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Largest accepted request body; larger bodies are malformed requests
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

/// Models advertised on `/v1/models`
///
/// The first entry is the model named in every chat completion response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelsConfig {
    #[serde(default = "default_served_models")]
    pub served: Vec<String>,
    #[serde(default = "default_owned_by")]
    pub owned_by: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            served: default_served_models(),
            owned_by: default_owned_by(),
        }
    }
}

fn default_served_models() -> Vec<String> {
    vec!["local-llama".to_string()]
}

fn default_owned_by() -> String {
    "local".to_string()
}

/// Prompt construction policy
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PromptConfig {
    /// Feed prior assistant turns into the prompt
    #[serde(default = "default_true")]
    pub include_assistant: bool,
    /// Render turns as `"<Role>: <content>"` instead of bare content
    #[serde(default = "default_true")]
    pub role_prefix: bool,
    /// Reply used when no message contributes to the prompt
    #[serde(default = "default_empty_prompt_reply")]
    pub empty_prompt_reply: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            include_assistant: true,
            role_prefix: true,
            empty_prompt_reply: default_empty_prompt_reply(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_empty_prompt_reply() -> String {
    "Hello! How can I help you today?".to_string()
}

/// Which generation backend answers prompts
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GenerationBackend {
    #[default]
    Echo,
    Llamacpp,
}

/// Generation backend configuration
///
/// Fields are private; values are checked by `Config::validate()` and read
/// through accessors.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    #[serde(default)]
    backend: GenerationBackend,
    #[serde(default = "default_generation_timeout")]
    timeout_seconds: u64,
    /// llama.cpp server root, without the `/completion` suffix
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_temperature")]
    temperature: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: GenerationBackend::default(),
            timeout_seconds: default_generation_timeout(),
            base_url: default_base_url(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl GenerationConfig {
    /// Get the selected backend
    pub fn backend(&self) -> GenerationBackend {
        self.backend
    }

    /// Get the deadline for a single generation call
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    /// Get the llama.cpp server URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the generation length limit
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Get the sampling temperature
    pub fn temperature(&self) -> f64 {
        self.temperature
    }
}

fn default_generation_timeout() -> u64 {
    60
}

fn default_base_url() -> String {
    "http://127.0.0.1:8081".to_string()
}

fn default_max_tokens() -> u32 {
    512
}

fn default_temperature() -> f64 {
    0.7
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        // Phase 1: Read file (preserves io::Error context)
        let content = std::fs::read_to_string(path.as_ref()).map_err(|source| {
            AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            }
        })?;

        // Phase 2: Parse TOML (preserves toml::de::Error context)
        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            })?;

        // Phase 3: Validate parsed config (provides contextual reason)
        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Resolve the configuration used at startup
    ///
    /// An explicit path must exist. Without one, `config.toml` in the working
    /// directory is used if present, otherwise built-in defaults.
    pub fn load(explicit_path: Option<&Path>) -> AppResult<Self> {
        match explicit_path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::from_file(DEFAULT_CONFIG_PATH),
            None => {
                let config = Self::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Apply command-line overrides for the bind address
    ///
    /// The result is validated again, so an override cannot smuggle in a
    /// value the config file would have been rejected for.
    pub fn with_bind_overrides(mut self, host: Option<String>, port: Option<u16>) -> AppResult<Self> {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        self.validate()?;
        Ok(self)
    }

    /// Validate configuration after parsing
    ///
    /// This is called automatically by `from_file()` and `from_str()`, but can
    /// also be called explicitly when constructing Config via other means.
    pub fn validate(&self) -> AppResult<()> {
        // Server
        if self.server.host.trim().is_empty() {
            return Err(AppError::Config(
                "server.host cannot be empty (use 0.0.0.0 for all interfaces)".to_string(),
            ));
        }
        if self.server.max_body_bytes == 0 {
            return Err(AppError::Config(
                "server.max_body_bytes must be greater than 0".to_string(),
            ));
        }

        // Models - the registry is the single source of truth for id rules
        ModelRegistry::new(&self.models.served, &self.models.owned_by)?;

        // Generation
        let generation = &self.generation;
        if generation.timeout_seconds == 0 {
            return Err(AppError::Config(
                "generation.timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if generation.timeout_seconds > MAX_GENERATION_TIMEOUT_SECONDS {
            return Err(AppError::Config(format!(
                "generation.timeout_seconds cannot exceed {} seconds, got {}",
                MAX_GENERATION_TIMEOUT_SECONDS, generation.timeout_seconds
            )));
        }
        if generation.max_tokens == 0 {
            return Err(AppError::Config(
                "generation.max_tokens must be greater than 0".to_string(),
            ));
        }
        if !generation.temperature.is_finite() || !(0.0..=2.0).contains(&generation.temperature)
        {
            return Err(AppError::Config(format!(
                "generation.temperature must be a finite number between 0.0 and 2.0, got {}",
                generation.temperature
            )));
        }
        if !generation.base_url.starts_with("http://") && !generation.base_url.starts_with("https://")
        {
            return Err(AppError::Config(format!(
                "generation.base_url '{}' must start with 'http://' or 'https://'",
                generation.base_url
            )));
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        // Validate config before returning
        config.validate()?;
        Ok(config)
    }
}
