//! # Configuration Module
//!
//! Loads process configuration once at start-up from environment variables
//! (and a `.env` file, if present). Nothing here is read again during a run:
//! the values are used to build the model client and the search tool, which
//! are then shared read-only with every stage.

use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// MODEL PROVIDER
// =============================================================================
/// Which hosted (or local) model service backs the model client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelProvider {
    /// Google Gemini; needs `GEMINI_API_KEY`.
    Gemini,
    /// A local Ollama server.
    Ollama,
}

impl ModelProvider {
    /// The model used when none is configured explicitly.
    pub fn default_model(&self) -> &'static str {
        match self {
            ModelProvider::Gemini => "gemini-2.5-pro",
            ModelProvider::Ollama => "llama3.2",
        }
    }
}

impl FromStr for ModelProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(ModelProvider::Gemini),
            "ollama" => Ok(ModelProvider::Ollama),
            other => anyhow::bail!("Unknown LLM provider '{}' (expected gemini or ollama)", other),
        }
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelProvider::Gemini => f.write_str("gemini"),
            ModelProvider::Ollama => f.write_str("ollama"),
        }
    }
}

// =============================================================================
// CONFIGURATION STRUCT
// =============================================================================
/// Process-wide configuration for the pipeline.
#[derive(Clone)]
pub struct Config {
    /// Model service to talk to
    pub provider: ModelProvider,

    /// Model identifier, e.g. "gemini-2.5-pro" or "gemini-2.5-flash"
    pub model: String,

    /// Gemini API key (only needed for the gemini provider)
    pub gemini_api_key: Option<String>,

    /// Ollama server URL (default: http://localhost:11434)
    pub ollama_host: String,

    /// Temperature for LLM responses (0.0 = deterministic, 2.0 = very loose)
    pub temperature: f32,

    /// Maximum number of search results handed to the critical thinker
    pub max_search_results: usize,

    /// Log level for the application
    pub log_level: String,
}

// Keeps the API key out of logs and panic messages.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field(
                "gemini_api_key",
                &self.gemini_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("ollama_host", &self.ollama_host)
            .field("temperature", &self.temperature)
            .field("max_search_results", &self.max_search_results)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let provider = ModelProvider::Gemini;
        Self {
            provider,
            model: provider.default_model().to_string(),
            gemini_api_key: None,
            ollama_host: "http://localhost:11434".to_string(),
            temperature: 0.7,
            max_search_results: 5,
            log_level: "info".to_string(),
        }
    }
}

// =============================================================================
// CONFIGURATION LOADING
// =============================================================================
impl Config {
    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first, if present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests pass a map instead of touching the
    /// real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(val) = lookup("LLM_PROVIDER") {
            config.set_provider(val.parse()?);
        }

        if let Some(val) = lookup("LLM_MODEL") {
            config.model = val;
        }

        config.gemini_api_key = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty());

        if let Some(val) = lookup("OLLAMA_API_BASE_URL") {
            config.ollama_host = val;
        }

        if let Some(val) = lookup("TEMPERATURE") {
            config.temperature = val
                .parse()
                .context("TEMPERATURE must be a valid floating-point number (e.g., 0.7)")?;
        }

        if let Some(val) = lookup("MAX_SEARCH_RESULTS") {
            config.max_search_results = val
                .parse()
                .context("MAX_SEARCH_RESULTS must be a valid positive integer")?;
        }

        if let Some(val) = lookup("RUST_LOG") {
            config.log_level = val;
        }

        Ok(config)
    }

    /// Switch provider, moving the model to the provider's default if it was
    /// still the previous provider's default.
    pub fn set_provider(&mut self, provider: ModelProvider) {
        if self.model == self.provider.default_model() {
            self.model = provider.default_model().to_string();
        }
        self.provider = provider;
    }

    /// Validate the configuration before any client is built.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            anyhow::bail!(
                "Temperature must be between 0.0 and 2.0, got: {}",
                self.temperature
            );
        }

        if self.max_search_results == 0 {
            anyhow::bail!("MAX_SEARCH_RESULTS must be at least 1");
        }

        if self.model.trim().is_empty() {
            anyhow::bail!("LLM_MODEL cannot be empty");
        }

        if self.provider == ModelProvider::Gemini && self.gemini_api_key.is_none() {
            anyhow::bail!("GEMINI_API_KEY must be set when using the gemini provider");
        }

        Ok(())
    }
}
