//! # Model Client Module
//!
//! The text-generation collaborator used by the critical thinker and writer.
//!
//! `RigModelClient` is built once from [`Config`] and shared read-only. Each
//! call builds a one-shot Rig agent whose preamble is the rendered system
//! message and prompts it with the rendered human message. There is no retry
//! or rate limiting here; provider errors surface as
//! [`PipelineError::Upstream`].

use async_trait::async_trait;
use rig::client::{CompletionClient, Nothing};
use rig::completion::Prompt;
use rig::providers::{gemini, ollama};
use tracing::debug;

use crate::config::{Config, ModelProvider};
use crate::error::PipelineError;
use crate::prompt::RenderedPrompt;

/// Anything that can turn a rendered prompt into generated text.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Identifier of the model behind this client, for logs.
    fn model_name(&self) -> &str;

    /// Send `prompt` and return the model's text response.
    async fn generate(&self, prompt: &RenderedPrompt) -> Result<String, PipelineError>;
}

enum Backend {
    Gemini(gemini::Client),
    Ollama(ollama::Client),
}

/// Model client backed by a Rig provider.
pub struct RigModelClient {
    backend: Backend,
    provider: ModelProvider,
    model: String,
    temperature: f64,
}

impl RigModelClient {
    /// Build the client for the configured provider.
    ///
    /// The Gemini client is keyed from `config.gemini_api_key` and the Ollama
    /// client points at `config.ollama_host`; neither reads the environment.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let backend = match config.provider {
            ModelProvider::Gemini => {
                let api_key = config.gemini_api_key.as_deref().ok_or_else(|| {
                    PipelineError::Configuration(
                        "GEMINI_API_KEY must be set when using the gemini provider".to_string(),
                    )
                })?;
                let client = gemini::Client::new(api_key).map_err(|e| {
                    PipelineError::Configuration(format!("failed to build Gemini client: {}", e))
                })?;
                Backend::Gemini(client)
            }
            ModelProvider::Ollama => {
                let client = ollama::Client::builder()
                    .api_key(Nothing)
                    .base_url(&config.ollama_host)
                    .build()
                    .map_err(|e| {
                        PipelineError::Configuration(format!("failed to build Ollama client: {}", e))
                    })?;
                Backend::Ollama(client)
            }
        };

        Ok(Self {
            backend,
            provider: config.provider,
            model: config.model.clone(),
            temperature: f64::from(config.temperature),
        })
    }
}

#[async_trait]
impl ModelClient for RigModelClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &RenderedPrompt) -> Result<String, PipelineError> {
        let preamble = prompt.system().unwrap_or_default();
        let human = prompt.human();

        debug!(
            provider = %self.provider,
            model = %self.model,
            preamble_chars = preamble.len(),
            prompt_chars = human.len(),
            "Sending prompt to model"
        );

        let response = match &self.backend {
            Backend::Gemini(client) => {
                client
                    .agent(&self.model)
                    .preamble(&preamble)
                    .temperature(self.temperature)
                    .build()
                    .prompt(&human)
                    .await
            }
            Backend::Ollama(client) => {
                client
                    .agent(&self.model)
                    .preamble(&preamble)
                    .temperature(self.temperature)
                    .build()
                    .prompt(&human)
                    .await
            }
        };

        response.map_err(|e| PipelineError::upstream("model", e.to_string()))
    }
}
