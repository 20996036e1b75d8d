//! # LLM Module
//!
//! The completion service seam. Both call sites (query expansion and the
//! two synthesis stages) send one free-text prompt and get free text back,
//! so the trait is a single `complete` method. The production
//! implementation goes through rig's provider clients.

use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::{gemini, ollama};
use tracing::debug;

use crate::config::{LlmProvider, ResearchConfig};
use crate::error::ResearchError;

// =============================================================================
// COMPLETION SEAM
// =============================================================================
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Send one prompt and return the completion text.
    ///
    /// An unreachable provider is `UpstreamUnavailable`; an empty completion
    /// is `MalformedResponse`.
    async fn complete(&self, prompt: &str) -> Result<String, ResearchError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

// =============================================================================
// RIG-BACKED SERVICE
// =============================================================================
enum Backend {
    Ollama(ollama::Client),
    Gemini(gemini::Client),
}

/// Completion service over rig's Ollama or Gemini client.
///
/// The client is built once from the explicit configuration; the Gemini
/// credential is passed in directly rather than read from the process
/// environment.
pub struct RigCompletion {
    backend: Backend,
    model: String,
    temperature: f64,
    timeout: std::time::Duration,
}

impl RigCompletion {
    /// Build the client for the configured provider.
    ///
    /// The configuration must already be validated: a Gemini config without
    /// a key is reported as `UpstreamUnavailable`.
    pub fn new(config: &ResearchConfig) -> Result<Self, ResearchError> {
        let backend = match config.provider {
            // Reads OLLAMA_API_BASE_URL, defaulting to http://localhost:11434
            LlmProvider::Ollama => Backend::Ollama(ollama::Client::from_env()),
            LlmProvider::Gemini => {
                let api_key = config.api_key.clone().ok_or_else(|| {
                    ResearchError::UpstreamUnavailable("no Gemini API key configured".to_string())
                })?;
                Backend::Gemini(gemini::Client::from_val(api_key.into()))
            }
        };

        Ok(Self {
            backend,
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: config.completion_timeout,
        })
    }

    async fn prompt_backend(&self, prompt: &str) -> Result<String, ResearchError> {
        let result = match &self.backend {
            Backend::Ollama(client) => {
                let agent = client
                    .agent(&self.model)
                    .temperature(self.temperature)
                    .build();
                agent.prompt(prompt).await
            }
            Backend::Gemini(client) => {
                let agent = client
                    .agent(&self.model)
                    .temperature(self.temperature)
                    .build();
                agent.prompt(prompt).await
            }
        };

        result.map_err(|e| {
            ResearchError::UpstreamUnavailable(format!("{} completion failed: {}", self.name(), e))
        })
    }
}

#[async_trait]
impl CompletionService for RigCompletion {
    async fn complete(&self, prompt: &str) -> Result<String, ResearchError> {
        debug!(
            provider = self.name(),
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "Sending completion request"
        );

        let text = tokio::time::timeout(self.timeout, self.prompt_backend(prompt))
            .await
            .map_err(|_| ResearchError::Timeout {
                what: "completion request",
                secs: self.timeout.as_secs(),
            })??;

        ensure_text(text)
    }

    fn name(&self) -> &str {
        match self.backend {
            Backend::Ollama(_) => "ollama",
            Backend::Gemini(_) => "gemini",
        }
    }
}

/// Reject completions with no visible text.
pub fn ensure_text(text: String) -> Result<String, ResearchError> {
    if text.trim().is_empty() {
        Err(ResearchError::MalformedResponse(
            "completion contained no text".to_string(),
        ))
    } else {
        Ok(text)
    }
}
