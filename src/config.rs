//! # Configuration Module
//!
//! This module builds the immutable [`ResearchConfig`] that every component
//! receives at construction time. Service access (provider, model,
//! credential, search endpoint) comes from the environment or a `.env`
//! file; tuning knobs come from the command line.

use anyhow::{Context, Result};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default search provider endpoint (DuckDuckGo Instant Answer API).
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.duckduckgo.com/";

// =============================================================================
// LLM PROVIDER
// =============================================================================
/// Which completion service backs query expansion and synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LlmProvider {
    /// Local models via Ollama. The host is read by the client from
    /// `OLLAMA_API_BASE_URL` (default http://localhost:11434).
    #[default]
    Ollama,
    /// Google Gemini; requires an API key.
    Gemini,
}

impl LlmProvider {
    pub fn default_model(&self) -> &'static str {
        match self {
            LlmProvider::Ollama => "llama3.2",
            LlmProvider::Gemini => "gemini-1.5-flash",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "gemini" => Ok(LlmProvider::Gemini),
            other => anyhow::bail!("Unknown LLM provider '{}' (expected ollama or gemini)", other),
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::Ollama => f.write_str("ollama"),
            LlmProvider::Gemini => f.write_str("gemini"),
        }
    }
}

// =============================================================================
// CONFIGURATION STRUCT
// =============================================================================
/// Configuration for one research system.
///
/// Created once at setup and never mutated afterwards; components take a
/// clone or a reference, so there is no shared client state.
#[derive(Clone)]
pub struct ResearchConfig {
    pub provider: LlmProvider,

    /// Completion model name (e.g. "llama3.2", "gemini-1.5-flash")
    pub model: String,

    /// Credential for the completion service
    pub api_key: Option<String>,

    /// Temperature for LLM responses (0.0 = deterministic)
    pub temperature: f64,

    /// Upper bound on unique sources; validated but not applied to results
    pub max_sources: usize,

    /// Pause between search rounds
    pub search_delay: Duration,

    pub search_timeout: Duration,
    pub completion_timeout: Duration,

    /// Base URL of the search provider
    pub search_endpoint: String,
}

/// The credential never shows up in logs or panics.
impl fmt::Debug for ResearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResearchConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("temperature", &self.temperature)
            .field("max_sources", &self.max_sources)
            .field("search_delay", &self.search_delay)
            .field("search_timeout", &self.search_timeout)
            .field("completion_timeout", &self.completion_timeout)
            .field("search_endpoint", &self.search_endpoint)
            .finish()
    }
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Ollama,
            model: LlmProvider::Ollama.default_model().to_string(),
            api_key: None,
            temperature: 0.7,
            max_sources: 15,
            search_delay: Duration::from_millis(500),
            search_timeout: Duration::from_secs(10),
            completion_timeout: Duration::from_secs(120),
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
        }
    }
}

// =============================================================================
// CONFIGURATION LOADING
// =============================================================================
impl ResearchConfig {
    /// Load service settings from environment variables.
    ///
    /// # Rust Concept: The ? Operator
    ///
    /// Each parse failure returns early with a message added by `.context()`.
    pub fn from_env() -> Result<Self> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();

        let mut config = ResearchConfig::default();

        if let Ok(val) = env::var("LLM_PROVIDER") {
            config.provider = val.parse().context("LLM_PROVIDER must be 'ollama' or 'gemini'")?;
            config.model = config.provider.default_model().to_string();
        }

        if let Ok(val) = env::var("RESEARCH_MODEL") {
            config.model = val;
        }

        if let Ok(val) = env::var("GEMINI_API_KEY") {
            if !val.trim().is_empty() {
                config.api_key = Some(val);
            }
        }

        if let Ok(val) = env::var("TEMPERATURE") {
            config.temperature = val
                .parse()
                .context("TEMPERATURE must be a valid floating-point number (e.g., 0.7)")?;
        }

        if let Ok(val) = env::var("SEARCH_API_URL") {
            config.search_endpoint = val;
        }

        Ok(config)
    }

    /// Switch provider, resetting the model to that provider's default.
    pub fn with_provider(mut self, provider: LlmProvider) -> Self {
        if self.provider != provider {
            self.provider = provider;
            self.model = provider.default_model().to_string();
        }
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_sources(mut self, max_sources: usize) -> Self {
        self.max_sources = max_sources;
        self
    }

    /// Set the inter-round pause in seconds. Negative or non-finite
    /// values are errors.
    pub fn with_search_delay_secs(mut self, secs: f64) -> Result<Self> {
        if !secs.is_finite() || secs < 0.0 {
            anyhow::bail!("Search delay must be a non-negative number of seconds, got: {}", secs);
        }
        self.search_delay = Duration::from_secs_f64(secs);
        Ok(self)
    }

    pub fn with_search_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.search_endpoint = endpoint.into();
        self
    }

    /// Validate the configuration before any component is built.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.temperature) {
            anyhow::bail!(
                "Temperature must be between 0.0 and 2.0, got: {}",
                self.temperature
            );
        }

        if self.max_sources == 0 {
            anyhow::bail!("max_sources must be at least 1");
        }

        if self.model.trim().is_empty() {
            anyhow::bail!("Model name cannot be empty");
        }

        if self.provider == LlmProvider::Gemini
            && self.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            anyhow::bail!("GEMINI_API_KEY is required when using the gemini provider");
        }

        if self.search_endpoint.trim().is_empty() {
            anyhow::bail!("Search endpoint cannot be empty");
        }

        Ok(())
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ResearchConfig::default();

        assert_eq!(config.provider, LlmProvider::Ollama);
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.max_sources, 15);
        assert_eq!(config.search_delay, Duration::from_millis(500));
        assert_eq!(config.search_timeout, Duration::from_secs(10));
        assert_eq!(config.search_endpoint, DEFAULT_SEARCH_ENDPOINT);
    }

    #[test]
    fn test_config_validation_valid() {
        let config = ResearchConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_temperature() {
        let mut config = ResearchConfig::default();
        config.temperature = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_max_sources() {
        let config = ResearchConfig::default().with_max_sources(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_gemini_requires_key() {
        let config = ResearchConfig::default().with_provider(LlmProvider::Gemini);
        assert_eq!(config.model, "gemini-1.5-flash");
        assert!(config.validate().is_err());

        let mut config = config;
        config.api_key = Some("key-123".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_search_delay_rejects_negative() {
        assert!(ResearchConfig::default().with_search_delay_secs(-1.0).is_err());
        assert!(ResearchConfig::default()
            .with_search_delay_secs(f64::NAN)
            .is_err());

        let config = ResearchConfig::default().with_search_delay_secs(0.0).unwrap();
        assert_eq!(config.search_delay, Duration::ZERO);
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!("Gemini".parse::<LlmProvider>().unwrap(), LlmProvider::Gemini);
        assert_eq!(" ollama ".parse::<LlmProvider>().unwrap(), LlmProvider::Ollama);
        assert!("openai".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let mut config = ResearchConfig::default();
        config.api_key = Some("super-secret".to_string());
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
