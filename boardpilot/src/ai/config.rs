//! AI configuration parsed from environment variables.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::ai::gemini::GeminiClient;
use crate::ai::ollama::OllamaClient;
use crate::ai::router::AIRouter;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown BOARDPILOT_AI_PROVIDER: {0} (expected 'gemini' or 'ollama')")]
    UnknownProvider(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderKind {
    #[default]
    Gemini,
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Ollama => "ollama",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AiConfig {
    pub provider: ProviderKind,
    pub gemini_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub ollama_url: Option<String>,
    pub ollama_model: Option<String>,
    pub request_timeout_secs: u64,
}

impl AiConfig {
    /// Build typed AI config from environment variables.
    ///
    /// Optional:
    /// - `BOARDPILOT_AI_PROVIDER`: `gemini` (default) or `ollama`
    /// - `GEMINI_API_KEY`, falling back to `API_KEY`
    /// - `BOARDPILOT_MODEL`: Gemini model, client default when absent
    /// - `OLLAMA_URL`, `OLLAMA_MODEL`: enable the local provider
    /// - `BOARDPILOT_REQUEST_TIMEOUT_SECS`: default 120
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AiConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = parse_provider(non_empty("BOARDPILOT_AI_PROVIDER").as_deref())?;
        let gemini_api_key = non_empty("GEMINI_API_KEY").or_else(|| non_empty("API_KEY"));
        let request_timeout_secs = non_empty("BOARDPILOT_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Ok(Self {
            provider,
            gemini_api_key,
            gemini_model: non_empty("BOARDPILOT_MODEL"),
            ollama_url: non_empty("OLLAMA_URL"),
            ollama_model: non_empty("OLLAMA_MODEL"),
            request_timeout_secs,
        })
    }

    /// Whether Ollama should be registered at all.
    pub fn wants_ollama(&self) -> bool {
        self.provider == ProviderKind::Ollama || self.ollama_url.is_some() || self.ollama_model.is_some()
    }

    pub fn build_router(&self) -> AIRouter {
        let timeout = Duration::from_secs(self.request_timeout_secs);
        let mut router = AIRouter::new().with_preferred(self.provider.as_str());

        if let Some(key) = &self.gemini_api_key {
            let mut client = GeminiClient::new(key.clone()).with_timeout(timeout);
            if let Some(model) = &self.gemini_model {
                client = client.with_model(model.clone());
            }
            router.register(Arc::new(client));
        }

        if self.wants_ollama() {
            let client = OllamaClient::new(self.ollama_url.clone(), self.ollama_model.clone()).with_timeout(timeout);
            router.register(Arc::new(client));
        }

        tracing::debug!(
            "AI router configured: preferred={}, providers={:?}",
            self.provider.as_str(),
            router.provider_names()
        );
        router
    }
}

fn parse_provider(raw: Option<&str>) -> Result<ProviderKind, ConfigError> {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref().unwrap_or("gemini") {
        "gemini" => Ok(ProviderKind::Gemini),
        "ollama" => Ok(ProviderKind::Ollama),
        other => Err(ConfigError::UnknownProvider(other.to_string())),
    }
}
