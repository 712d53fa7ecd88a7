//! AI Provider Trait
//!
//! Defines a common interface for completion providers (Gemini, Ollama, ...)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ai::AIError;

/// Whether the caller expects free text or a JSON document back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    Json,
}

/// Sampling parameters forwarded to the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sampling {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Sampling {
    /// Advisory prose.
    pub const TEXT: Sampling = Sampling {
        temperature: 0.5,
        top_p: 0.9,
        top_k: 40,
    };

    /// Layouts and other JSON replies.
    pub const STRUCTURED: Sampling = Sampling {
        temperature: 0.3,
        top_p: 0.8,
        top_k: 30,
    };
}

/// One completion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// System instruction
    pub system: String,

    /// User prompt
    pub prompt: String,

    pub format: ResponseFormat,

    pub sampling: Sampling,
}

impl CompletionRequest {
    pub fn text(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            format: ResponseFormat::Text,
            sampling: Sampling::TEXT,
        }
    }

    pub fn json(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            format: ResponseFormat::Json,
            sampling: Sampling::STRUCTURED,
        }
    }
}

/// Information about an AI model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Provider name (e.g., "gemini", "ollama")
    pub provider: String,

    /// Model name (e.g., "gemini-2.5-flash", "llama3.1:8b")
    pub model_name: String,

    /// Whether this is a local model
    pub is_local: bool,

    /// Whether the model can be asked for a JSON response type
    pub supports_json: bool,
}

/// Common trait for all AI providers
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Check if the provider is available/configured
    async fn is_available(&self) -> bool;

    /// Run one completion and return the raw reply text
    async fn complete(&self, request: &CompletionRequest) -> Result<String, AIError>;

    /// Get model info
    fn model_info(&self) -> ModelInfo;
}

/// Availability of one registered provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderHealth {
    pub name: String,
    pub available: bool,
    pub model: String,
}

/// Status of AI providers
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderStatus {
    pub providers: Vec<ProviderHealth>,
    pub preferred: String,
    pub active_provider: Option<String>,
}
