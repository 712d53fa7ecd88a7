pub mod config;
pub mod gateway;
pub mod gemini;
pub mod ollama;
pub mod prompts;
pub mod provider;
pub mod router;

use thiserror::Error;

// Re-export for convenience
pub use config::{AiConfig, ConfigError, ProviderKind};
pub use gateway::{strip_code_fence, AiGateway, StructuredFailure, StructuredReply};
pub use gemini::GeminiClient;
pub use ollama::OllamaClient;
pub use provider::{
    AIProvider, CompletionRequest, ModelInfo, ProviderHealth, ProviderStatus, ResponseFormat,
    Sampling,
};
pub use router::AIRouter;

#[derive(Debug, Error)]
pub enum AIError {
    #[error("API request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Failed to parse response: {0}")]
    ParseError(String),
    #[error("Rate limited. Retry after {retry_after} seconds")]
    RateLimited { retry_after: u64 },
    #[error("Missing API key")]
    MissingApiKey,
    #[error("No AI provider reachable (configured: {0})")]
    ProviderUnavailable(String),
    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}
