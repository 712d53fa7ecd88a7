//! AI Router
//!
//! Routes completions to the preferred provider and falls back to any other
//! registered provider that reports itself available.

use std::sync::Arc;
use tokio::sync::RwLock;

use crate::ai::gemini::GeminiClient;
use crate::ai::ollama::OllamaClient;
use crate::ai::provider::{AIProvider, CompletionRequest, ModelInfo, ProviderHealth, ProviderStatus};
use crate::ai::AIError;

/// Router that manages multiple AI providers
pub struct AIRouter {
    providers: Vec<Arc<dyn AIProvider>>,
    preferred_provider: RwLock<String>,
}

impl AIRouter {
    /// Create a new router with no providers configured
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
            preferred_provider: RwLock::new("gemini".to_string()),
        }
    }

    /// Set the initial preferred provider name.
    pub fn with_preferred(mut self, provider: &str) -> Self {
        self.preferred_provider = RwLock::new(provider.to_string());
        self
    }

    /// Register a provider, replacing any earlier one with the same name.
    pub fn with_provider(mut self, provider: Arc<dyn AIProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn register(&mut self, provider: Arc<dyn AIProvider>) {
        self.providers.retain(|p| p.name() != provider.name());
        self.providers.push(provider);
    }

    fn unregister(&mut self, name: &str) {
        self.providers.retain(|p| p.name() != name);
    }

    /// Configure the Gemini client with an API key. An empty key removes it.
    pub fn set_gemini_api_key(&mut self, key: String) {
        if !key.is_empty() {
            self.register(Arc::new(GeminiClient::new(key)));
        } else {
            self.unregister("gemini");
        }
    }

    /// Configure the Ollama client
    pub fn set_ollama_config(&mut self, url: Option<String>, model: Option<String>) {
        self.register(Arc::new(OllamaClient::new(url, model)));
    }

    pub async fn set_preferred_provider(&self, provider: &str) {
        let mut pref = self.preferred_provider.write().await;
        *pref = provider.to_string();
    }

    pub async fn get_preferred_provider(&self) -> String {
        self.preferred_provider.read().await.clone()
    }

    /// Names of every registered provider in registration order.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Whether any provider has been registered at all.
    pub fn is_configured(&self) -> bool {
        !self.providers.is_empty()
    }

    /// Get the best available provider based on preference and availability
    pub async fn get_provider(&self) -> Option<Arc<dyn AIProvider>> {
        let preferred = self.preferred_provider.read().await.clone();

        if let Some(client) = self.providers.iter().find(|p| p.name() == preferred) {
            if client.is_available().await {
                return Some(client.clone());
            }
        }

        for client in self.providers.iter().filter(|p| p.name() != preferred) {
            if client.is_available().await {
                tracing::debug!("Preferred provider {} unavailable, falling back to {}", preferred, client.name());
                return Some(client.clone());
            }
        }

        None
    }

    /// Run a completion on the best available provider
    pub async fn complete(&self, request: &CompletionRequest) -> Result<String, AIError> {
        if self.providers.is_empty() {
            return Err(AIError::MissingApiKey);
        }
        let provider = match self.get_provider().await {
            Some(provider) => provider,
            None => return Err(AIError::ProviderUnavailable(self.provider_names().join(", "))),
        };

        tracing::info!("Using AI provider: {}", provider.name());
        provider.complete(request).await
    }

    /// Get the status of all providers
    pub async fn get_status(&self) -> ProviderStatus {
        let preferred = self.preferred_provider.read().await.clone();

        let mut providers = Vec::with_capacity(self.providers.len());
        for client in &self.providers {
            providers.push(ProviderHealth {
                name: client.name().to_string(),
                available: client.is_available().await,
                model: client.model_info().model_name,
            });
        }

        let active_provider = self.get_provider().await.map(|p| p.name().to_string());

        ProviderStatus {
            providers,
            preferred,
            active_provider,
        }
    }

    /// Get model info for the active provider
    pub async fn get_model_info(&self) -> Option<ModelInfo> {
        self.get_provider().await.map(|p| p.model_info())
    }

    /// Check if any provider is available
    pub async fn has_provider(&self) -> bool {
        self.get_provider().await.is_some()
    }
}

impl Default for AIRouter {
    fn default() -> Self {
        Self::new()
    }
}
