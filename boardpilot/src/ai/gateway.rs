//! AI gateway
//!
//! The single entry point the controller uses for completions. Wraps the
//! router with the "not configured" short-circuit, turns transport errors
//! into assistant-visible text and parses structured replies into either a
//! JSON value or a [`StructuredFailure`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ai::config::AiConfig;
use crate::ai::prompts::system_instruction;
use crate::ai::provider::CompletionRequest;
use crate::ai::router::AIRouter;
use crate::ai::AIError;
use crate::localization::Language;

pub const NOT_CONFIGURED_TEXT: &str = "AI API key not configured. Cannot process text request.";
pub const NOT_CONFIGURED_STRUCTURED: &str = "AI API key not configured. Cannot process structured request.";
pub const INVALID_JSON_ERROR: &str = "AI returned an invalid JSON structure or non-JSON advice.";

/// Why a structured call produced no usable JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StructuredFailure {
    pub error: String,
    #[serde(default)]
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
}

impl StructuredFailure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StructuredReply {
    Value(Value),
    Failed(StructuredFailure),
}

impl StructuredReply {
    pub fn value(&self) -> Option<&Value> {
        match self {
            StructuredReply::Value(v) => Some(v),
            StructuredReply::Failed(_) => None,
        }
    }

    /// The failure, or a generic one when the value has the wrong shape.
    pub fn failure(&self) -> StructuredFailure {
        match self {
            StructuredReply::Failed(f) => f.clone(),
            StructuredReply::Value(_) => StructuredFailure::new("No valid data."),
        }
    }
}

pub struct AiGateway {
    router: AIRouter,
}

impl AiGateway {
    pub fn new(router: AIRouter) -> Self {
        Self { router }
    }

    /// Gateway with no providers. Every call short-circuits.
    pub fn unconfigured() -> Self {
        Self::new(AIRouter::new())
    }

    pub fn from_config(config: &AiConfig) -> Self {
        Self::new(config.build_router())
    }

    pub fn router(&self) -> &AIRouter {
        &self.router
    }

    pub fn is_configured(&self) -> bool {
        self.router.is_configured()
    }

    /// Free-text completion. Never fails; errors come back as text.
    pub async fn generate_text(&self, prompt: &str, language: Language) -> String {
        if !self.is_configured() {
            return NOT_CONFIGURED_TEXT.to_string();
        }

        let request = CompletionRequest::text(system_instruction(language.english_name()), prompt);
        match self.router.complete(&request).await {
            Ok(text) => text,
            Err(AIError::MissingApiKey) => NOT_CONFIGURED_TEXT.to_string(),
            Err(e) => {
                tracing::error!("AI text request failed: {}", e);
                format!("Error communicating with AI: {}", e)
            }
        }
    }

    /// JSON completion. Markdown fences are stripped before parsing.
    pub async fn generate_structured(&self, prompt: &str, language: Language) -> StructuredReply {
        if !self.is_configured() {
            return StructuredReply::Failed(StructuredFailure::new(NOT_CONFIGURED_STRUCTURED));
        }

        let request = CompletionRequest::json(system_instruction(language.english_name()), prompt);
        match self.router.complete(&request).await {
            Ok(text) => parse_structured(&text),
            Err(AIError::MissingApiKey) => StructuredReply::Failed(StructuredFailure::new(NOT_CONFIGURED_STRUCTURED)),
            Err(e) => {
                tracing::error!("AI structured request failed: {}", e);
                StructuredReply::Failed(StructuredFailure::new(format!(
                    "Error communicating with AI for structured data: {}",
                    e
                )))
            }
        }
    }
}

impl Default for AiGateway {
    fn default() -> Self {
        Self::unconfigured()
    }
}

/// Parse a raw structured reply.
pub fn parse_structured(raw: &str) -> StructuredReply {
    let body = strip_code_fence(raw);
    match serde_json::from_str::<Value>(&body) {
        Ok(value) => StructuredReply::Value(value),
        Err(e) => {
            tracing::warn!("Failed to parse JSON response: {}", e);
            StructuredReply::Failed(StructuredFailure {
                error: INVALID_JSON_ERROR.to_string(),
                details: e.to_string(),
                raw_text: Some(raw.to_string()),
                advice: extract_advice(raw),
            })
        }
    }
}

/// Remove a surrounding Markdown code fence and its language tag.
pub fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.len() < 6 || !trimmed.starts_with("```") || !trimmed.ends_with("```") {
        return trimmed.to_string();
    }

    let inner = &trimmed[3..trimmed.len() - 3];
    let untagged = inner.trim_start_matches(|c: char| c.is_alphanumeric() || c == '_');
    let body = untagged.trim();
    if body.is_empty() {
        inner.trim().to_string()
    } else {
        body.to_string()
    }
}

/// Best-effort advice from an unparseable reply: the `"advice"` string
/// value if one can be read, else the whole text when it mentions advice.
fn extract_advice(raw: &str) -> Option<String> {
    if let Some(pos) = raw.find("\"advice\"") {
        let rest = raw[pos + "\"advice\"".len()..].trim_start();
        if let Some(after_colon) = rest.strip_prefix(':') {
            let mut stream = serde_json::Deserializer::from_str(after_colon.trim_start()).into_iter::<String>();
            if let Some(Ok(advice)) = stream.next() {
                return Some(advice);
            }
        }
    }
    if raw.contains("advice") {
        return Some(raw.to_string());
    }
    None
}
