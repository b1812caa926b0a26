//! Language-model client abstraction and request/response types.
//!
//! The pipeline needs exactly one capability from a model provider: send a
//! system directive plus user content at a given temperature, get text back.
//! Providers are interchangeable behind [`LlmClient`].

use serde::{Deserialize, Serialize};

use docanswer_shared::Result;

/// A completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// User content.
    pub prompt: String,

    /// Model identifier (e.g. "gemini-2.0-flash", "gpt-4o-mini").
    pub model: String,

    /// System directive (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl LlmRequest {
    /// Create a new request with required fields.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            system: None,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the system directive.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// A completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated text.
    pub content: String,

    /// Model that generated the response.
    pub model: String,
}

/// Trait for language-model providers.
///
/// Abstracts the underlying provider (Gemini, OpenAI, a scripted mock) so
/// the reclassifier and synthesizer never know which one is configured.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name (e.g. "gemini", "openai").
    fn provider_name(&self) -> &str;

    /// Perform a completion.
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_all_fields() {
        let request = LlmRequest::new("pergunta", "gemini-2.0-flash")
            .with_system("diretriz")
            .with_temperature(0.0)
            .with_max_tokens(512);

        assert_eq!(request.prompt, "pergunta");
        assert_eq!(request.model, "gemini-2.0-flash");
        assert_eq!(request.system.as_deref(), Some("diretriz"));
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.max_tokens, Some(512));
    }
}
