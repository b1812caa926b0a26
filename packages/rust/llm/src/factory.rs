//! Provider selection from configuration.

use std::sync::Arc;

use docanswer_shared::{DocAnswerError, LlmSettings, Result};

use crate::client::LlmClient;
use crate::providers::{GeminiClient, MockClient, OpenAiClient};

/// Build the configured provider. API keys are read from the environment
/// variable named in the settings, never from the config file itself.
pub fn create_client(settings: &LlmSettings) -> Result<Arc<dyn LlmClient>> {
    match settings.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiClient::new(read_api_key(settings)?))),
        "openai" => Ok(Arc::new(OpenAiClient::new(read_api_key(settings)?))),
        "mock" => Ok(Arc::new(MockClient::with_responses(Vec::<String>::new()))),
        other => Err(DocAnswerError::config(format!(
            "unknown llm provider: {other} (expected gemini, openai, or mock)"
        ))),
    }
}

fn read_api_key(settings: &LlmSettings) -> Result<String> {
    match std::env::var(&settings.api_key_env) {
        Ok(key) if !key.is_empty() => Ok(key),
        _ => Err(DocAnswerError::config(format!(
            "API key not found. Set the {} environment variable.",
            settings.api_key_env
        ))),
    }
}
