//! Scripted mock provider for tests.
//!
//! Hands out queued responses in order and records every request it saw, so
//! reclassifier/synthesizer tests can assert on prompts without a network.

use std::collections::VecDeque;
use std::sync::Mutex;

use docanswer_shared::{DocAnswerError, Result};

use crate::client::{LlmClient, LlmRequest, LlmResponse};

/// Scripted language-model client.
pub struct MockClient {
    responses: Mutex<VecDeque<String>>,
    fail: bool,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockClient {
    /// Respond with the given texts, in order. Calls past the end error.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Fail every call (provider-down simulation).
    pub fn failing() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fail: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every request received so far.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().expect("mock lock").clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        self.requests.lock().expect("mock lock").push(request.clone());

        if self.fail {
            return Err(DocAnswerError::Llm("mock provider failure".into()));
        }

        match self.responses.lock().expect("mock lock").pop_front() {
            Some(content) => Ok(LlmResponse {
                content,
                model: request.model.clone(),
            }),
            None => Err(DocAnswerError::Llm("mock responses exhausted".into())),
        }
    }
}
