//! Shared test helpers for gateway and interpreter tests.

use culturedrone_core::error::ProviderError;
use culturedrone_core::message::Message;
use culturedrone_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::sync::Mutex;

/// A mock provider that returns a sequence of scripted results.
///
/// Each call to `complete` returns the next result in the queue and records
/// the request. Panics if more calls are made than results provided.
pub struct ScriptedProvider {
    results: Vec<Result<ProviderResponse, ProviderError>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(results: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            results,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The final user turn of the `n`th request.
    pub fn user_turn(&self, n: usize) -> String {
        let requests = self.requests.lock().unwrap();
        requests[n].messages.last().unwrap().content.clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let n = requests.len();
        if n >= self.results.len() {
            panic!(
                "ScriptedProvider: no more results (call #{}, have {})",
                n,
                self.results.len()
            );
        }
        requests.push(request);
        self.results[n].clone()
    }
}

/// A successful reply carrying `text`.
pub fn reply(text: &str) -> Result<ProviderResponse, ProviderError> {
    Ok(ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    })
}

/// A well-formed JSON reply with no action.
pub fn say(text: &str) -> Result<ProviderResponse, ProviderError> {
    reply(&serde_json::json!({"response_text": text, "action": null, "parameters": {}}).to_string())
}

/// A transport failure.
pub fn network_down() -> Result<ProviderResponse, ProviderError> {
    Err(ProviderError::Network("connection refused".into()))
}
