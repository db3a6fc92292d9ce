//! Oracle gateway: one chat-completion round-trip.
//!
//! Assembles `system + history + new user turn`, sends it with fixed
//! generation parameters, and hands back the assistant text exactly as the
//! provider returned it. Retrying and parsing belong to the interpreter.

use std::sync::Arc;
use culturedrone_config::AppConfig;
use culturedrone_core::diagnostic::{DiagnosticEvent, DiagnosticRecord, DiagnosticSink, NullSink};
use culturedrone_core::error::ProviderError;
use culturedrone_core::message::Message;
use culturedrone_core::provider::{Provider, ProviderRequest};
use tracing::debug;

/// Fixed sampling parameters sent with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: "grok-2-latest".into(),
            temperature: 1.2,
            top_p: 0.9,
            max_tokens: 4096,
        }
    }
}

impl GenerationParams {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
        }
    }
}

/// Sends conversations to the oracle.
pub struct OracleGateway {
    provider: Arc<dyn Provider>,
    params: GenerationParams,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl OracleGateway {
    pub fn new(provider: Arc<dyn Provider>, params: GenerationParams) -> Self {
        Self {
            provider,
            params,
            diagnostics: Arc::new(NullSink),
        }
    }

    /// Record every raw reply to `sink`.
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Build the outbound message list.
    pub fn messages(system_prompt: &str, history: &[Message], new_input: &str) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(system_prompt));
        messages.extend(history.iter().cloned());
        messages.push(Message::user(new_input));
        messages
    }

    /// One round-trip: returns the raw assistant text.
    pub async fn converse(
        &self,
        system_prompt: &str,
        history: &[Message],
        new_input: &str,
    ) -> Result<String, ProviderError> {
        let request = ProviderRequest {
            model: self.params.model.clone(),
            messages: Self::messages(system_prompt, history, new_input),
            temperature: self.params.temperature,
            top_p: Some(self.params.top_p),
            max_tokens: Some(self.params.max_tokens),
            stream: false,
        };

        debug!(
            provider = %self.provider.name(),
            history = history.len(),
            "Calling oracle"
        );

        let response = self.provider.complete(request).await?;

        if let Some(usage) = &response.usage {
            debug!(
                model = %response.model,
                total_tokens = usage.total_tokens,
                "Oracle replied"
            );
        }

        let text = response.message.content;
        self.diagnostics.record(&DiagnosticRecord::now(DiagnosticEvent::RawReply {
            text: text.clone(),
        }));
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedProvider, reply};
    use culturedrone_core::diagnostic::InMemorySink;
    use culturedrone_core::message::Role;

    #[test]
    fn messages_are_system_history_then_input() {
        let history = vec![Message::user("hi"), Message::assistant("Oh, it's you.")];
        let messages = OracleGateway::messages("contract", &history, "0, 8");

        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(messages[0].content, "contract");
        assert_eq!(messages[3].content, "0, 8");
    }

    #[test]
    fn params_follow_config() {
        let config = AppConfig {
            model: "grok-beta".into(),
            temperature: 0.4,
            ..AppConfig::default()
        };
        let params = GenerationParams::from_config(&config);
        assert_eq!(params.model, "grok-beta");
        assert!((params.temperature - 0.4).abs() < f32::EPSILON);
        assert_eq!(params.max_tokens, 4096);
    }

    #[tokio::test]
    async fn converse_returns_text_unmodified_and_sends_fixed_params() {
        let provider = Arc::new(ScriptedProvider::new(vec![reply("```json\n{}\n```")]));
        let sink = Arc::new(InMemorySink::new());
        let gateway = OracleGateway::new(provider.clone(), GenerationParams::default())
            .with_diagnostics(sink.clone());

        let history = vec![Message::user("earlier")];
        let text = gateway.converse("contract", &history, "now").await.unwrap();
        assert_eq!(text, "```json\n{}\n```");

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.model, "grok-2-latest");
        assert!((req.temperature - 1.2).abs() < f32::EPSILON);
        assert_eq!(req.top_p, Some(0.9));
        assert_eq!(req.max_tokens, Some(4096));
        assert!(!req.stream);
        assert_eq!(req.messages.len(), 3);

        assert_eq!(
            sink.events(),
            vec![DiagnosticEvent::RawReply { text: "```json\n{}\n```".into() }]
        );
    }

    #[tokio::test]
    async fn transport_errors_pass_through_without_retry() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Network(
            "connection refused".into(),
        ))]));
        let gateway = OracleGateway::new(provider.clone(), GenerationParams::default());

        let err = gateway.converse("contract", &[], "hi").await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
        assert_eq!(provider.call_count(), 1);
    }
}
