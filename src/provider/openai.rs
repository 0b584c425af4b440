//! OpenAI-style `/chat/completions` backend.
//!
//! Serves both the hosted OpenAI API (bearer key) and self-hosted
//! OpenAI-compatible servers such as LM Studio (no key).

use std::time::Duration;

use super::{BackendKind, GenerationParams, ProviderResult, TextBackend, build_agent, post_json, text_at};
use crate::config::{LocalBackendConfig, RemoteBackendConfig};

pub struct ChatCompletionsBackend {
    kind: BackendKind,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    agent: ureq::Agent,
}

impl ChatCompletionsBackend {
    /// Hosted OpenAI.
    pub fn openai(config: &RemoteBackendConfig, timeout: Duration) -> Self {
        Self {
            kind: BackendKind::OpenAi,
            endpoint: completions_url(&config.base_url),
            model: config.model.clone(),
            api_key: Some(config.api_key.clone()),
            agent: build_agent(timeout),
        }
    }

    /// Self-hosted OpenAI-compatible server.
    pub fn local(config: &LocalBackendConfig, timeout: Duration) -> Self {
        Self {
            kind: BackendKind::Local,
            endpoint: completions_url(&config.base_url),
            model: config.model.clone(),
            api_key: None,
            agent: build_agent(timeout),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Request body for one user turn.
    pub fn request_body(&self, prompt: &str, params: &GenerationParams) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": params.temperature,
            "max_tokens": params.max_tokens,
        })
    }
}

fn completions_url(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

impl TextBackend for ChatCompletionsBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn generate(&self, prompt: &str, params: &GenerationParams) -> ProviderResult<String> {
        let bearer = self.api_key.as_ref().map(|key| format!("Bearer {key}"));
        let headers: Vec<(&str, &str)> = bearer
            .as_deref()
            .map(|value| vec![("Authorization", value)])
            .unwrap_or_default();

        let json = post_json(
            &self.agent,
            self.kind,
            &self.endpoint,
            &headers,
            &self.request_body(prompt, params),
            params.timeout_secs,
        )?;
        text_at(self.kind, &json, "/choices/0/message/content")
    }
}

impl std::fmt::Debug for ChatCompletionsBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsBackend")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("has_key", &self.api_key.is_some())
            .finish()
    }
}
