//! Anthropic Messages API backend.

use std::time::Duration;

use super::{BackendKind, GenerationParams, ProviderResult, TextBackend, build_agent, post_json, text_at};
use crate::config::RemoteBackendConfig;

const API_VERSION: &str = "2023-06-01";

pub struct AnthropicBackend {
    endpoint: String,
    model: String,
    api_key: String,
    agent: ureq::Agent,
}

impl AnthropicBackend {
    pub fn new(config: &RemoteBackendConfig, timeout: Duration) -> Self {
        Self {
            endpoint: format!("{}/v1/messages", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            agent: build_agent(timeout),
        }
    }

    pub fn request_body(&self, prompt: &str, params: &GenerationParams) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        })
    }
}

impl TextBackend for AnthropicBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Anthropic
    }

    fn generate(&self, prompt: &str, params: &GenerationParams) -> ProviderResult<String> {
        let json = post_json(
            &self.agent,
            BackendKind::Anthropic,
            &self.endpoint,
            &[("x-api-key", self.api_key.as_str()), ("anthropic-version", API_VERSION)],
            &self.request_body(prompt, params),
            params.timeout_secs,
        )?;
        text_at(BackendKind::Anthropic, &json, "/content/0/text")
    }
}

impl std::fmt::Debug for AnthropicBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicBackend")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish()
    }
}
