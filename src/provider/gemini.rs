//! Google Gemini `generateContent` backend.
//!
//! The key travels in the `x-goog-api-key` header; request URLs stay key-free.

use std::time::Duration;

use super::{BackendKind, GenerationParams, ProviderResult, TextBackend, build_agent, post_json, text_at};
use crate::config::RemoteBackendConfig;

pub struct GeminiBackend {
    base_url: String,
    model: String,
    api_key: String,
    agent: ureq::Agent,
}

impl GeminiBackend {
    pub fn new(config: &RemoteBackendConfig, timeout: Duration) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            agent: build_agent(timeout),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    pub fn request_body(&self, prompt: &str, params: &GenerationParams) -> serde_json::Value {
        serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": params.temperature,
                "maxOutputTokens": params.max_tokens,
            },
        })
    }
}

impl TextBackend for GeminiBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Gemini
    }

    fn generate(&self, prompt: &str, params: &GenerationParams) -> ProviderResult<String> {
        let json = post_json(
            &self.agent,
            BackendKind::Gemini,
            &self.endpoint(),
            &[("x-goog-api-key", self.api_key.as_str())],
            &self.request_body(prompt, params),
            params.timeout_secs,
        )?;
        text_at(BackendKind::Gemini, &json, "/candidates/0/content/parts/0/text")
    }
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}
