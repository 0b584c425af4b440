//! Provider gateway: one "generate text" call over an ordered list of
//! language-model backends.
//!
//! The gateway tries each configured backend once, in the order fixed at
//! construction. The first successful reply wins; any failure is logged and
//! the next backend is tried. When every backend has failed (or none is
//! configured) the gateway answers with [`heuristic::synthesize_response`],
//! so [`ProviderGateway::invoke`] never fails.
//!
//! All HTTP is synchronous (`ureq`) with a per-request timeout.

pub mod anthropic;
pub mod gemini;
pub mod openai;

pub use anthropic::AnthropicBackend;
pub use gemini::GeminiBackend;
pub use openai::ChatCompletionsBackend;

use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::EngineConfig;
use crate::heuristic;

// ── Errors ─────────────────────────────────────────────────────────────────

/// Errors from a single backend attempt.
#[derive(Debug, Error, Diagnostic)]
pub enum ProviderError {
    #[error("{backend} is not configured")]
    #[diagnostic(
        code(taskwise::provider::not_configured),
        help("Set the backend's API key (or enable the local backend) in config.toml or the environment.")
    )]
    NotConfigured { backend: BackendKind },

    #[error("{backend} request failed: {message}")]
    #[diagnostic(
        code(taskwise::provider::request_failed),
        help("Check network connectivity and the backend base URL.")
    )]
    RequestFailed {
        backend: BackendKind,
        message: String,
    },

    #[error("{backend} request timed out after {timeout_secs}s")]
    #[diagnostic(
        code(taskwise::provider::timeout),
        help("Increase generation.timeout_secs or use a faster model.")
    )]
    Timeout {
        backend: BackendKind,
        timeout_secs: u64,
    },

    #[error("{backend} returned HTTP {status}")]
    #[diagnostic(
        code(taskwise::provider::status),
        help("401/403 usually means a bad API key; 429 means the account is rate limited.")
    )]
    Status { backend: BackendKind, status: u16 },

    #[error("{backend} reply has an unexpected shape: {message}")]
    #[diagnostic(
        code(taskwise::provider::malformed_reply),
        help("The backend answered but not in its documented response format.")
    )]
    MalformedReply {
        backend: BackendKind,
        message: String,
    },
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

// ── BackendKind ────────────────────────────────────────────────────────────

/// Which family of backend a [`TextBackend`] talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[serde(alias = "open_ai")]
    OpenAi,
    #[serde(alias = "claude")]
    Anthropic,
    #[serde(alias = "google")]
    Gemini,
    /// Self-hosted OpenAI-compatible endpoint (LM Studio and friends).
    #[serde(alias = "lm_studio", alias = "lmstudio")]
    Local,
}

impl BackendKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Gemini => "gemini",
            Self::Local => "local",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "open_ai" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "gemini" | "google" => Ok(Self::Gemini),
            "local" | "lm_studio" | "lmstudio" => Ok(Self::Local),
            other => Err(format!("unknown backend \"{other}\"")),
        }
    }
}

// ── Generation parameters ──────────────────────────────────────────────────

/// Sampling and transport limits applied to every backend call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    500
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ── TextBackend ────────────────────────────────────────────────────────────

/// A single text-generation backend.
///
/// Implementations make exactly one attempt per call; retrying is the
/// gateway's job (by moving on to the next backend).
pub trait TextBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn generate(&self, prompt: &str, params: &GenerationParams) -> ProviderResult<String>;
}

/// Where a gateway reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationSource {
    Backend(BackendKind),
    Simulated,
}

/// Text returned by the gateway, tagged with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    pub source: GenerationSource,
}

// ── Gateway ────────────────────────────────────────────────────────────────

/// Ordered fallback chain over [`TextBackend`]s.
pub struct ProviderGateway {
    backends: Vec<Box<dyn TextBackend>>,
    params: GenerationParams,
}

impl ProviderGateway {
    /// A gateway with no backends: every call is simulated.
    pub fn new(params: GenerationParams) -> Self {
        Self {
            backends: Vec::new(),
            params,
        }
    }

    /// Append a backend to the end of the chain.
    pub fn with_backend(mut self, backend: impl TextBackend + 'static) -> Self {
        self.backends.push(Box::new(backend));
        self
    }

    /// Build the chain from configuration.
    ///
    /// Backends appear in [`EngineConfig::resolved_order`]; any without a
    /// usable credential is left out silently.
    pub fn from_config(config: &EngineConfig) -> Self {
        let mut gateway = Self::new(config.generation);
        for kind in config.resolved_order() {
            if !config.is_configured(kind) {
                tracing::debug!(backend = %kind, "backend not configured, skipping");
                continue;
            }
            let timeout = Duration::from_secs(config.generation.timeout_secs);
            let backend: Box<dyn TextBackend> = match kind {
                BackendKind::OpenAi => Box::new(ChatCompletionsBackend::openai(&config.openai, timeout)),
                BackendKind::Local => Box::new(ChatCompletionsBackend::local(&config.local, timeout)),
                BackendKind::Anthropic => Box::new(AnthropicBackend::new(&config.anthropic, timeout)),
                BackendKind::Gemini => Box::new(GeminiBackend::new(&config.gemini, timeout)),
            };
            gateway.backends.push(backend);
        }
        tracing::info!(
            backends = ?gateway.backend_kinds(),
            "provider gateway ready"
        );
        gateway
    }

    /// Kinds of the backends in the chain, in try order.
    pub fn backend_kinds(&self) -> Vec<BackendKind> {
        self.backends.iter().map(|b| b.kind()).collect()
    }

    /// Try each backend once in order, falling back to simulated text.
    pub fn generate(&self, prompt: &str) -> Generation {
        for backend in &self.backends {
            match backend.generate(prompt, &self.params) {
                Ok(text) => {
                    tracing::debug!(backend = %backend.kind(), chars = text.len(), "backend replied");
                    return Generation {
                        text,
                        source: GenerationSource::Backend(backend.kind()),
                    };
                }
                Err(e) => {
                    tracing::warn!(backend = %backend.kind(), error = %e, "backend failed, trying next");
                }
            }
        }
        Generation {
            text: heuristic::synthesize_response(prompt),
            source: GenerationSource::Simulated,
        }
    }

    /// Raw reply text for `prompt`. Never fails.
    pub fn invoke(&self, prompt: &str) -> String {
        self.generate(prompt).text
    }
}

impl std::fmt::Debug for ProviderGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderGateway")
            .field("backends", &self.backend_kinds())
            .field("params", &self.params)
            .finish()
    }
}

// ── HTTP helpers shared by the concrete backends ───────────────────────────

pub(crate) fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(timeout).build()
}

/// POST a JSON body and decode the JSON reply envelope.
pub(crate) fn post_json(
    agent: &ureq::Agent,
    backend: BackendKind,
    url: &str,
    headers: &[(&str, &str)],
    body: &serde_json::Value,
    timeout_secs: u64,
) -> ProviderResult<serde_json::Value> {
    let body_str = serde_json::to_string(body).map_err(|e| ProviderError::RequestFailed {
        backend,
        message: format!("JSON serialize error: {e}"),
    })?;

    let mut request = agent.post(url).set("Content-Type", "application/json");
    for (name, value) in headers {
        request = request.set(name, value);
    }

    let resp = request.send_string(&body_str).map_err(|e| match e {
        ureq::Error::Status(status, _) => ProviderError::Status { backend, status },
        ureq::Error::Transport(t) => {
            let message = t.to_string();
            if message.contains("timed out") {
                ProviderError::Timeout {
                    backend,
                    timeout_secs,
                }
            } else {
                ProviderError::RequestFailed { backend, message }
            }
        }
    })?;

    let resp_str = resp
        .into_string()
        .map_err(|e| ProviderError::MalformedReply {
            backend,
            message: e.to_string(),
        })?;

    serde_json::from_str(&resp_str).map_err(|e| ProviderError::MalformedReply {
        backend,
        message: e.to_string(),
    })
}

/// Pull a string out of a reply envelope by JSON pointer.
pub(crate) fn text_at(
    backend: BackendKind,
    json: &serde_json::Value,
    pointer: &str,
) -> ProviderResult<String> {
    json.pointer(pointer)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| ProviderError::MalformedReply {
            backend,
            message: format!("missing '{pointer}'"),
        })
}

// ── ScriptedBackend ────────────────────────────────────────────────────────

#[derive(Default)]
struct Script {
    replies: VecDeque<ProviderResult<String>>,
    prompts: Vec<String>,
}

/// In-memory backend for tests and offline runs.
///
/// Queue replies or failures with [`push_reply`](Self::push_reply) and
/// [`push_failure`](Self::push_failure); each call pops one. An exhausted
/// script fails like an unreachable server. Clones share the same script,
/// so a test can keep a handle after moving one into a gateway.
#[derive(Clone)]
pub struct ScriptedBackend {
    kind: BackendKind,
    script: Arc<Mutex<Script>>,
}

impl ScriptedBackend {
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    pub fn push_reply(&self, text: impl Into<String>) -> &Self {
        if let Ok(mut script) = self.script.lock() {
            script.replies.push_back(Ok(text.into()));
        }
        self
    }

    pub fn push_failure(&self, message: impl Into<String>) -> &Self {
        if let Ok(mut script) = self.script.lock() {
            script.replies.push_back(Err(ProviderError::RequestFailed {
                backend: self.kind,
                message: message.into(),
            }));
        }
        self
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.script
            .lock()
            .map(|s| s.prompts.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts().len()
    }
}

impl TextBackend for ScriptedBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn generate(&self, prompt: &str, _params: &GenerationParams) -> ProviderResult<String> {
        let mut script = self
            .script
            .lock()
            .map_err(|_| ProviderError::RequestFailed {
                backend: self.kind,
                message: "script lock poisoned".into(),
            })?;
        script.prompts.push(prompt.to_string());
        script
            .replies
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProviderError::RequestFailed {
                    backend: self.kind,
                    message: "script exhausted".into(),
                })
            })
    }
}
