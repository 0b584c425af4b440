//! Engine configuration, persisted as TOML.
//!
//! Resolution order: built-in defaults, then `config.toml`, then the
//! environment overlay. The result is resolved once and handed to the
//! engine; nothing re-reads it afterwards.

use std::path::Path;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::TaskwiseResult;
use crate::provider::{BackendKind, GenerationParams};

/// Errors from loading or saving configuration.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(taskwise::config::read),
        help("Ensure the config file exists and is readable, or run `taskwise init`.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}")]
    #[diagnostic(
        code(taskwise::config::parse),
        help("Check the TOML syntax. Unknown backend names must be one of openai, anthropic, gemini, local.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(taskwise::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config: {message}")]
    #[diagnostic(code(taskwise::config::serialize))]
    Serialize { message: String },

    #[error("invalid value for {key}: \"{value}\"")]
    #[diagnostic(
        code(taskwise::config::invalid_env),
        help("Backend names are openai, anthropic, gemini or local; lists are comma separated.")
    )]
    InvalidEnv { key: &'static str, value: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

const OPENAI_PLACEHOLDER: &str = "your-openai-api-key-here";
const ANTHROPIC_PLACEHOLDER: &str = "your-anthropic-api-key-here";
const GOOGLE_PLACEHOLDER: &str = "your-google-api-key-here";

// ── Backend sections ───────────────────────────────────────────────────────

/// A hosted backend reached with an API key.
///
/// Blank `model` or `base_url` fall back to the backend's stock values when
/// the config is loaded.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RemoteBackendConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub base_url: String,
}

impl RemoteBackendConfig {
    pub fn openai() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-3.5-turbo".into(),
            base_url: "https://api.openai.com/v1".into(),
        }
    }

    pub fn anthropic() -> Self {
        Self {
            api_key: String::new(),
            model: "claude-3-sonnet-20240229".into(),
            base_url: "https://api.anthropic.com".into(),
        }
    }

    pub fn gemini() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-1.5-flash".into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
        }
    }

    fn fill_blanks_from(&mut self, stock: Self) {
        if self.model.trim().is_empty() {
            self.model = stock.model;
        }
        if self.base_url.trim().is_empty() {
            self.base_url = stock.base_url;
        }
    }

    /// A usable key: non-empty and not the shipped placeholder.
    fn has_key(&self, placeholder: &str) -> bool {
        let key = self.api_key.trim();
        !key.is_empty() && key != placeholder
    }
}

/// Self-hosted OpenAI-compatible server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalBackendConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_local_url")]
    pub base_url: String,
    #[serde(default = "default_local_model")]
    pub model: String,
}

fn default_local_url() -> String {
    "http://localhost:1234/v1".into()
}
fn default_local_model() -> String {
    "local-model".into()
}

impl Default for LocalBackendConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_local_url(),
            model: default_local_model(),
        }
    }
}

// ── Recency windows ────────────────────────────────────────────────────────

/// How many of the most recent contexts each operation looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecencyWindows {
    /// Contexts embedded in the priority prompt.
    #[serde(default = "default_priority_prompt")]
    pub priority_prompt: usize,
    /// Contexts averaged by the rule-based priority scorer.
    #[serde(default = "default_urgency_average")]
    pub urgency_average: usize,
    /// Contexts summarized in the suggestion prompt.
    #[serde(default = "default_suggestion_prompt")]
    pub suggestion_prompt: usize,
    /// Contexts a caller fetches before asking for suggestions.
    #[serde(default = "default_suggestion_source")]
    pub suggestion_source: usize,
    #[serde(default = "default_excerpt_chars")]
    pub prompt_excerpt_chars: usize,
}

fn default_priority_prompt() -> usize {
    3
}
fn default_urgency_average() -> usize {
    5
}
fn default_suggestion_prompt() -> usize {
    5
}
fn default_suggestion_source() -> usize {
    10
}
fn default_excerpt_chars() -> usize {
    100
}

impl Default for RecencyWindows {
    fn default() -> Self {
        Self {
            priority_prompt: default_priority_prompt(),
            urgency_average: default_urgency_average(),
            suggestion_prompt: default_suggestion_prompt(),
            suggestion_source: default_suggestion_source(),
            prompt_excerpt_chars: default_excerpt_chars(),
        }
    }
}

// ── EngineConfig ───────────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_provider")]
    pub default_provider: BackendKind,
    #[serde(default = "default_fallback_order")]
    pub fallback_order: Vec<BackendKind>,
    #[serde(default)]
    pub generation: GenerationParams,
    #[serde(default = "RemoteBackendConfig::openai")]
    pub openai: RemoteBackendConfig,
    #[serde(default = "RemoteBackendConfig::anthropic")]
    pub anthropic: RemoteBackendConfig,
    #[serde(default = "RemoteBackendConfig::gemini")]
    pub gemini: RemoteBackendConfig,
    #[serde(default)]
    pub local: LocalBackendConfig,
    #[serde(default)]
    pub windows: RecencyWindows,
}

fn default_provider() -> BackendKind {
    BackendKind::OpenAi
}
fn default_fallback_order() -> Vec<BackendKind> {
    vec![BackendKind::OpenAi, BackendKind::Gemini]
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            fallback_order: default_fallback_order(),
            generation: GenerationParams::default(),
            openai: RemoteBackendConfig::openai(),
            anthropic: RemoteBackendConfig::anthropic(),
            gemini: RemoteBackendConfig::gemini(),
            local: LocalBackendConfig::default(),
            windows: RecencyWindows::default(),
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse_with_path(&content, &path.display().to_string())
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Self::parse_with_path(content, "<string>")
    }

    fn parse_with_path(content: &str, path: &str) -> ConfigResult<Self> {
        let mut config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        config.openai.fill_blanks_from(RemoteBackendConfig::openai());
        config.anthropic.fill_blanks_from(RemoteBackendConfig::anthropic());
        config.gemini.fill_blanks_from(RemoteBackendConfig::gemini());
        Ok(config)
    }

    /// Save as pretty TOML, creating the parent directory.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = self.to_toml_string()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize {
            message: e.to_string(),
        })
    }

    /// Load `path` and overlay the process environment.
    pub fn resolve(path: &Path) -> TaskwiseResult<Self> {
        Self::resolve_with(path, |key| std::env::var(key).ok())
    }

    pub fn resolve_with<F>(path: &Path, lookup: F) -> TaskwiseResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::load(path)?;
        config.apply_env_from(lookup)?;
        Ok(config)
    }

    /// Overlay the process environment.
    pub fn apply_env(&mut self) -> ConfigResult<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`. Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.openai.api_key = key;
        }
        if let Some(key) = get("ANTHROPIC_API_KEY") {
            self.anthropic.api_key = key;
        }
        if let Some(key) = get("GOOGLE_API_KEY") {
            self.gemini.api_key = key;
        }
        if let Some(url) = get("LM_STUDIO_URL") {
            self.local.base_url = url;
            self.local.enabled = true;
        }
        if let Some(value) = get("DEFAULT_AI_PROVIDER") {
            self.default_provider = value.parse().map_err(|_| ConfigError::InvalidEnv {
                key: "DEFAULT_AI_PROVIDER",
                value: value.clone(),
            })?;
        }
        if let Some(value) = get("TASKWISE_FALLBACK_ORDER") {
            self.fallback_order = value
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.parse::<BackendKind>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| ConfigError::InvalidEnv {
                    key: "TASKWISE_FALLBACK_ORDER",
                    value: value.clone(),
                })?;
        }
        Ok(())
    }

    /// Fallback order with duplicates removed and the default provider first
    /// when it is listed.
    pub fn resolved_order(&self) -> Vec<BackendKind> {
        let mut order: Vec<BackendKind> = Vec::with_capacity(self.fallback_order.len());
        if self.fallback_order.contains(&self.default_provider) {
            order.push(self.default_provider);
        }
        for kind in &self.fallback_order {
            if !order.contains(kind) {
                order.push(*kind);
            }
        }
        order
    }

    /// Whether `kind` has what it needs to make a request.
    pub fn is_configured(&self, kind: BackendKind) -> bool {
        match kind {
            BackendKind::OpenAi => self.openai.has_key(OPENAI_PLACEHOLDER),
            BackendKind::Anthropic => self.anthropic.has_key(ANTHROPIC_PLACEHOLDER),
            BackendKind::Gemini => self.gemini.has_key(GOOGLE_PLACEHOLDER),
            BackendKind::Local => self.local.enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskwiseError;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_stock_values() {
        let config = EngineConfig::default();
        assert_eq!(config.default_provider, BackendKind::OpenAi);
        assert_eq!(config.fallback_order, vec![BackendKind::OpenAi, BackendKind::Gemini]);
        assert_eq!(config.generation.max_tokens, 500);
        assert_eq!(config.windows.priority_prompt, 3);
        assert_eq!(config.windows.urgency_average, 5);
        assert_eq!(config.windows.suggestion_source, 10);
        assert_eq!(config.local.base_url, "http://localhost:1234/v1");
        assert!(!config.local.enabled);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_backend_section_keeps_stock_model() {
        let config = EngineConfig::from_toml_str(
            r#"
            fallback_order = ["anthropic", "local"]

            [anthropic]
            api_key = "sk-ant-1"

            [windows]
            priority_prompt = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.anthropic.api_key, "sk-ant-1");
        assert_eq!(config.anthropic.model, "claude-3-sonnet-20240229");
        assert_eq!(config.anthropic.base_url, "https://api.anthropic.com");
        assert_eq!(config.windows.priority_prompt, 4);
        assert_eq!(config.windows.urgency_average, 5);
        assert_eq!(
            config.fallback_order,
            vec![BackendKind::Anthropic, BackendKind::Local]
        );
    }

    #[test]
    fn unknown_backend_is_parse_error() {
        let err = EngineConfig::from_toml_str(r#"fallback_order = ["mistral"]"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn placeholder_keys_are_not_configured() {
        let mut config = EngineConfig::default();
        config.openai.api_key = OPENAI_PLACEHOLDER.into();
        config.gemini.api_key = "   ".into();
        assert!(!config.is_configured(BackendKind::OpenAi));
        assert!(!config.is_configured(BackendKind::Gemini));

        config.openai.api_key = "sk-real".into();
        assert!(config.is_configured(BackendKind::OpenAi));
    }

    #[test]
    fn env_overlay_sets_keys_and_enables_local() {
        let mut config = EngineConfig::default();
        config
            .apply_env_from(env(&[
                ("OPENAI_API_KEY", "sk-env"),
                ("LM_STUDIO_URL", "http://10.0.0.5:1234/v1"),
                ("DEFAULT_AI_PROVIDER", "gemini"),
                ("TASKWISE_FALLBACK_ORDER", "openai, gemini ,local"),
            ]))
            .unwrap();
        assert_eq!(config.openai.api_key, "sk-env");
        assert!(config.local.enabled);
        assert_eq!(config.local.base_url, "http://10.0.0.5:1234/v1");
        assert_eq!(
            config.resolved_order(),
            vec![BackendKind::Gemini, BackendKind::OpenAi, BackendKind::Local]
        );
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = EngineConfig::default();
        config.openai.api_key = "sk-file".into();
        config.apply_env_from(env(&[("OPENAI_API_KEY", "")])).unwrap();
        assert_eq!(config.openai.api_key, "sk-file");
    }

    #[test]
    fn bad_env_provider_is_reported() {
        let mut config = EngineConfig::default();
        let err = config
            .apply_env_from(env(&[("DEFAULT_AI_PROVIDER", "skynet")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { key: "DEFAULT_AI_PROVIDER", .. }));
    }

    #[test]
    fn default_provider_outside_order_is_ignored() {
        let config = EngineConfig {
            default_provider: BackendKind::Anthropic,
            fallback_order: vec![BackendKind::Gemini, BackendKind::Gemini, BackendKind::OpenAi],
            ..Default::default()
        };
        assert_eq!(
            config.resolved_order(),
            vec![BackendKind::Gemini, BackendKind::OpenAi]
        );
    }

    #[test]
    fn toml_round_trip_preserves_keys() {
        let mut config = EngineConfig::default();
        config.gemini.api_key = "g-1".into();
        let text = config.to_toml_string().unwrap();
        assert_eq!(EngineConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut config = EngineConfig::default();
        config.local.enabled = true;
        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn resolve_overlays_env_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[openai]\napi_key = \"sk-file\"\n").unwrap();
        let config =
            EngineConfig::resolve_with(&path, env(&[("GEMINI_API_KEY", "g-env")])).unwrap();
        assert_eq!(config.openai.api_key, "sk-file");
        assert_eq!(config.gemini.api_key, "g-env");
    }

    #[test]
    fn resolve_surfaces_parse_error_as_taskwise_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "fallback_order = [").unwrap();
        let err = EngineConfig::resolve_with(&path, env(&[])).unwrap_err();
        assert!(matches!(err, TaskwiseError::Config(ConfigError::Parse { .. })));
    }

    #[test]
    fn resolve_surfaces_bad_env_as_taskwise_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::resolve_with(
            &dir.path().join("absent.toml"),
            env(&[("DEFAULT_AI_PROVIDER", "skynet")]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TaskwiseError::Config(ConfigError::InvalidEnv { key: "DEFAULT_AI_PROVIDER", .. })
        ));
    }
}
