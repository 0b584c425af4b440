//! The insight engine: the four operations built on the gateway, the parser
//! and the heuristics.
//!
//! Every operation is total. A provider reply is used only when it decodes
//! strictly into the operation's schema; anything else (no backend, a failed
//! call, prose, a missing key) lands on the deterministic heuristic path.
//! Out-of-range numbers in an otherwise valid reply are clamped.

use std::sync::Arc;

use crate::analytics;
use crate::clock::{Clock, SystemClock};
use crate::config::{EngineConfig, RecencyWindows};
use crate::heuristic;
use crate::model::{
    AiSuggestionBundle, AnalyticsSnapshot, ContextEntry, ContextInsights, InsightSummary,
    PriorityAssessment, SourceType, Task, TaskDraft, TaskStats,
};
use crate::parse::{self, PriorityReply, ResponseSchema};
use crate::priority::{Priority, clamp_score};
use crate::prompt;
use crate::provider::{GenerationSource, ProviderGateway};

/// Stateless apart from read-only handles fixed at construction, so one
/// engine can serve concurrent callers.
pub struct InsightEngine {
    gateway: ProviderGateway,
    clock: Arc<dyn Clock>,
    windows: RecencyWindows,
}

impl InsightEngine {
    pub fn new(gateway: ProviderGateway) -> Self {
        Self {
            gateway,
            clock: Arc::new(SystemClock),
            windows: RecencyWindows::default(),
        }
    }

    /// Gateway and windows from configuration, system clock.
    pub fn from_config(config: &EngineConfig) -> Self {
        let engine = Self::new(ProviderGateway::from_config(config)).with_windows(config.windows);
        tracing::info!(
            backends = ?engine.gateway.backend_kinds(),
            "insight engine ready"
        );
        engine
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn with_windows(mut self, windows: RecencyWindows) -> Self {
        self.windows = windows;
        self
    }

    pub fn windows(&self) -> &RecencyWindows {
        &self.windows
    }

    pub fn gateway(&self) -> &ProviderGateway {
        &self.gateway
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Send `prompt` and decode the reply as `T`. `None` means "use the
    /// heuristic".
    fn ask<T: ResponseSchema>(&self, prompt: &str) -> Option<T> {
        let reply = self.gateway.generate(prompt);
        if reply.source == GenerationSource::Simulated {
            tracing::debug!(schema = T::NAME, "no backend answered, using heuristics");
            return None;
        }
        match parse::decode::<T>(&reply.text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(schema = T::NAME, source = ?reply.source, error = %e, "unusable reply, using heuristics");
                None
            }
        }
    }

    fn recent(contexts: &[ContextEntry], window: usize) -> &[ContextEntry] {
        &contexts[..contexts.len().min(window)]
    }

    // ── Operations ─────────────────────────────────────────────────────────

    /// Keywords, sentiment, urgency, extracted tasks and a one-line insight
    /// for a piece of raw context.
    pub fn process_context(&self, content: &str, source_type: SourceType) -> ContextInsights {
        let prompt = prompt::context_analysis(content, source_type);
        match self.ask::<ContextInsights>(&prompt) {
            Some(mut insights) => {
                let clamped = clamp_score(insights.urgency);
                if clamped != insights.urgency {
                    tracing::debug!(raw = insights.urgency, clamped, "urgency out of range");
                }
                insights.urgency = clamped;
                insights
            }
            None => heuristic::basic_context_analysis(content, source_type),
        }
    }

    /// Deadline, category, priority and enhanced description for a new task.
    ///
    /// `contexts` must be most-recent-first; only the first
    /// `windows.suggestion_prompt` entries reach the prompt.
    pub fn get_task_suggestions(
        &self,
        title: &str,
        description: &str,
        contexts: &[ContextEntry],
    ) -> AiSuggestionBundle {
        let recent = Self::recent(contexts, self.windows.suggestion_prompt);
        let prompt = prompt::task_suggestions(
            title,
            description,
            recent,
            self.windows.prompt_excerpt_chars,
        );
        match self.ask::<AiSuggestionBundle>(&prompt) {
            Some(mut bundle) => {
                bundle.priority_score = clamp_score(bundle.priority_score);
                bundle
            }
            None => heuristic::basic_task_suggestions(title, description, self.clock.now()),
        }
    }

    /// Priority score in `[0, 1]` for a task.
    pub fn calculate_priority_score(&self, task: &TaskDraft, contexts: &[ContextEntry]) -> f64 {
        self.score_with_reasoning(task, contexts).0
    }

    /// Score, quantized label and the reasoning behind them.
    pub fn assess_priority(&self, task: &TaskDraft, contexts: &[ContextEntry]) -> PriorityAssessment {
        let (priority_score, reasoning) = self.score_with_reasoning(task, contexts);
        PriorityAssessment {
            priority_score,
            priority: Priority::from_score(priority_score),
            reasoning,
        }
    }

    fn score_with_reasoning(&self, task: &TaskDraft, contexts: &[ContextEntry]) -> (f64, String) {
        let recent = Self::recent(contexts, self.windows.priority_prompt);
        let prompt = prompt::priority_score(task, recent, self.windows.prompt_excerpt_chars);
        if let Some(reply) = self.ask::<PriorityReply>(&prompt) {
            return (clamp_score(reply.priority_score), reply.reasoning);
        }

        let score = heuristic::rule_based_priority(
            task,
            contexts,
            self.windows.urgency_average,
            self.clock.now(),
        );
        let reasoning = format!(
            "Rule-based score from deadline proximity, recent context urgency and urgency keywords ({} priority).",
            Priority::from_score(score)
        );
        (score, reasoning)
    }

    /// Productivity, burnout, focus areas and recommendations.
    pub fn generate_insights(&self, tasks: &[Task], contexts: &[ContextEntry]) -> InsightSummary {
        analytics::generate_insights(tasks, contexts.len())
    }

    pub fn task_stats(&self, tasks: &[Task]) -> TaskStats {
        analytics::task_stats(tasks, self.clock.now())
    }

    pub fn snapshot(&self, tasks: &[Task], contexts: &[ContextEntry]) -> AnalyticsSnapshot {
        analytics::snapshot(tasks, contexts.len(), self.clock.now())
    }
}

impl std::fmt::Debug for InsightEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsightEngine")
            .field("gateway", &self.gateway)
            .field("windows", &self.windows)
            .finish()
    }
}
