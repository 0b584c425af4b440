//! Records consumed and produced by the insight engine.
//!
//! Persistence of these records belongs to the caller (see [`crate::store`]);
//! the engine only reads them and returns fresh values.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::clock;
use crate::error::InputError;
use crate::priority::Priority;

// ── SourceType ─────────────────────────────────────────────────────────────

/// Where a context entry came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Email,
    Message,
    #[default]
    Note,
    Other,
}

impl SourceType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Message => "message",
            Self::Note => "note",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SourceType {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "email" => Ok(Self::Email),
            "message" => Ok(Self::Message),
            "note" => Ok(Self::Note),
            "other" => Ok(Self::Other),
            _ => Err(InputError::SourceType {
                value: s.to_string(),
            }),
        }
    }
}

// ── Sentiment ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::Neutral => write!(f, "neutral"),
            Self::Negative => write!(f, "negative"),
        }
    }
}

// ── ContextInsights ────────────────────────────────────────────────────────

/// Structured signals derived from one piece of context text.
///
/// Every field is required when decoding a provider reply; a reply missing
/// any of them is treated as malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextInsights {
    pub keywords: Vec<String>,
    pub sentiment: Sentiment,
    /// Urgency in `[0, 1]`.
    pub urgency: f64,
    pub extracted_tasks: Vec<String>,
    pub insights: String,
}

// ── ContextEntry ───────────────────────────────────────────────────────────

/// A note, email or message supplying situational signal.
///
/// `processed_insights` is computed once when the entry is created and is not
/// recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub id: u64,
    pub content: String,
    pub source_type: SourceType,
    pub processed_insights: ContextInsights,
    pub created_at: DateTime<Utc>,
}

impl ContextEntry {
    /// Urgency recorded for this entry.
    pub fn urgency(&self) -> f64 {
        self.processed_insights.urgency
    }

    /// Sentiment recorded for this entry.
    pub fn sentiment(&self) -> Sentiment {
        self.processed_insights.sentiment
    }
}

// ── Task ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "todo")]
    Todo,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "completed")]
    Completed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Todo => write!(f, "todo"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl FromStr for TaskStatus {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(Self::Todo),
            "in-progress" | "in_progress" => Ok(Self::InProgress),
            "completed" | "done" => Ok(Self::Completed),
            _ => Err(InputError::Status {
                value: s.to_string(),
            }),
        }
    }
}

/// A task as stored and fed to analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    /// Derived label of `priority_score`.
    pub priority: Priority,
    pub priority_score: f64,
    #[serde(default)]
    pub status: TaskStatus,
    /// Category name, if the task has one.
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Suggestions returned when the task was created, if requested.
    #[serde(default)]
    pub ai_suggestions: Option<AiSuggestionBundle>,
}

impl Task {
    /// Deadline passed and the task is not completed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match self.deadline {
            Some(deadline) => self.status != TaskStatus::Completed && now > deadline,
            None => false,
        }
    }

    /// Whole days until the deadline, if one is set.
    pub fn days_until_deadline(&self, now: DateTime<Utc>) -> Option<i64> {
        self.deadline.map(|d| clock::days_until(d, now))
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// The fields of a task the priority operations look at.
///
/// `deadline` is kept raw: a value that does not parse simply earns no
/// deadline bonus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub deadline: Option<String>,
}

impl TaskDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: impl Into<String>) -> Self {
        self.deadline = Some(deadline.into());
        self
    }

    /// Title must be non-blank.
    pub fn validate(&self) -> Result<(), InputError> {
        if self.title.trim().is_empty() {
            return Err(InputError::Missing { field: "title" });
        }
        Ok(())
    }

    /// The deadline, if present and parseable.
    pub fn parsed_deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline.as_deref().and_then(clock::parse_deadline)
    }
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            deadline: task.deadline.map(|d| d.to_rfc3339()),
        }
    }
}

/// A category with usage tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default = "default_category_color")]
    pub color: String,
    #[serde(default)]
    pub usage_frequency: u64,
}

fn default_category_color() -> String {
    "#3b82f6".into()
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: default_category_color(),
            usage_frequency: 0,
        }
    }
}

// ── Engine outputs ─────────────────────────────────────────────────────────

/// Suggestions for a new or existing task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiSuggestionBundle {
    /// Serialized as `YYYY-MM-DD`.
    pub suggested_deadline: NaiveDate,
    pub suggested_category: String,
    pub enhanced_description: String,
    pub reasoning: String,
    pub priority_score: f64,
    pub suggested_priority: Priority,
    pub extracted_tasks: Vec<String>,
}

/// Priority score with its label and a short justification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityAssessment {
    pub priority_score: f64,
    pub priority: Priority,
    pub reasoning: String,
}

/// Fleet-level productivity snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightSummary {
    /// Completed / total, as a percentage.
    pub productivity: f64,
    /// Urgent / total, as a percentage.
    pub burnout: f64,
    /// At most three category names, busiest first.
    #[serde(alias = "focus")]
    pub focus_areas: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Counters over a task collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    pub overdue_tasks: usize,
    pub urgent_tasks: usize,
    pub productivity_score: f64,
    pub burnout_risk: f64,
}

/// An [`InsightSummary`] frozen at a point in time, with the counts it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    pub summary: InsightSummary,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub urgent_tasks: usize,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn task(status: TaskStatus, deadline: Option<&str>) -> Task {
        Task {
            id: 1,
            title: "Ship release".into(),
            description: String::new(),
            deadline: deadline.and_then(clock::parse_deadline),
            priority: Priority::Medium,
            priority_score: 0.5,
            status,
            category: None,
            created_at: Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap(),
            ai_suggestions: None,
        }
    }

    #[test]
    fn source_type_parses_case_insensitively() {
        assert_eq!("Email".parse::<SourceType>().unwrap(), SourceType::Email);
        assert_eq!(" note ".parse::<SourceType>().unwrap(), SourceType::Note);
        assert!(matches!(
            "fax".parse::<SourceType>(),
            Err(InputError::SourceType { .. })
        ));
    }

    #[test]
    fn status_uses_hyphenated_wire_label() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        assert_eq!("done".parse::<TaskStatus>().unwrap(), TaskStatus::Completed);
    }

    #[test]
    fn overdue_requires_open_task_past_deadline() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        assert!(task(TaskStatus::Todo, Some("2026-10-18")).is_overdue(now));
        assert!(!task(TaskStatus::Completed, Some("2026-10-18")).is_overdue(now));
        assert!(!task(TaskStatus::Todo, Some("2026-10-25")).is_overdue(now));
        assert!(!task(TaskStatus::Todo, None).is_overdue(now));
    }

    #[test]
    fn days_until_deadline_is_none_without_deadline() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 0, 0, 0).unwrap();
        assert_eq!(task(TaskStatus::Todo, None).days_until_deadline(now), None);
        assert_eq!(
            task(TaskStatus::Todo, Some("2026-10-24")).days_until_deadline(now),
            Some(5)
        );
    }

    #[test]
    fn task_hours_overdue_counts_as_a_day() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 3, 0, 0).unwrap();
        let late = task(TaskStatus::Todo, Some("2026-10-19"));
        assert!(late.is_overdue(now));
        assert_eq!(late.days_until_deadline(now), Some(-1));
    }

    #[test]
    fn draft_validation_rejects_blank_title() {
        assert!(TaskDraft::new("  ", "desc").validate().is_err());
        assert!(TaskDraft::new("Write tests", "").validate().is_ok());
    }

    #[test]
    fn insight_summary_accepts_legacy_focus_key() {
        let json = r#"{"productivity":50.0,"burnout":0.0,"focus":["Work"],"recommendations":[]}"#;
        let summary: InsightSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.focus_areas, vec!["Work".to_string()]);
    }

    #[test]
    fn suggestion_deadline_serializes_as_plain_date() {
        let bundle = AiSuggestionBundle {
            suggested_deadline: NaiveDate::from_ymd_opt(2026, 10, 26).unwrap(),
            suggested_category: "Work".into(),
            enhanced_description: String::new(),
            reasoning: String::new(),
            priority_score: 0.5,
            suggested_priority: Priority::Medium,
            extracted_tasks: Vec::new(),
        };
        let json = serde_json::to_value(&bundle).unwrap();
        assert_eq!(json["suggested_deadline"], "2026-10-26");
    }
}
