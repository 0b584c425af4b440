//! JSON-file workspace: contexts, tasks, categories and analytics snapshots.
//!
//! The whole workspace is one document at `<data_dir>/workspace.json`, read
//! on open and rewritten on [`Workspace::save`]. Contexts are kept
//! most-recent-first so the engine's recency windows are plain prefixes.
//! Context insights are computed by the caller once, before insertion, and
//! never recomputed.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{InputError, StoreError};
use crate::model::{
    AnalyticsSnapshot, Category, ContextEntry, ContextInsights, SourceType, Task, TaskStatus,
};
use crate::priority::Priority;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    next_context_id: u64,
    #[serde(default)]
    next_task_id: u64,
    /// Most recent first.
    #[serde(default)]
    contexts: Vec<ContextEntry>,
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default)]
    categories: Vec<Category>,
    /// Oldest first.
    #[serde(default)]
    snapshots: Vec<AnalyticsSnapshot>,
}

/// An open workspace file.
#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    doc: Document,
}

impl Workspace {
    /// Open `path`, or start empty if it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no workspace file, starting empty");
            return Ok(Self {
                path,
                doc: Document::default(),
            });
        }

        let content = std::fs::read_to_string(&path).map_err(|e| StoreError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        let doc: Document = serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!(
            path = %path.display(),
            contexts = doc.contexts.len(),
            tasks = doc.tasks.len(),
            "workspace loaded"
        );
        Ok(Self { path, doc })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the workspace back to disk, via a temporary file and rename.
    pub fn save(&self) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(&self.doc).map_err(|e| StoreError::Encode {
            message: e.to_string(),
        })?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| StoreError::Write {
            path: tmp.display().to_string(),
            source: e,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| StoreError::Write {
            path: self.path.display().to_string(),
            source: e,
        })
    }

    // ── Contexts ───────────────────────────────────────────────────────────

    /// Store a context with its already-computed insights.
    pub fn add_context(
        &mut self,
        content: impl Into<String>,
        source_type: SourceType,
        insights: ContextInsights,
        now: DateTime<Utc>,
    ) -> &ContextEntry {
        self.doc.next_context_id += 1;
        let entry = ContextEntry {
            id: self.doc.next_context_id,
            content: content.into(),
            source_type,
            processed_insights: insights,
            created_at: now,
        };
        self.doc.contexts.insert(0, entry);
        &self.doc.contexts[0]
    }

    /// All contexts, most recent first.
    pub fn contexts(&self) -> &[ContextEntry] {
        &self.doc.contexts
    }

    /// The `k` most recent contexts.
    pub fn recent_contexts(&self, k: usize) -> &[ContextEntry] {
        &self.doc.contexts[..self.doc.contexts.len().min(k)]
    }

    // ── Tasks ──────────────────────────────────────────────────────────────

    /// Store `task` under a fresh id and return the id.
    ///
    /// The incoming `id` is ignored. A category name bumps (or creates) the
    /// matching category's usage counter.
    pub fn add_task(&mut self, mut task: Task) -> u64 {
        self.doc.next_task_id += 1;
        task.id = self.doc.next_task_id;
        if let Some(name) = task.category.as_deref() {
            self.touch_category(name);
        }
        let id = task.id;
        self.doc.tasks.push(task);
        id
    }

    pub fn tasks(&self) -> &[Task] {
        &self.doc.tasks
    }

    pub fn task(&self, id: u64) -> Option<&Task> {
        self.doc.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: u64) -> Result<&mut Task, InputError> {
        self.doc
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(InputError::TaskNotFound { id })
    }

    pub fn set_status(&mut self, id: u64, status: TaskStatus) -> Result<(), InputError> {
        self.task_mut(id)?.status = status;
        Ok(())
    }

    /// Tasks whose deadline has passed and that are not completed.
    pub fn overdue_tasks(&self, now: DateTime<Utc>) -> Vec<&Task> {
        self.doc.tasks.iter().filter(|t| t.is_overdue(now)).collect()
    }

    /// All tasks, highest score first, then earliest deadline. Tasks without
    /// a deadline sort after those with one.
    pub fn tasks_by_priority(&self) -> Vec<&Task> {
        let mut sorted: Vec<&Task> = self.doc.tasks.iter().collect();
        sorted.sort_by(|a, b| by_priority(a, b));
        sorted
    }

    /// Open tasks labelled urgent, in priority order.
    pub fn urgent_tasks(&self) -> Vec<&Task> {
        self.tasks_by_priority()
            .into_iter()
            .filter(|t| t.priority == Priority::Urgent && !t.is_completed())
            .collect()
    }

    // ── Categories ─────────────────────────────────────────────────────────

    pub fn categories(&self) -> &[Category] {
        &self.doc.categories
    }

    fn touch_category(&mut self, name: &str) {
        match self
            .doc
            .categories
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
        {
            Some(category) => category.usage_frequency += 1,
            None => {
                let mut category = Category::new(name);
                category.usage_frequency = 1;
                self.doc.categories.push(category);
            }
        }
    }

    /// The `n` most used categories. Ties keep creation order.
    pub fn popular_categories(&self, n: usize) -> Vec<&Category> {
        let mut sorted: Vec<&Category> = self.doc.categories.iter().collect();
        sorted.sort_by(|a, b| b.usage_frequency.cmp(&a.usage_frequency));
        sorted.truncate(n);
        sorted
    }

    // ── Snapshots ──────────────────────────────────────────────────────────

    pub fn record_snapshot(&mut self, snapshot: AnalyticsSnapshot) {
        self.doc.snapshots.push(snapshot);
    }

    pub fn latest_snapshot(&self) -> Option<&AnalyticsSnapshot> {
        self.doc.snapshots.iter().max_by_key(|s| s.generated_at)
    }
}

fn by_priority(a: &Task, b: &Task) -> Ordering {
    b.priority_score
        .total_cmp(&a.priority_score)
        .then_with(|| match (a.deadline, b.deadline) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sentiment;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap()
    }

    fn insights(urgency: f64) -> ContextInsights {
        ContextInsights {
            keywords: vec!["standup".into()],
            sentiment: Sentiment::Neutral,
            urgency,
            extracted_tasks: Vec::new(),
            insights: String::new(),
        }
    }

    fn task(title: &str, category: Option<&str>, priority: Priority) -> Task {
        Task {
            id: 0,
            title: title.into(),
            description: String::new(),
            deadline: None,
            priority,
            priority_score: 0.5,
            status: TaskStatus::Todo,
            category: category.map(str::to_string),
            created_at: now(),
            ai_suggestions: None,
        }
    }

    #[test]
    fn contexts_are_most_recent_first() {
        let mut ws = Workspace::open(PathBuf::from("/nonexistent/workspace.json")).unwrap();
        ws.add_context("first", SourceType::Note, insights(0.1), now());
        ws.add_context("second", SourceType::Email, insights(0.2), now());
        ws.add_context("third", SourceType::Message, insights(0.3), now());

        let recent: Vec<&str> = ws.recent_contexts(2).iter().map(|c| c.content.as_str()).collect();
        assert_eq!(recent, vec!["third", "second"]);
        assert_eq!(ws.recent_contexts(10).len(), 3);
        assert_eq!(ws.contexts()[0].id, 3);
    }

    #[test]
    fn task_ids_are_assigned_sequentially() {
        let mut ws = Workspace::open(PathBuf::from("/nonexistent/workspace.json")).unwrap();
        let a = ws.add_task(task("a", None, Priority::Low));
        let b = ws.add_task(task("b", None, Priority::Low));
        assert_eq!((a, b), (1, 2));
        assert_eq!(ws.task(2).map(|t| t.title.as_str()), Some("b"));
    }

    #[test]
    fn set_status_on_missing_task_fails() {
        let mut ws = Workspace::open(PathBuf::from("/nonexistent/workspace.json")).unwrap();
        assert!(matches!(
            ws.set_status(9, TaskStatus::Completed),
            Err(InputError::TaskNotFound { id: 9 })
        ));
    }

    #[test]
    fn category_usage_and_popularity() {
        let mut ws = Workspace::open(PathBuf::from("/nonexistent/workspace.json")).unwrap();
        ws.add_task(task("a", Some("Health"), Priority::Low));
        ws.add_task(task("b", Some("Work"), Priority::Low));
        ws.add_task(task("c", Some("work"), Priority::Low));
        ws.add_task(task("d", Some("Learning"), Priority::Low));

        assert_eq!(ws.categories().len(), 3);
        let popular: Vec<&str> = ws.popular_categories(2).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(popular, vec!["Work", "Health"]);
    }

    #[test]
    fn urgent_and_overdue_views() {
        let mut ws = Workspace::open(PathBuf::from("/nonexistent/workspace.json")).unwrap();
        let mut late = task("late", None, Priority::Urgent);
        late.deadline = Some(now() - Duration::hours(3));
        let late_id = ws.add_task(late);
        ws.add_task(task("calm", None, Priority::Medium));

        assert_eq!(ws.overdue_tasks(now()).len(), 1);
        assert_eq!(ws.urgent_tasks().len(), 1);

        ws.set_status(late_id, TaskStatus::Completed).unwrap();
        assert!(ws.overdue_tasks(now()).is_empty());
        assert!(ws.urgent_tasks().is_empty());
    }

    #[test]
    fn priority_order_is_score_then_deadline() {
        let mut ws = Workspace::open(PathBuf::from("/nonexistent/workspace.json")).unwrap();
        let mut low = task("low", None, Priority::Low);
        low.priority_score = 0.2;
        let mut undated = task("undated", None, Priority::High);
        undated.priority_score = 0.7;
        let mut later = task("later", None, Priority::High);
        later.priority_score = 0.7;
        later.deadline = Some(now() + Duration::days(5));
        let mut sooner = task("sooner", None, Priority::High);
        sooner.priority_score = 0.7;
        sooner.deadline = Some(now() + Duration::days(1));
        let mut top = task("top", None, Priority::Urgent);
        top.priority_score = 0.95;
        for t in [low, undated, later, sooner, top] {
            ws.add_task(t);
        }

        let titles: Vec<&str> = ws.tasks_by_priority().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["top", "sooner", "later", "undated", "low"]);
        // Insertion order is untouched.
        assert_eq!(ws.tasks()[0].title, "low");
    }

    #[test]
    fn urgent_tasks_follow_priority_order() {
        let mut ws = Workspace::open(PathBuf::from("/nonexistent/workspace.json")).unwrap();
        let mut a = task("a", None, Priority::Urgent);
        a.priority_score = 0.85;
        let mut b = task("b", None, Priority::Urgent);
        b.priority_score = 1.0;
        ws.add_task(a);
        ws.add_task(b);
        let titles: Vec<&str> = ws.urgent_tasks().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a"]);
    }

    #[test]
    fn latest_snapshot_is_newest() {
        let mut ws = Workspace::open(PathBuf::from("/nonexistent/workspace.json")).unwrap();
        assert!(ws.latest_snapshot().is_none());
        let older = crate::analytics::snapshot(&[], 0, now() - Duration::days(1));
        let newer = crate::analytics::snapshot(&[], 5, now());
        ws.record_snapshot(newer.clone());
        ws.record_snapshot(older);
        assert_eq!(ws.latest_snapshot(), Some(&newer));
    }

    #[test]
    fn save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/workspace.json");

        let mut ws = Workspace::open(&path).unwrap();
        ws.add_context("note", SourceType::Note, insights(0.4), now());
        ws.add_task(task("persisted", Some("Work"), Priority::High));
        ws.save().unwrap();

        let reopened = Workspace::open(&path).unwrap();
        assert_eq!(reopened.contexts().len(), 1);
        assert_eq!(reopened.tasks()[0].title, "persisted");
        assert_eq!(reopened.categories()[0].usage_frequency, 1);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workspace.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Workspace::open(&path),
            Err(StoreError::Corrupt { .. })
        ));
    }
}
