//! Fleet-level analytics over task and context collections.
//!
//! Pure arithmetic: no provider calls, no clock other than the `now` passed
//! in. Every result is recomputed from the full collection on each call.

use chrono::{DateTime, Utc};

use crate::model::{AnalyticsSnapshot, InsightSummary, Task, TaskStats, TaskStatus};
use crate::priority::Priority;

/// Number of categories reported as focus areas.
pub const FOCUS_AREA_LIMIT: usize = 3;

/// Below this productivity percentage, suggest splitting work up.
pub const LOW_PRODUCTIVITY_PERCENT: f64 = 50.0;

/// Above this burnout percentage, suggest delegating.
pub const HIGH_BURNOUT_PERCENT: f64 = 70.0;

/// Fewer contexts than this and the user is asked to add more.
pub const MIN_CONTEXTS: usize = 3;

pub const BREAK_DOWN_ADVICE: &str =
    "Consider breaking down large tasks into smaller, manageable chunks";
pub const DELEGATE_ADVICE: &str =
    "You have many urgent tasks. Try to prioritize and delegate when possible";
pub const MORE_CONTEXT_ADVICE: &str = "Adding more daily context will improve AI suggestions";
pub const CONTEXT_HELPING: &str = "Your context input is helping improve task intelligence";

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

fn completed_count(tasks: &[Task]) -> usize {
    tasks.iter().filter(|t| t.is_completed()).count()
}

fn urgent_count(tasks: &[Task]) -> usize {
    tasks.iter().filter(|t| t.priority == Priority::Urgent).count()
}

/// Completed tasks as a percentage of all tasks.
pub fn productivity(tasks: &[Task]) -> f64 {
    percent(completed_count(tasks), tasks.len())
}

/// Urgent tasks as a percentage of all tasks.
pub fn burnout(tasks: &[Task]) -> f64 {
    percent(urgent_count(tasks), tasks.len())
}

/// The busiest categories, most tasks first. Ties keep first-seen order.
/// Uncategorized tasks are not counted.
pub fn focus_areas(tasks: &[Task], limit: usize) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for name in tasks.iter().filter_map(|t| t.category.as_deref()) {
        match counts.iter_mut().find(|(seen, _)| *seen == name) {
            Some((_, n)) => *n += 1,
            None => counts.push((name, 1)),
        }
    }
    // Stable sort keeps first-seen order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(limit)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Advice strings, in rule order. Rules accumulate.
pub fn recommendations(productivity: f64, burnout: f64, context_count: usize) -> Vec<String> {
    let mut out = Vec::new();
    if productivity < LOW_PRODUCTIVITY_PERCENT {
        out.push(BREAK_DOWN_ADVICE.to_string());
    }
    if burnout > HIGH_BURNOUT_PERCENT {
        out.push(DELEGATE_ADVICE.to_string());
    }
    if context_count < MIN_CONTEXTS {
        out.push(MORE_CONTEXT_ADVICE.to_string());
    } else {
        out.push(CONTEXT_HELPING.to_string());
    }
    out
}

/// Productivity, burnout, focus areas and recommendations.
///
/// Only the number of contexts matters here, not their content.
pub fn generate_insights(tasks: &[Task], context_count: usize) -> InsightSummary {
    let productivity = productivity(tasks);
    let burnout = burnout(tasks);
    InsightSummary {
        productivity,
        burnout,
        focus_areas: focus_areas(tasks, FOCUS_AREA_LIMIT),
        recommendations: recommendations(productivity, burnout, context_count),
    }
}

pub fn task_stats(tasks: &[Task], now: DateTime<Utc>) -> TaskStats {
    TaskStats {
        total_tasks: tasks.len(),
        completed_tasks: completed_count(tasks),
        in_progress_tasks: tasks
            .iter()
            .filter(|t| t.status == TaskStatus::InProgress)
            .count(),
        overdue_tasks: tasks.iter().filter(|t| t.is_overdue(now)).count(),
        urgent_tasks: urgent_count(tasks),
        productivity_score: productivity(tasks),
        burnout_risk: burnout(tasks),
    }
}

/// Freeze an insight summary together with the counts behind it.
pub fn snapshot(tasks: &[Task], context_count: usize, now: DateTime<Utc>) -> AnalyticsSnapshot {
    AnalyticsSnapshot {
        summary: generate_insights(tasks, context_count),
        total_tasks: tasks.len(),
        completed_tasks: completed_count(tasks),
        urgent_tasks: urgent_count(tasks),
        generated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 0, 0).unwrap()
    }

    fn task(id: u64, category: &str, status: TaskStatus, priority: Priority) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            description: String::new(),
            deadline: None,
            priority,
            priority_score: 0.5,
            status,
            category: Some(category.to_string()),
            created_at: now(),
            ai_suggestions: None,
        }
    }

    /// 10 tasks: 6 completed, 2 urgent, categories Home×3, Work×4, Study×3.
    fn fleet() -> Vec<Task> {
        let layout = [
            ("Home", TaskStatus::Completed, Priority::Urgent),
            ("Work", TaskStatus::Completed, Priority::Medium),
            ("Study", TaskStatus::Completed, Priority::Low),
            ("Work", TaskStatus::Completed, Priority::High),
            ("Home", TaskStatus::Completed, Priority::Medium),
            ("Study", TaskStatus::Completed, Priority::Low),
            ("Work", TaskStatus::Todo, Priority::Urgent),
            ("Home", TaskStatus::InProgress, Priority::Medium),
            ("Study", TaskStatus::Todo, Priority::Medium),
            ("Work", TaskStatus::Todo, Priority::Low),
        ];
        layout
            .iter()
            .enumerate()
            .map(|(i, (cat, status, prio))| task(i as u64 + 1, cat, *status, *prio))
            .collect()
    }

    #[test]
    fn ten_task_fleet() {
        let summary = generate_insights(&fleet(), 4);
        assert_eq!(summary.productivity, 60.0);
        assert_eq!(summary.burnout, 20.0);
        assert_eq!(summary.focus_areas, vec!["Work", "Home", "Study"]);
        assert_eq!(summary.recommendations, vec![CONTEXT_HELPING.to_string()]);
    }

    #[test]
    fn empty_collections() {
        let summary = generate_insights(&[], 0);
        assert_eq!(summary.productivity, 0.0);
        assert_eq!(summary.burnout, 0.0);
        assert!(summary.focus_areas.is_empty());
        assert_eq!(
            summary.recommendations,
            vec![BREAK_DOWN_ADVICE.to_string(), MORE_CONTEXT_ADVICE.to_string()]
        );
    }

    #[test]
    fn recommendations_accumulate_in_rule_order() {
        assert_eq!(
            recommendations(10.0, 90.0, 1),
            vec![BREAK_DOWN_ADVICE, DELEGATE_ADVICE, MORE_CONTEXT_ADVICE]
        );
        assert_eq!(recommendations(50.0, 70.0, 3), vec![CONTEXT_HELPING]);
    }

    #[test]
    fn focus_areas_cap_and_skip_uncategorized() {
        let mut tasks = fleet();
        tasks.push(task(11, "Errands", TaskStatus::Todo, Priority::Low));
        tasks[0].category = None;
        // Home drops to 2, Errands has 1.
        assert_eq!(focus_areas(&tasks, 3), vec!["Work", "Study", "Home"]);
        assert_eq!(focus_areas(&tasks, 1), vec!["Work"]);
    }

    #[test]
    fn stats_count_overdue_and_in_progress() {
        let mut tasks = fleet();
        tasks[6].deadline = Some(now() - chrono::Duration::days(2));
        tasks[0].deadline = Some(now() - chrono::Duration::days(2));
        let stats = task_stats(&tasks, now());
        assert_eq!(stats.total_tasks, 10);
        assert_eq!(stats.completed_tasks, 6);
        assert_eq!(stats.in_progress_tasks, 1);
        // Completed tasks are never overdue.
        assert_eq!(stats.overdue_tasks, 1);
        assert_eq!(stats.urgent_tasks, 2);
        assert_eq!(stats.productivity_score, 60.0);
    }

    #[test]
    fn snapshot_carries_counts_and_time() {
        let snap = snapshot(&fleet(), 0, now());
        assert_eq!(snap.total_tasks, 10);
        assert_eq!(snap.completed_tasks, 6);
        assert_eq!(snap.urgent_tasks, 2);
        assert_eq!(snap.generated_at, now());
        assert_eq!(snap.summary.recommendations, vec![MORE_CONTEXT_ADVICE.to_string()]);
    }
}
