//! Deterministic keyword heuristics: the fallback under every insight operation.
//!
//! Nothing here performs I/O or can fail. Each function is a pure function of
//! its text inputs (plus an explicit "now" where a date is produced), so the
//! engine can always answer even with no provider configured.

use chrono::{DateTime, Duration, Utc};

use crate::clock;
use crate::model::{AiSuggestionBundle, ContextEntry, ContextInsights, Sentiment, SourceType, TaskDraft};
use crate::priority::{Priority, clamp_score};

// ── Word tables ────────────────────────────────────────────────────────────

/// Words counted toward positive sentiment.
pub const POSITIVE_WORDS: &[&str] = &["good", "great", "excellent", "amazing", "wonderful"];

/// Words counted toward negative sentiment.
pub const NEGATIVE_WORDS: &[&str] = &["bad", "terrible", "critical", "emergency"];

/// Words that raise the urgency of a context entry.
pub const CONTEXT_URGENCY_WORDS: &[&str] =
    &["urgent", "asap", "immediately", "critical", "emergency"];

/// Phrases that introduce an actionable task, in extraction order.
pub const TASK_PHRASES: &[&str] = &["need to", "should", "must", "have to", "remember to"];

/// Keywords that lift the heuristic suggestion score by 0.1 each.
pub const SUGGESTION_URGENCY_KEYWORDS: &[&str] =
    &["urgent", "asap", "critical", "important", "deadline"];

/// Keywords that add a flat bonus to the rule-based priority score.
pub const PRIORITY_URGENCY_KEYWORDS: &[&str] = &[
    "urgent",
    "asap",
    "critical",
    "important",
    "priority",
    "deadline",
    "emergency",
];

/// Category keyword sets. Matching stops at the first category that hits,
/// so the order here decides ties.
pub const CATEGORY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Work", &["meeting", "project", "client", "work", "office"]),
    ("Personal", &["home", "family", "personal", "shopping"]),
    ("Health", &["health", "doctor", "exercise", "gym"]),
    ("Learning", &["learn", "study", "course", "book"]),
    ("Social", &["friend", "social", "party", "event"]),
];

/// Category used when no keyword set matches.
pub const DEFAULT_CATEGORY: &str = "Personal";

// ── Tunables ───────────────────────────────────────────────────────────────

const KEYWORD_LIMIT: usize = 5;
const MIN_KEYWORD_CHARS: usize = 4;
const MAX_TASK_CHARS: usize = 100;
const MAX_EXTRACTED_TASKS: usize = 3;
const URGENCY_SCALE: f64 = 2.0;

const BASE_SCORE: f64 = 0.5;
const CONTEXT_URGENCY_WEIGHT: f64 = 0.3;
const KEYWORD_BONUS: f64 = 0.2;

// ── Context analysis ───────────────────────────────────────────────────────

/// Lowercased whitespace tokens with surrounding punctuation removed.
///
/// The returned vector has one entry per whitespace token, so its length is
/// the token count even when a token was pure punctuation (it becomes `""`).
fn normalized_tokens(content: &str) -> Vec<String> {
    content
        .split_whitespace()
        .map(|raw| {
            raw.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .collect()
}

fn count_in(tokens: &[String], words: &[&str]) -> usize {
    tokens
        .iter()
        .filter(|t| words.contains(&t.as_str()))
        .count()
}

/// Sentiment by majority of positive vs negative words; ties are neutral.
pub fn sentiment_of(tokens: &[String]) -> Sentiment {
    let positive = count_in(tokens, POSITIVE_WORDS);
    let negative = count_in(tokens, NEGATIVE_WORDS);
    match negative.cmp(&positive) {
        std::cmp::Ordering::Greater => Sentiment::Negative,
        std::cmp::Ordering::Less => Sentiment::Positive,
        std::cmp::Ordering::Equal => Sentiment::Neutral,
    }
}

/// Share of urgency words among all tokens, doubled, capped at 1.
///
/// Empty text has urgency 0.
pub fn urgency_of(tokens: &[String]) -> f64 {
    if tokens.is_empty() {
        return 0.0;
    }
    let hits = count_in(tokens, CONTEXT_URGENCY_WORDS) as f64;
    clamp_score(hits / tokens.len() as f64 * URGENCY_SCALE)
}

/// Sentences introduced by a task phrase, at most three, in phrase order.
///
/// Each phrase contributes at most one candidate: the text from its first
/// occurrence up to the next period. Candidates of 100 characters or more
/// are dropped.
pub fn extract_tasks(content: &str) -> Vec<String> {
    // ASCII lowering keeps byte offsets aligned with `content`.
    let lowered = content.to_ascii_lowercase();
    let mut tasks = Vec::new();

    for phrase in TASK_PHRASES {
        let Some(start) = lowered.find(phrase) else {
            continue;
        };
        let end = content[start..]
            .find('.')
            .map(|offset| start + offset)
            .unwrap_or(content.len());
        let task = content[start..end].trim();
        if task.chars().count() < MAX_TASK_CHARS {
            tasks.push(task.to_string());
        }
    }

    tasks.truncate(MAX_EXTRACTED_TASKS);
    tasks
}

/// Keyword, sentiment, urgency and task extraction from raw context text.
pub fn basic_context_analysis(content: &str, source_type: SourceType) -> ContextInsights {
    let tokens = normalized_tokens(content);

    let keywords: Vec<String> = tokens
        .iter()
        .filter(|t| t.chars().count() >= MIN_KEYWORD_CHARS)
        .take(KEYWORD_LIMIT)
        .cloned()
        .collect();
    let sentiment = sentiment_of(&tokens);
    let urgency = urgency_of(&tokens);
    let extracted_tasks = extract_tasks(content);

    let insights = format!(
        "Processed {source_type} content with {} keywords and {sentiment} sentiment.",
        keywords.len()
    );

    ContextInsights {
        keywords,
        sentiment,
        urgency,
        extracted_tasks,
        insights,
    }
}

// ── Task suggestions ───────────────────────────────────────────────────────

fn combined_text(title: &str, description: &str) -> String {
    format!("{title} {description}").to_lowercase()
}

/// First category whose keyword set appears in `text` (already lowercased).
pub fn category_for(text: &str) -> &'static str {
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(name, _)| *name)
        .unwrap_or(DEFAULT_CATEGORY)
}

/// 0.5 plus 0.1 per distinct urgency keyword present, capped at 1.
pub fn suggestion_score(text: &str) -> f64 {
    let hits = SUGGESTION_URGENCY_KEYWORDS
        .iter()
        .filter(|k| text.contains(*k))
        .count();
    // Tenths are summed as integers so 0.6, 0.8 etc. hit the thresholds exactly.
    clamp_score((5 + hits) as f64 / 10.0)
}

/// Priority, deadline and category suggestions from keywords alone.
///
/// The description is passed through unchanged and no sub-tasks are
/// extracted. The only time-dependent field is the deadline, which is
/// `now` plus the offset for the suggested priority.
pub fn basic_task_suggestions(
    title: &str,
    description: &str,
    now: DateTime<Utc>,
) -> AiSuggestionBundle {
    let text = combined_text(title, description);
    let priority_score = suggestion_score(&text);
    let suggested_priority = Priority::from_score(priority_score);
    let suggested_deadline =
        (now + Duration::days(suggested_priority.deadline_offset_days())).date_naive();
    let suggested_category = category_for(&text);

    AiSuggestionBundle {
        suggested_deadline,
        suggested_category: suggested_category.to_string(),
        enhanced_description: description.to_string(),
        reasoning: format!(
            "Priority {suggested_priority} based on urgency keywords. \
             Category {suggested_category} based on content analysis."
        ),
        priority_score,
        suggested_priority,
        extracted_tasks: Vec::new(),
    }
}

// ── Rule-based priority ────────────────────────────────────────────────────

/// Bonus for deadline proximity in whole days.
pub fn deadline_bonus(days_until: i64) -> f64 {
    match days_until {
        d if d <= 1 => 0.4,
        d if d <= 3 => 0.3,
        d if d <= 7 => 0.2,
        _ => 0.1,
    }
}

/// Mean urgency of the first `window` entries (most-recent-first), or `None`
/// when there are no entries to average.
pub fn average_urgency(contexts: &[ContextEntry], window: usize) -> Option<f64> {
    let recent = &contexts[..contexts.len().min(window)];
    if recent.is_empty() {
        return None;
    }
    let total: f64 = recent.iter().map(ContextEntry::urgency).sum();
    Some(total / recent.len() as f64)
}

/// Rule-based priority score.
///
/// Starts at 0.5, adds the deadline proximity bonus when the deadline parses,
/// 0.3 × the mean urgency of the `urgency_window` most recent contexts, and
/// 0.2 when the title or description carries an urgency keyword. The result
/// is clamped to `[0, 1]`.
pub fn rule_based_priority(
    task: &TaskDraft,
    contexts: &[ContextEntry],
    urgency_window: usize,
    now: DateTime<Utc>,
) -> f64 {
    let mut score = BASE_SCORE;

    if let Some(deadline) = task.parsed_deadline() {
        score += deadline_bonus(clock::days_until(deadline, now));
    }

    if let Some(avg) = average_urgency(contexts, urgency_window) {
        score += avg * CONTEXT_URGENCY_WEIGHT;
    }

    let text = combined_text(&task.title, &task.description);
    if PRIORITY_URGENCY_KEYWORDS.iter().any(|k| text.contains(k)) {
        score += KEYWORD_BONUS;
    }

    clamp_score(score)
}

// ── Simulated provider reply ───────────────────────────────────────────────

/// Canned prose returned by the gateway when no backend answers.
///
/// It is deliberately not structured data, so callers expecting JSON fall
/// back to the heuristics above.
pub fn synthesize_response(prompt: &str) -> String {
    let lowered = prompt.to_lowercase();
    if lowered.contains("priority") {
        "Based on the content analysis, this appears to be a high priority task \
         due to urgent keywords detected."
            .into()
    } else if lowered.contains("deadline") {
        "Suggested deadline: 3 days from now based on task complexity and current workload."
            .into()
    } else if lowered.contains("category") {
        "This task appears to belong to the 'Work' category based on the content analysis."
            .into()
    } else {
        "AI analysis completed. Task processed successfully with intelligent insights.".into()
    }
}
