//! Prompt templates for the insight operations.
//!
//! Callers apply the recency window before rendering; these functions only
//! format what they are given.

use serde::Serialize;

use crate::model::{ContextEntry, Sentiment, SourceType, TaskDraft};

/// First `max_chars` characters of `text`.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Prompt asking for the [`crate::model::ContextInsights`] JSON shape.
pub fn context_analysis(content: &str, source_type: SourceType) -> String {
    format!(
        r#"Analyze the following {source_type} content and extract insights:

Content: {content}

Please provide a JSON response with the following structure:
{{
    "keywords": ["keyword1", "keyword2", "keyword3"],
    "sentiment": "positive|neutral|negative",
    "urgency": 0.0-1.0,
    "extracted_tasks": ["task1", "task2"],
    "insights": "Brief analysis of the content"
}}

Focus on:
1. Extracting relevant keywords
2. Determining sentiment
3. Assessing urgency level
4. Identifying potential tasks
5. Providing actionable insights

Return only the JSON object."#
    )
}

/// One line per context: `source: excerpt...`.
pub fn context_summary(contexts: &[ContextEntry], excerpt_chars: usize) -> String {
    contexts
        .iter()
        .map(|ctx| {
            format!(
                "{}: {}...",
                ctx.source_type,
                excerpt(&ctx.content, excerpt_chars)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt asking for the [`crate::model::AiSuggestionBundle`] JSON shape.
pub fn task_suggestions(
    title: &str,
    description: &str,
    contexts: &[ContextEntry],
    excerpt_chars: usize,
) -> String {
    let summary = context_summary(contexts, excerpt_chars);
    format!(
        r#"Analyze the following task and provide intelligent suggestions:

Task Title: {title}
Task Description: {description}

Recent Context:
{summary}

Please provide a JSON response with the following structure:
{{
    "suggested_deadline": "YYYY-MM-DD",
    "suggested_category": "category_name",
    "enhanced_description": "enhanced description with context",
    "reasoning": "explanation of suggestions",
    "priority_score": 0.0-1.0,
    "suggested_priority": "urgent|high|medium|low",
    "extracted_tasks": ["subtask1", "subtask2"]
}}

Consider:
1. Task complexity and estimated time
2. Current workload and context
3. Urgency indicators from context
4. Optimal deadline based on priority
5. Most appropriate category
6. Enhanced description with relevant context

Return only the JSON object."#
    )
}

#[derive(Serialize)]
struct ContextSignal<'a> {
    content: &'a str,
    urgency: f64,
    sentiment: Sentiment,
}

/// Prompt asking for `{"priority_score", "reasoning"}`.
pub fn priority_score(task: &TaskDraft, contexts: &[ContextEntry], excerpt_chars: usize) -> String {
    let signals: Vec<ContextSignal<'_>> = contexts
        .iter()
        .map(|ctx| ContextSignal {
            content: excerpt(&ctx.content, excerpt_chars),
            urgency: ctx.urgency(),
            sentiment: ctx.sentiment(),
        })
        .collect();
    let signals_json = serde_json::to_string_pretty(&signals).unwrap_or_else(|_| "[]".into());
    let deadline = task.deadline.as_deref().unwrap_or("");

    format!(
        r#"Analyze the following task and calculate a priority score (0.0 to 1.0) based on:
1. Task title and description
2. Deadline proximity
3. Context urgency and sentiment
4. Overall importance indicators

Task Title: {title}
Task Description: {description}
Deadline: {deadline}

Recent Context Insights:
{signals_json}

Consider:
- Urgency keywords (urgent, asap, critical, important, deadline)
- Deadline proximity (days until deadline)
- Context urgency levels
- Sentiment analysis from context
- Task complexity and scope

Return only a JSON response with this structure:
{{
    "priority_score": 0.85,
    "reasoning": "High priority due to urgent deadline and critical keywords in description"
}}"#,
        title = task.title,
        description = task.description,
    )
}
