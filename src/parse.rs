//! Strict decoding of provider replies into per-operation schemas.
//!
//! A reply either decodes completely into the expected record or it is
//! rejected. There is no repair step: missing keys, wrong types, bad enum
//! labels and non-JSON prose all come back as a [`ParseError`], and the
//! calling operation takes its heuristic path. Numeric ranges are not checked
//! here; the operations clamp what they receive.

use miette::Diagnostic;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::model::{AiSuggestionBundle, ContextInsights};

/// Why a reply could not be interpreted.
#[derive(Debug, Error, Diagnostic)]
pub enum ParseError {
    #[error("empty reply for {schema}")]
    #[diagnostic(
        code(taskwise::parse::empty),
        help("The provider returned no text. The heuristic result is used instead.")
    )]
    Empty { schema: &'static str },

    #[error("reply for {schema} is not valid JSON: {message}")]
    #[diagnostic(
        code(taskwise::parse::syntax),
        help("The model answered in prose or truncated its output. The heuristic result is used instead.")
    )]
    Syntax {
        schema: &'static str,
        message: String,
    },

    #[error("reply for {schema} does not match the schema: {message}")]
    #[diagnostic(
        code(taskwise::parse::schema),
        help("A required key is missing or has the wrong type. The heuristic result is used instead.")
    )]
    Schema {
        schema: &'static str,
        message: String,
    },
}

pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// A record a provider reply can be decoded into.
pub trait ResponseSchema: DeserializeOwned {
    /// Name used in diagnostics.
    const NAME: &'static str;
}

impl ResponseSchema for ContextInsights {
    const NAME: &'static str = "context insights";
}

impl ResponseSchema for AiSuggestionBundle {
    const NAME: &'static str = "task suggestions";
}

/// Reply shape for priority scoring.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PriorityReply {
    pub priority_score: f64,
    pub reasoning: String,
}

impl ResponseSchema for PriorityReply {
    const NAME: &'static str = "priority score";
}

/// Decode `raw` as exactly one `T`. Surrounding whitespace is allowed.
pub fn decode<T: ResponseSchema>(raw: &str) -> ParseResult<T> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty { schema: T::NAME });
    }

    serde_json::from_str(trimmed).map_err(|e| {
        use serde_json::error::Category;
        match e.classify() {
            Category::Data => ParseError::Schema {
                schema: T::NAME,
                message: e.to_string(),
            },
            Category::Syntax | Category::Eof | Category::Io => ParseError::Syntax {
                schema: T::NAME,
                message: e.to_string(),
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sentiment;
    use crate::priority::Priority;

    #[test]
    fn decodes_priority_reply() {
        let reply: PriorityReply =
            decode(r#"  {"priority_score": 0.85, "reasoning": "deadline tomorrow"}  "#).unwrap();
        assert_eq!(reply.priority_score, 0.85);
        assert_eq!(reply.reasoning, "deadline tomorrow");
    }

    #[test]
    fn out_of_range_score_is_not_a_parse_error() {
        let reply: PriorityReply =
            decode(r#"{"priority_score": 1.7, "reasoning": "very urgent"}"#).unwrap();
        assert_eq!(reply.priority_score, 1.7);
    }

    #[test]
    fn missing_key_is_schema_error() {
        let err = decode::<PriorityReply>(r#"{"priority_score": 0.5}"#).unwrap_err();
        assert!(matches!(err, ParseError::Schema { .. }));
    }

    #[test]
    fn string_score_is_schema_error() {
        let err =
            decode::<PriorityReply>(r#"{"priority_score": "high", "reasoning": "x"}"#).unwrap_err();
        assert!(matches!(err, ParseError::Schema { .. }));
    }

    #[test]
    fn prose_is_syntax_error() {
        let err = decode::<ContextInsights>("This looks urgent to me.").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn fenced_json_is_rejected() {
        let err = decode::<PriorityReply>(
            "```json\n{\"priority_score\": 0.5, \"reasoning\": \"x\"}\n```",
        )
        .unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn empty_reply_is_rejected() {
        let err = decode::<AiSuggestionBundle>("   \n").unwrap_err();
        assert!(matches!(err, ParseError::Empty { .. }));
    }

    #[test]
    fn decodes_full_context_insights() {
        let raw = r#"{
            "keywords": ["report", "client"],
            "sentiment": "negative",
            "urgency": 0.9,
            "extracted_tasks": ["file report"],
            "insights": "Deadline pressure from client."
        }"#;
        let insights: ContextInsights = decode(raw).unwrap();
        assert_eq!(insights.sentiment, Sentiment::Negative);
        assert_eq!(insights.extracted_tasks, vec!["file report".to_string()]);
    }

    #[test]
    fn unknown_sentiment_label_is_rejected() {
        let raw = r#"{
            "keywords": [], "sentiment": "anxious", "urgency": 0.2,
            "extracted_tasks": [], "insights": ""
        }"#;
        assert!(matches!(
            decode::<ContextInsights>(raw),
            Err(ParseError::Schema { .. })
        ));
    }

    #[test]
    fn decodes_suggestion_bundle() {
        let raw = r#"{
            "suggested_deadline": "2026-10-22",
            "suggested_category": "Work",
            "enhanced_description": "Prepare Q3 numbers for the client review",
            "reasoning": "Client meeting on Thursday",
            "priority_score": 0.7,
            "suggested_priority": "high",
            "extracted_tasks": ["collect numbers", "draft slides"]
        }"#;
        let bundle: AiSuggestionBundle = decode(raw).unwrap();
        assert_eq!(bundle.suggested_priority, Priority::High);
        assert_eq!(bundle.extracted_tasks.len(), 2);
    }

    #[test]
    fn bad_deadline_format_is_rejected() {
        let raw = r#"{
            "suggested_deadline": "next week",
            "suggested_category": "Work",
            "enhanced_description": "",
            "reasoning": "",
            "priority_score": 0.7,
            "suggested_priority": "high",
            "extracted_tasks": []
        }"#;
        assert!(decode::<AiSuggestionBundle>(raw).is_err());
    }
}
