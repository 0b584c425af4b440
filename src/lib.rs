// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # taskwise
//!
//! Task intelligence: turns free-form task text and daily "context" notes into
//! priority scores, suggested deadlines and categories, and fleet-level
//! productivity analytics.
//!
//! ## Architecture
//!
//! - **Provider gateway** (`provider`): ordered fallback over OpenAI, Anthropic,
//!   Gemini and a local OpenAI-compatible server, with a simulated reply when
//!   none answers
//! - **Heuristics** (`heuristic`): deterministic keyword rules that always produce
//!   an answer
//! - **Parser** (`parse`): strict JSON decoding of provider replies
//! - **Insight engine** (`insight`): the four operations, each falling back to
//!   the heuristics on any failure
//! - **Analytics** (`analytics`): productivity, burnout and focus areas
//! - **Workspace** (`store`): JSON persistence used by the CLI
//!
//! ## Library usage
//!
//! ```no_run
//! use taskwise::config::EngineConfig;
//! use taskwise::insight::InsightEngine;
//! use taskwise::model::{SourceType, TaskDraft};
//!
//! let mut config = EngineConfig::default();
//! config.apply_env().unwrap();
//! let engine = InsightEngine::from_config(&config);
//!
//! let insights = engine.process_context("URGENT: need to file report", SourceType::Email);
//! let score = engine.calculate_priority_score(&TaskDraft::new("File report", ""), &[]);
//! println!("{insights:?} {score}");
//! ```

pub mod analytics;
pub mod clock;
pub mod config;
pub mod error;
pub mod heuristic;
pub mod insight;
pub mod model;
pub mod parse;
pub mod paths;
pub mod priority;
pub mod prompt;
pub mod provider;
pub mod store;
