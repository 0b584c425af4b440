//! Priority labels and the score ↔ label table.
//!
//! The numeric priority score in `[0, 1]` is the source of truth; the label is
//! always derived from it through [`Priority::from_score`]. The same thresholds
//! are used everywhere a score is quantized.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Score at or above which a task is urgent.
pub const URGENT_THRESHOLD: f64 = 0.8;

/// Score at or above which a task is high priority.
pub const HIGH_THRESHOLD: f64 = 0.6;

/// Score at or above which a task is medium priority.
pub const MEDIUM_THRESHOLD: f64 = 0.4;

/// Quantized priority label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// All labels from most to least pressing.
    pub const ALL: [Priority; 4] = [
        Priority::Urgent,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    /// Quantize a score. Monotonic: a higher score never yields a lower label.
    ///
    /// Scores outside `[0, 1]` land on the nearest end of the table.
    pub fn from_score(score: f64) -> Self {
        if score >= URGENT_THRESHOLD {
            Self::Urgent
        } else if score >= HIGH_THRESHOLD {
            Self::High
        } else if score >= MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Days from "now" used for a suggested deadline at this priority.
    pub fn deadline_offset_days(&self) -> i64 {
        match self {
            Self::Urgent => 1,
            Self::High => 3,
            Self::Medium => 7,
            Self::Low => 14,
        }
    }

    /// Lowercase wire label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    /// Rank for ordering: urgent = 3 down to low = 0.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Urgent => 3,
            Self::High => 2,
            Self::Medium => 1,
            Self::Low => 0,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "urgent" => Ok(Self::Urgent),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(format!("unknown priority \"{other}\"")),
        }
    }
}

/// Clamp a score into `[0, 1]`. NaN collapses to 0.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}
