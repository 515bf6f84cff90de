//! Common Types and Constants
//!
//! Shared data structures used by the scheduler and progress modules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==================== Constants ====================

/// Ebbinghaus forgetting-curve review intervals, in days.
///
/// Indexed by accumulated correct answers (clamped to the last entry).
pub const REVIEW_INTERVALS_DAYS: [i64; 7] = [1, 3, 7, 15, 30, 60, 120];

/// Accuracy threshold (rounded percent) below which the interval is shortened
/// by one table step.
pub const LOW_ACCURACY_PERCENT: u32 = 70;

/// Correct answers required before a word can be marked mastered.
pub const MASTERY_MIN_CORRECT: u32 = 5;

/// Maximum incorrect answers tolerated for the mastered transition.
pub const MASTERY_MAX_INCORRECT: u32 = 1;

/// Personal difficulty rating range is [1, 5].
pub const MAX_PERSONAL_DIFFICULTY: f64 = 5.0;

/// Difficulty added on every incorrect answer (clamped at the maximum).
pub const DIFFICULTY_STEP: f64 = 0.5;

/// Personal difficulty assigned on first exposure to a word.
pub const DEFAULT_PERSONAL_DIFFICULTY: f64 = 3.0;

// ==================== Progress Types ====================

/// Learning status of a word for one user.
///
/// Tends toward `Mastered` as correct answers accumulate, but any incorrect
/// answer resets the word to `Learning`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordStatus {
    Learning,
    Reviewing,
    Mastered,
}

impl WordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WordStatus::Learning => "learning",
            WordStatus::Reviewing => "reviewing",
            WordStatus::Mastered => "mastered",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "learning" => Some(WordStatus::Learning),
            "reviewing" => Some(WordStatus::Reviewing),
            "mastered" => Some(WordStatus::Mastered),
            _ => None,
        }
    }
}

/// Per-user, per-word progress snapshot.
///
/// The caller (persistence layer) loads a consistent snapshot, applies an
/// outcome through [`crate::apply_outcome`], and saves the returned snapshot.
/// Counters are cumulative and never reset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordProgress {
    pub status: WordStatus,
    pub correct_count: u32,
    pub incorrect_count: u32,
    pub last_reviewed_at: DateTime<Utc>,
    pub next_review_at: DateTime<Utc>,
    /// Personal difficulty rating in [1, 5]. Increases on failure.
    pub difficulty: f64,
}

impl WordProgress {
    /// Snapshot for the first exposure to a word.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            status: WordStatus::Learning,
            correct_count: 0,
            incorrect_count: 0,
            last_reviewed_at: now,
            next_review_at: crate::scheduler::next_review(now, 0, 0),
            difficulty: DEFAULT_PERSONAL_DIFFICULTY,
        }
    }

    /// Total review events recorded for this word.
    pub fn total_reviews(&self) -> u32 {
        self.correct_count + self.incorrect_count
    }
}
