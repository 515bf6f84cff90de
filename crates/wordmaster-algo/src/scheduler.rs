//! Review Scheduler
//!
//! Computes the next review timestamp from the cumulative answer counters,
//! using the fixed Ebbinghaus interval table adjusted by recent accuracy.

use chrono::{DateTime, Duration, Utc};

use crate::types::{LOW_ACCURACY_PERCENT, REVIEW_INTERVALS_DAYS};

/// Accuracy as a rounded percentage, 0 when nothing has been answered yet.
pub fn accuracy_percent(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u32
}

/// Next review timestamp for a word with the given answer history.
///
/// The interval table is indexed by `correct_count` (clamped to the last
/// entry); a learner below the accuracy threshold is moved one step earlier.
/// The interval is offset from the caller-supplied `now`, not from the
/// previous review.
pub fn next_review(now: DateTime<Utc>, correct_count: u32, incorrect_count: u32) -> DateTime<Utc> {
    let last_index = REVIEW_INTERVALS_DAYS.len() - 1;
    let mut interval_index = (correct_count as usize).min(last_index);

    let accuracy = accuracy_percent(correct_count, correct_count + incorrect_count);
    if accuracy < LOW_ACCURACY_PERCENT {
        interval_index = interval_index.saturating_sub(1);
    }

    now + Duration::days(REVIEW_INTERVALS_DAYS[interval_index])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        chrono::DateTime::parse_from_rfc3339("2024-06-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn first_exposure_schedules_one_day_out() {
        let now = fixed_now();
        assert_eq!(next_review(now, 0, 0), now + Duration::days(1));
    }

    #[test]
    fn correct_count_beyond_table_clamps_to_longest_interval() {
        let now = fixed_now();
        assert_eq!(next_review(now, 6, 0), now + Duration::days(120));
        assert_eq!(next_review(now, 50, 0), now + Duration::days(120));
    }

    #[test]
    fn low_accuracy_shortens_interval_by_one_step() {
        let now = fixed_now();
        // 4 correct, perfect accuracy: index 4 -> 30 days.
        assert_eq!(next_review(now, 4, 0), now + Duration::days(30));
        // 4 correct, 6 incorrect: 40% accuracy drops to index 3 -> 15 days.
        assert_eq!(next_review(now, 4, 6), now + Duration::days(15));
    }

    #[test]
    fn low_accuracy_floor_stays_at_first_interval() {
        let now = fixed_now();
        // Zero correct answers: index already 0, decrement floors at 0.
        assert_eq!(next_review(now, 0, 5), now + Duration::days(1));
    }

    #[test]
    fn accuracy_rounds_to_nearest_percent() {
        // 7/10 = 70%, right at the threshold: no shortening.
        assert_eq!(accuracy_percent(7, 10), 70);
        let now = fixed_now();
        assert_eq!(next_review(now, 7, 3), now + Duration::days(120));
        // 16/23 ≈ 69.6% rounds to 70: still no shortening.
        assert_eq!(accuracy_percent(16, 23), 70);
    }

    #[test]
    fn empty_history_counts_as_zero_accuracy() {
        assert_eq!(accuracy_percent(0, 0), 0);
    }
}
