//! Progress Tracker
//!
//! Pure state transitions over a per-word progress snapshot. The caller owns
//! loading and saving the record; concurrent updates to the same record must
//! be serialized by the storage layer.

use chrono::{DateTime, Utc};

use crate::scheduler::next_review;
use crate::types::{
    WordProgress, WordStatus, DIFFICULTY_STEP, MASTERY_MAX_INCORRECT, MASTERY_MIN_CORRECT,
    MAX_PERSONAL_DIFFICULTY,
};

/// Applies one review outcome and returns the updated snapshot.
///
/// Correct answers advance the word toward `Mastered` (at least
/// [`MASTERY_MIN_CORRECT`] correct with at most [`MASTERY_MAX_INCORRECT`]
/// incorrect); any incorrect answer resets the word to `Learning` and raises
/// its personal difficulty. The next review is always rescheduled from `now`
/// with the updated counters.
pub fn apply_outcome(progress: &WordProgress, is_correct: bool, now: DateTime<Utc>) -> WordProgress {
    let mut updated = progress.clone();

    if is_correct {
        updated.correct_count += 1;
        updated.status = if updated.correct_count >= MASTERY_MIN_CORRECT
            && updated.incorrect_count <= MASTERY_MAX_INCORRECT
        {
            WordStatus::Mastered
        } else {
            WordStatus::Reviewing
        };
    } else {
        updated.incorrect_count += 1;
        updated.status = WordStatus::Learning;
        updated.difficulty =
            (updated.difficulty + DIFFICULTY_STEP).min(MAX_PERSONAL_DIFFICULTY);
    }

    updated.last_reviewed_at = now;
    updated.next_review_at = next_review(now, updated.correct_count, updated.incorrect_count);

    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn fixed_now() -> DateTime<Utc> {
        chrono::DateTime::parse_from_rfc3339("2024-06-01T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn progress_with(correct: u32, incorrect: u32, difficulty: f64) -> WordProgress {
        let now = fixed_now() - Duration::days(2);
        WordProgress {
            status: WordStatus::Reviewing,
            correct_count: correct,
            incorrect_count: incorrect,
            last_reviewed_at: now,
            next_review_at: now + Duration::days(1),
            difficulty,
        }
    }

    #[test]
    fn new_progress_starts_learning_with_one_day_interval() {
        let now = fixed_now();
        let progress = WordProgress::new(now);
        assert_eq!(progress.status, WordStatus::Learning);
        assert_eq!(progress.correct_count, 0);
        assert_eq!(progress.incorrect_count, 0);
        assert_eq!(progress.next_review_at, now + Duration::days(1));
    }

    #[test]
    fn fifth_correct_answer_masters_the_word() {
        let now = fixed_now();
        let updated = apply_outcome(&progress_with(4, 0, 3.0), true, now);
        assert_eq!(updated.correct_count, 5);
        assert_eq!(updated.status, WordStatus::Mastered);
    }

    #[test]
    fn correct_answer_below_mastery_bar_moves_to_reviewing() {
        let now = fixed_now();
        let updated = apply_outcome(&progress_with(2, 0, 3.0), true, now);
        assert_eq!(updated.status, WordStatus::Reviewing);
    }

    #[test]
    fn too_many_mistakes_blocks_mastery() {
        let now = fixed_now();
        let updated = apply_outcome(&progress_with(4, 2, 3.0), true, now);
        assert_eq!(updated.correct_count, 5);
        assert_eq!(updated.status, WordStatus::Reviewing);
    }

    #[test]
    fn incorrect_answer_resets_to_learning_and_raises_difficulty() {
        let now = fixed_now();
        let updated = apply_outcome(&progress_with(3, 1, 3.0), false, now);
        assert_eq!(updated.incorrect_count, 2);
        assert_eq!(updated.status, WordStatus::Learning);
        assert_eq!(updated.difficulty, 3.5);
    }

    #[test]
    fn difficulty_clamps_at_five() {
        let now = fixed_now();
        let updated = apply_outcome(&progress_with(0, 3, 4.8), false, now);
        assert_eq!(updated.difficulty, 5.0);
    }

    #[test]
    fn mastered_word_regresses_on_failure() {
        let now = fixed_now();
        let mut mastered = progress_with(6, 0, 2.0);
        mastered.status = WordStatus::Mastered;
        let updated = apply_outcome(&mastered, false, now);
        assert_eq!(updated.status, WordStatus::Learning);
    }

    #[test]
    fn review_timestamps_move_forward() {
        let now = fixed_now();
        let updated = apply_outcome(&progress_with(1, 0, 3.0), true, now);
        assert_eq!(updated.last_reviewed_at, now);
        assert!(updated.next_review_at > updated.last_reviewed_at);
    }

    proptest! {
        #[test]
        fn counters_never_decrease(
            correct in 0u32..200,
            incorrect in 0u32..200,
            difficulty in 1.0f64..=5.0,
            is_correct: bool,
        ) {
            let now = fixed_now();
            let before = progress_with(correct, incorrect, difficulty);
            let after = apply_outcome(&before, is_correct, now);
            prop_assert!(after.correct_count >= before.correct_count);
            prop_assert!(after.incorrect_count >= before.incorrect_count);
            prop_assert_eq!(after.total_reviews(), before.total_reviews() + 1);
        }

        #[test]
        fn next_review_is_strictly_after_now(
            correct in 0u32..200,
            incorrect in 0u32..200,
        ) {
            let now = fixed_now();
            let next = crate::scheduler::next_review(now, correct, incorrect);
            prop_assert!(next > now);
            prop_assert!(next >= now + Duration::days(1));
            prop_assert!(next <= now + Duration::days(120));
        }

        #[test]
        fn difficulty_stays_in_range(
            correct in 0u32..50,
            incorrect in 0u32..50,
            difficulty in 1.0f64..=5.0,
            is_correct: bool,
        ) {
            let now = fixed_now();
            let after = apply_outcome(&progress_with(correct, incorrect, difficulty), is_correct, now);
            prop_assert!(after.difficulty >= 1.0);
            prop_assert!(after.difficulty <= 5.0);
        }
    }
}
