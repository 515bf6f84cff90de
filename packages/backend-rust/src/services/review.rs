use chrono::{Duration, NaiveDate, Utc};
use thiserror::Error;
use wordmaster_algo::{apply_outcome, WordProgress, WordStatus};

use crate::db::operations::progress::{self, ProgressRecord};
use crate::db::operations::user::{self, ReviewStatsUpdate, UserRecord};
use crate::db::operations::word;
use crate::db::DatabaseProxy;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("word not found")]
    WordNotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// What a single review did to the word, used to roll the user's stats.
#[derive(Debug, Clone, Copy)]
pub struct ReviewTransition {
    pub is_new: bool,
    pub prev_status: WordStatus,
    pub new_status: WordStatus,
}

/// Applies one review answer: updates the word's progress row and the user's
/// aggregate stats. Returns the updated progress.
pub async fn record_review(
    proxy: &DatabaseProxy,
    user_record: &UserRecord,
    word_id: &str,
    is_correct: bool,
) -> Result<ProgressRecord, ReviewError> {
    if word::get_by_id(proxy, word_id).await?.is_none() {
        return Err(ReviewError::WordNotFound);
    }

    let now = Utc::now();
    let existing = progress::get_progress(proxy, &user_record.id, word_id).await?;

    let (record, transition) = match existing {
        Some(mut record) => {
            let prev_status = record.status;
            let snapshot = apply_outcome(&record.to_algo(), is_correct, now);
            record.apply_snapshot(&snapshot);
            let record = progress::update_progress(proxy, &record).await?;
            (
                record,
                ReviewTransition {
                    is_new: false,
                    prev_status,
                    new_status: snapshot.status,
                },
            )
        }
        None => {
            let snapshot = apply_outcome(&WordProgress::new(now), is_correct, now);
            let record =
                progress::insert_progress(proxy, &user_record.id, word_id, &snapshot).await?;
            (
                record,
                ReviewTransition {
                    is_new: true,
                    prev_status: WordStatus::Learning,
                    new_status: snapshot.status,
                },
            )
        }
    };

    let today = now.date_naive();
    let stats = compute_review_stats(user_record, transition, today);
    user::update_review_stats(proxy, &user_record.id, &stats).await?;

    Ok(record)
}

/// Pure stats roll-over for one review: first-exposure counters, mastery
/// edges in both directions, and the daily streak.
pub fn compute_review_stats(
    user_record: &UserRecord,
    transition: ReviewTransition,
    today: NaiveDate,
) -> ReviewStatsUpdate {
    let mut total_words = user_record.total_words;
    let mut mastered_words = user_record.mastered_words;
    let mut words_learned_today = user_record.words_learned_today;
    let mut current_streak = user_record.current_streak;

    if transition.is_new {
        total_words += 1;
    }

    let was_mastered = transition.prev_status == WordStatus::Mastered;
    let is_mastered = transition.new_status == WordStatus::Mastered;
    if is_mastered && !was_mastered {
        mastered_words += 1;
    } else if was_mastered && !is_mastered {
        mastered_words = (mastered_words - 1).max(0);
    }

    let studied_today = user_record.last_study_date == Some(today);
    if !studied_today {
        words_learned_today = 0;
        let yesterday = today - Duration::days(1);
        if user_record.last_study_date == Some(yesterday) {
            current_streak += 1;
        } else {
            current_streak = 1;
        }
    }
    if transition.is_new {
        words_learned_today += 1;
    }

    ReviewStatsUpdate {
        total_words,
        mastered_words,
        current_streak,
        longest_streak: user_record.longest_streak.max(current_streak),
        words_learned_today,
        last_study_date: today,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn base_user() -> UserRecord {
        let epoch = NaiveDateTime::default();
        UserRecord {
            id: "u1".to_string(),
            email: "u1@example.com".to_string(),
            username: "u1".to_string(),
            password_hash: String::new(),
            referral_code: None,
            referred_by: None,
            daily_goal: 20,
            theme: "system".to_string(),
            language: "zh".to_string(),
            total_words: 10,
            mastered_words: 2,
            current_streak: 3,
            longest_streak: 5,
            total_study_time: 0,
            words_learned_today: 4,
            last_study_date: None,
            last_login_at: None,
            created_at: epoch,
            updated_at: epoch,
        }
    }

    fn transition(is_new: bool, prev: WordStatus, new: WordStatus) -> ReviewTransition {
        ReviewTransition {
            is_new,
            prev_status: prev,
            new_status: new,
        }
    }

    #[test]
    fn first_exposure_bumps_total_and_daily_counters() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut user_record = base_user();
        user_record.last_study_date = Some(today);

        let stats = compute_review_stats(
            &user_record,
            transition(true, WordStatus::Learning, WordStatus::Reviewing),
            today,
        );
        assert_eq!(stats.total_words, 11);
        assert_eq!(stats.words_learned_today, 5);
        assert_eq!(stats.current_streak, 3);
    }

    #[test]
    fn streak_increments_after_yesterday_and_resets_after_gap() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

        let mut user_record = base_user();
        user_record.last_study_date = Some(today - Duration::days(1));
        let stats = compute_review_stats(
            &user_record,
            transition(false, WordStatus::Reviewing, WordStatus::Reviewing),
            today,
        );
        assert_eq!(stats.current_streak, 4);
        assert_eq!(stats.words_learned_today, 0);

        user_record.last_study_date = Some(today - Duration::days(3));
        let stats = compute_review_stats(
            &user_record,
            transition(false, WordStatus::Reviewing, WordStatus::Reviewing),
            today,
        );
        assert_eq!(stats.current_streak, 1);
        assert_eq!(stats.longest_streak, 5);
    }

    #[test]
    fn mastery_edges_move_mastered_count_both_ways() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut user_record = base_user();
        user_record.last_study_date = Some(today);

        let stats = compute_review_stats(
            &user_record,
            transition(false, WordStatus::Reviewing, WordStatus::Mastered),
            today,
        );
        assert_eq!(stats.mastered_words, 3);

        let stats = compute_review_stats(
            &user_record,
            transition(false, WordStatus::Mastered, WordStatus::Learning),
            today,
        );
        assert_eq!(stats.mastered_words, 1);
    }

    #[test]
    fn longest_streak_follows_current() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut user_record = base_user();
        user_record.current_streak = 5;
        user_record.last_study_date = Some(today - Duration::days(1));

        let stats = compute_review_stats(
            &user_record,
            transition(false, WordStatus::Reviewing, WordStatus::Reviewing),
            today,
        );
        assert_eq!(stats.current_streak, 6);
        assert_eq!(stats.longest_streak, 6);
    }
}
