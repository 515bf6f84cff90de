use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;
use wordmaster_algo::{WordProgress, WordStatus};

use crate::db::DatabaseProxy;

/// Stored per-user, per-word progress row. Rows are created on first exposure
/// and mutated on every review; they are never deleted.
#[derive(Debug, Clone)]
pub struct ProgressRecord {
    pub id: String,
    pub user_id: String,
    pub word_id: String,
    pub status: WordStatus,
    pub correct_count: i32,
    pub incorrect_count: i32,
    pub last_reviewed_at: NaiveDateTime,
    pub next_review_at: NaiveDateTime,
    pub difficulty: f64,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ProgressRecord {
    /// Snapshot handed to the pure progress tracker.
    pub fn to_algo(&self) -> WordProgress {
        WordProgress {
            status: self.status,
            correct_count: self.correct_count.max(0) as u32,
            incorrect_count: self.incorrect_count.max(0) as u32,
            last_reviewed_at: DateTime::<Utc>::from_naive_utc_and_offset(
                self.last_reviewed_at,
                Utc,
            ),
            next_review_at: DateTime::<Utc>::from_naive_utc_and_offset(self.next_review_at, Utc),
            difficulty: self.difficulty,
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: &WordProgress) {
        self.status = snapshot.status;
        self.correct_count = snapshot.correct_count as i32;
        self.incorrect_count = snapshot.incorrect_count as i32;
        self.last_reviewed_at = snapshot.last_reviewed_at.naive_utc();
        self.next_review_at = snapshot.next_review_at.naive_utc();
        self.difficulty = snapshot.difficulty;
    }
}

const PROGRESS_COLUMNS: &str = r#"
    "id","userId","wordId","status","correctCount","incorrectCount",
    "lastReviewedAt","nextReviewAt","difficulty","notes","createdAt","updatedAt"
"#;

fn map_progress_row(row: &PgRow) -> Result<ProgressRecord, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(ProgressRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("userId")?,
        word_id: row.try_get("wordId")?,
        status: WordStatus::parse(&status).unwrap_or(WordStatus::Learning),
        correct_count: row.try_get("correctCount")?,
        incorrect_count: row.try_get("incorrectCount")?,
        last_reviewed_at: row.try_get("lastReviewedAt")?,
        next_review_at: row.try_get("nextReviewAt")?,
        difficulty: row.try_get("difficulty")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("createdAt")?,
        updated_at: row.try_get("updatedAt")?,
    })
}

pub async fn get_progress(
    proxy: &DatabaseProxy,
    user_id: &str,
    word_id: &str,
) -> Result<Option<ProgressRecord>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {PROGRESS_COLUMNS} FROM "user_word_progress"
        WHERE "userId" = $1 AND "wordId" = $2
        LIMIT 1
        "#
    );
    let row = sqlx::query(&sql)
        .bind(user_id)
        .bind(word_id)
        .fetch_optional(proxy.pool())
        .await?;
    row.map(|r| map_progress_row(&r)).transpose()
}

pub async fn insert_progress(
    proxy: &DatabaseProxy,
    user_id: &str,
    word_id: &str,
    snapshot: &WordProgress,
) -> Result<ProgressRecord, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().naive_utc();
    let sql = format!(
        r#"
        INSERT INTO "user_word_progress"
            ("id","userId","wordId","status","correctCount","incorrectCount",
             "lastReviewedAt","nextReviewAt","difficulty","createdAt","updatedAt")
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
        RETURNING {PROGRESS_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(&id)
        .bind(user_id)
        .bind(word_id)
        .bind(snapshot.status.as_str())
        .bind(snapshot.correct_count as i32)
        .bind(snapshot.incorrect_count as i32)
        .bind(snapshot.last_reviewed_at.naive_utc())
        .bind(snapshot.next_review_at.naive_utc())
        .bind(snapshot.difficulty)
        .bind(now)
        .fetch_one(proxy.pool())
        .await?;
    map_progress_row(&row)
}

pub async fn update_progress(
    proxy: &DatabaseProxy,
    record: &ProgressRecord,
) -> Result<ProgressRecord, sqlx::Error> {
    let now = Utc::now().naive_utc();
    let sql = format!(
        r#"
        UPDATE "user_word_progress" SET
            "status" = $2,
            "correctCount" = $3,
            "incorrectCount" = $4,
            "lastReviewedAt" = $5,
            "nextReviewAt" = $6,
            "difficulty" = $7,
            "updatedAt" = $8
        WHERE "id" = $1
        RETURNING {PROGRESS_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(&record.id)
        .bind(record.status.as_str())
        .bind(record.correct_count)
        .bind(record.incorrect_count)
        .bind(record.last_reviewed_at)
        .bind(record.next_review_at)
        .bind(record.difficulty)
        .bind(now)
        .fetch_one(proxy.pool())
        .await?;
    map_progress_row(&row)
}

/// Words due for review: next review in the past and not yet mastered.
pub async fn list_due(
    proxy: &DatabaseProxy,
    user_id: &str,
    now: NaiveDateTime,
    limit: i64,
) -> Result<Vec<ProgressRecord>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {PROGRESS_COLUMNS} FROM "user_word_progress"
        WHERE "userId" = $1
          AND "nextReviewAt" <= $2
          AND "status" IN ('learning', 'reviewing')
        ORDER BY "nextReviewAt" ASC
        LIMIT $3
        "#
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(now)
        .bind(limit)
        .fetch_all(proxy.pool())
        .await?;
    rows.iter().map(map_progress_row).collect()
}

#[derive(Debug, Clone, Default)]
pub struct StatusCounts {
    pub learning: i64,
    pub reviewing: i64,
    pub mastered: i64,
}

pub async fn count_by_status(
    proxy: &DatabaseProxy,
    user_id: &str,
) -> Result<StatusCounts, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT "status", COUNT(*) AS "count"
        FROM "user_word_progress"
        WHERE "userId" = $1
        GROUP BY "status"
        "#,
    )
    .bind(user_id)
    .fetch_all(proxy.pool())
    .await?;

    let mut counts = StatusCounts::default();
    for row in &rows {
        let status: String = row.try_get("status")?;
        let count: i64 = row.try_get("count")?;
        match status.as_str() {
            "learning" => counts.learning = count,
            "reviewing" => counts.reviewing = count,
            "mastered" => counts.mastered = count,
            _ => {}
        }
    }
    Ok(counts)
}
