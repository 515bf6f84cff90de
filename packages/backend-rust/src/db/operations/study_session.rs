use chrono::NaiveDateTime;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::db::DatabaseProxy;

#[derive(Debug, Clone)]
pub struct StudySessionRecord {
    pub id: String,
    pub user_id: String,
    pub session_type: String,
    pub words_studied: Vec<String>,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub duration: i32,
    pub started_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

pub struct CreateSessionInput {
    pub session_type: String,
    pub words_studied: Vec<String>,
    pub correct_answers: i32,
    pub total_questions: i32,
    pub duration: i32,
    pub started_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

fn map_session_row(row: &PgRow) -> Result<StudySessionRecord, sqlx::Error> {
    let words: serde_json::Value = row.try_get("wordsStudied")?;
    Ok(StudySessionRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("userId")?,
        session_type: row.try_get("type")?,
        words_studied: serde_json::from_value(words).unwrap_or_default(),
        correct_answers: row.try_get("correctAnswers")?,
        total_questions: row.try_get("totalQuestions")?,
        duration: row.try_get("duration")?,
        started_at: row.try_get("startedAt")?,
        completed_at: row.try_get("completedAt")?,
    })
}

pub async fn insert_session(
    proxy: &DatabaseProxy,
    user_id: &str,
    input: &CreateSessionInput,
) -> Result<StudySessionRecord, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let words = serde_json::to_value(&input.words_studied).unwrap_or_default();
    let row = sqlx::query(
        r#"
        INSERT INTO "study_sessions"
            ("id","userId","type","wordsStudied","correctAnswers","totalQuestions","duration","startedAt","completedAt")
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING "id","userId","type","wordsStudied","correctAnswers","totalQuestions","duration","startedAt","completedAt"
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&input.session_type)
    .bind(words)
    .bind(input.correct_answers)
    .bind(input.total_questions)
    .bind(input.duration)
    .bind(input.started_at)
    .bind(input.completed_at)
    .fetch_one(proxy.pool())
    .await?;
    map_session_row(&row)
}

#[derive(Debug, Clone, Default)]
pub struct SessionAggregate {
    pub sessions: i64,
    pub correct_answers: i64,
    pub total_questions: i64,
    pub duration_seconds: i64,
    pub words_studied: i64,
}

/// Aggregates completed sessions started at or after `since`.
pub async fn aggregate_since(
    proxy: &DatabaseProxy,
    user_id: &str,
    since: NaiveDateTime,
) -> Result<SessionAggregate, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS "sessions",
            COALESCE(SUM("correctAnswers"), 0)::BIGINT AS "correctAnswers",
            COALESCE(SUM("totalQuestions"), 0)::BIGINT AS "totalQuestions",
            COALESCE(SUM("duration"), 0)::BIGINT AS "duration",
            COALESCE(SUM(jsonb_array_length("wordsStudied")), 0)::BIGINT AS "wordsStudied"
        FROM "study_sessions"
        WHERE "userId" = $1 AND "startedAt" >= $2 AND "completedAt" IS NOT NULL
        "#,
    )
    .bind(user_id)
    .bind(since)
    .fetch_one(proxy.pool())
    .await?;

    Ok(SessionAggregate {
        sessions: row.try_get("sessions")?,
        correct_answers: row.try_get("correctAnswers")?,
        total_questions: row.try_get("totalQuestions")?,
        duration_seconds: row.try_get("duration")?,
        words_studied: row.try_get("wordsStudied")?,
    })
}

/// Drops sessions that were started but never completed. Run by the cleanup
/// worker so abandoned sessions do not pollute the stats.
pub async fn delete_stale_unfinished(
    proxy: &DatabaseProxy,
    cutoff: NaiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM "study_sessions"
        WHERE "completedAt" IS NULL AND "startedAt" < $1
        "#,
    )
    .bind(cutoff)
    .execute(proxy.pool())
    .await?;
    Ok(result.rows_affected())
}

pub async fn count_sessions(proxy: &DatabaseProxy, user_id: &str) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(r#"SELECT COUNT(*) AS "count" FROM "study_sessions" WHERE "userId" = $1"#)
        .bind(user_id)
        .fetch_one(proxy.pool())
        .await?;
    row.try_get("count")
}

pub async fn get_session(
    proxy: &DatabaseProxy,
    session_id: &str,
) -> Result<Option<StudySessionRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT "id","userId","type","wordsStudied","correctAnswers","totalQuestions","duration","startedAt","completedAt"
        FROM "study_sessions" WHERE "id" = $1 LIMIT 1
        "#,
    )
    .bind(session_id)
    .fetch_optional(proxy.pool())
    .await?;
    row.map(|r| map_session_row(&r)).transpose()
}
