use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::db::operations::format_naive_iso;
use crate::db::DatabaseProxy;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub referral_code: Option<String>,
    pub referred_by: Option<String>,
    pub daily_goal: i32,
    pub theme: String,
    pub language: String,
    pub total_words: i32,
    pub mastered_words: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub total_study_time: i32,
    pub words_learned_today: i32,
    pub last_study_date: Option<NaiveDate>,
    pub last_login_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub daily_goal: i32,
    pub theme: String,
    pub language: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_words: i32,
    pub mastered_words: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub total_study_time: i32,
    pub words_learned_today: i32,
}

/// User shape returned to clients, password hash stripped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
    pub settings: UserSettings,
    pub stats: UserStats,
    pub created_at: String,
    pub updated_at: String,
}

impl UserRecord {
    pub fn sanitize(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            email: self.email.clone(),
            username: self.username.clone(),
            referral_code: self.referral_code.clone(),
            settings: UserSettings {
                daily_goal: self.daily_goal,
                theme: self.theme.clone(),
                language: self.language.clone(),
            },
            stats: UserStats {
                total_words: self.total_words,
                mastered_words: self.mastered_words,
                current_streak: self.current_streak,
                longest_streak: self.longest_streak,
                total_study_time: self.total_study_time,
                words_learned_today: self.words_learned_today,
            },
            created_at: format_naive_iso(self.created_at),
            updated_at: format_naive_iso(self.updated_at),
        }
    }
}

const USER_COLUMNS: &str = r#"
    "id","email","username","passwordHash","referralCode","referredBy",
    "dailyGoal","theme","language",
    "totalWords","masteredWords","currentStreak","longestStreak",
    "totalStudyTime","wordsLearnedToday","lastStudyDate","lastLoginAt",
    "createdAt","updatedAt"
"#;

fn map_user_row(row: &PgRow) -> Result<UserRecord, sqlx::Error> {
    Ok(UserRecord {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("passwordHash")?,
        referral_code: row.try_get("referralCode")?,
        referred_by: row.try_get("referredBy")?,
        daily_goal: row.try_get("dailyGoal")?,
        theme: row.try_get("theme")?,
        language: row.try_get("language")?,
        total_words: row.try_get("totalWords")?,
        mastered_words: row.try_get("masteredWords")?,
        current_streak: row.try_get("currentStreak")?,
        longest_streak: row.try_get("longestStreak")?,
        total_study_time: row.try_get("totalStudyTime")?,
        words_learned_today: row.try_get("wordsLearnedToday")?,
        last_study_date: row.try_get("lastStudyDate")?,
        last_login_at: row.try_get("lastLoginAt")?,
        created_at: row.try_get("createdAt")?,
        updated_at: row.try_get("updatedAt")?,
    })
}

pub async fn find_by_id(
    proxy: &DatabaseProxy,
    user_id: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let sql = format!(r#"SELECT {USER_COLUMNS} FROM "users" WHERE "id" = $1 LIMIT 1"#);
    let row = sqlx::query(&sql)
        .bind(user_id)
        .fetch_optional(proxy.pool())
        .await?;
    row.map(|r| map_user_row(&r)).transpose()
}

pub async fn find_by_email(
    proxy: &DatabaseProxy,
    email: &str,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let sql = format!(r#"SELECT {USER_COLUMNS} FROM "users" WHERE "email" = $1 LIMIT 1"#);
    let row = sqlx::query(&sql)
        .bind(email)
        .fetch_optional(proxy.pool())
        .await?;
    row.map(|r| map_user_row(&r)).transpose()
}

pub async fn username_exists(proxy: &DatabaseProxy, username: &str) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(r#"SELECT 1 AS "one" FROM "users" WHERE "username" = $1 LIMIT 1"#)
        .bind(username)
        .fetch_optional(proxy.pool())
        .await?;
    Ok(row.is_some())
}

pub async fn create_user(
    proxy: &DatabaseProxy,
    email: &str,
    username: &str,
    password_hash: &str,
    referred_by: Option<&str>,
) -> Result<UserRecord, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().naive_utc();
    let sql = format!(
        r#"
        INSERT INTO "users" ("id","email","username","passwordHash","referredBy","createdAt","updatedAt")
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING {USER_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(&id)
        .bind(email)
        .bind(username)
        .bind(password_hash)
        .bind(referred_by)
        .bind(now)
        .fetch_one(proxy.pool())
        .await?;
    map_user_row(&row)
}

pub async fn update_last_login(proxy: &DatabaseProxy, user_id: &str) -> Result<(), sqlx::Error> {
    let now = Utc::now().naive_utc();
    sqlx::query(r#"UPDATE "users" SET "lastLoginAt" = $2, "updatedAt" = $2 WHERE "id" = $1"#)
        .bind(user_id)
        .bind(now)
        .execute(proxy.pool())
        .await?;
    Ok(())
}

pub async fn set_referral_code(
    proxy: &DatabaseProxy,
    user_id: &str,
    code: &str,
) -> Result<(), sqlx::Error> {
    let now = Utc::now().naive_utc();
    sqlx::query(r#"UPDATE "users" SET "referralCode" = $2, "updatedAt" = $3 WHERE "id" = $1"#)
        .bind(user_id)
        .bind(code)
        .bind(now)
        .execute(proxy.pool())
        .await?;
    Ok(())
}

/// Absolute stats values written after a review event; the caller computes
/// deltas and streak roll-over against a freshly loaded record.
#[derive(Debug, Clone)]
pub struct ReviewStatsUpdate {
    pub total_words: i32,
    pub mastered_words: i32,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub words_learned_today: i32,
    pub last_study_date: NaiveDate,
}

pub async fn update_review_stats(
    proxy: &DatabaseProxy,
    user_id: &str,
    stats: &ReviewStatsUpdate,
) -> Result<(), sqlx::Error> {
    let now = Utc::now().naive_utc();
    sqlx::query(
        r#"
        UPDATE "users" SET
            "totalWords" = $2,
            "masteredWords" = $3,
            "currentStreak" = $4,
            "longestStreak" = $5,
            "wordsLearnedToday" = $6,
            "lastStudyDate" = $7,
            "updatedAt" = $8
        WHERE "id" = $1
        "#,
    )
    .bind(user_id)
    .bind(stats.total_words)
    .bind(stats.mastered_words)
    .bind(stats.current_streak)
    .bind(stats.longest_streak)
    .bind(stats.words_learned_today)
    .bind(stats.last_study_date)
    .bind(now)
    .execute(proxy.pool())
    .await?;
    Ok(())
}

pub async fn add_study_time(
    proxy: &DatabaseProxy,
    user_id: &str,
    seconds: i32,
) -> Result<(), sqlx::Error> {
    let now = Utc::now().naive_utc();
    sqlx::query(
        r#"
        UPDATE "users"
        SET "totalStudyTime" = "totalStudyTime" + $2, "updatedAt" = $3
        WHERE "id" = $1
        "#,
    )
    .bind(user_id)
    .bind(seconds)
    .bind(now)
    .execute(proxy.pool())
    .await?;
    Ok(())
}

pub async fn reset_words_learned_today(proxy: &DatabaseProxy) -> Result<u64, sqlx::Error> {
    let now = Utc::now().naive_utc();
    let result = sqlx::query(
        r#"
        UPDATE "users"
        SET "wordsLearnedToday" = 0, "updatedAt" = $1
        WHERE "wordsLearnedToday" > 0
        "#,
    )
    .bind(now)
    .execute(proxy.pool())
    .await?;
    Ok(result.rows_affected())
}
