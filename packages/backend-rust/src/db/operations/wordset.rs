use chrono::Utc;
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::db::operations::format_naive_iso;
use crate::db::DatabaseProxy;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordSetRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub words: Vec<String>,
    pub word_count: usize,
    pub is_public: bool,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

const WORDSET_COLUMNS: &str = r#"
    "id","name","description","category","words","isPublic","createdBy",
    "createdAt","updatedAt"
"#;

fn map_wordset_row(row: &PgRow) -> Result<WordSetRecord, sqlx::Error> {
    let words: serde_json::Value = row.try_get("words")?;
    let words: Vec<String> = serde_json::from_value(words).unwrap_or_default();
    Ok(WordSetRecord {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        category: row.try_get("category")?,
        word_count: words.len(),
        words,
        is_public: row.try_get("isPublic")?,
        created_by: row.try_get("createdBy")?,
        created_at: format_naive_iso(row.try_get("createdAt")?),
        updated_at: format_naive_iso(row.try_get("updatedAt")?),
    })
}

/// Sets visible to the user: their own plus everything public.
pub async fn list_visible(
    proxy: &DatabaseProxy,
    user_id: &str,
) -> Result<Vec<WordSetRecord>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {WORDSET_COLUMNS} FROM "word_sets"
        WHERE "createdBy" = $1 OR "isPublic" = TRUE
        ORDER BY "createdAt" DESC
        "#
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .fetch_all(proxy.pool())
        .await?;
    rows.iter().map(map_wordset_row).collect()
}

pub struct CreateWordSetInput {
    pub name: String,
    pub description: String,
    pub category: String,
    pub words: Vec<String>,
    pub is_public: bool,
}

pub async fn create_wordset(
    proxy: &DatabaseProxy,
    user_id: &str,
    input: &CreateWordSetInput,
) -> Result<WordSetRecord, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().naive_utc();
    let words = serde_json::to_value(&input.words).unwrap_or_default();
    let sql = format!(
        r#"
        INSERT INTO "word_sets"
            ("id","name","description","category","words","isPublic","createdBy","createdAt","updatedAt")
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
        RETURNING {WORDSET_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(&id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.category)
        .bind(words)
        .bind(input.is_public)
        .bind(user_id)
        .bind(now)
        .fetch_one(proxy.pool())
        .await?;
    map_wordset_row(&row)
}
