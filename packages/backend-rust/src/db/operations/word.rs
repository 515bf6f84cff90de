use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{QueryBuilder, Row};
use uuid::Uuid;

use crate::db::operations::format_naive_iso;
use crate::db::DatabaseProxy;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordDefinition {
    pub part_of_speech: String,
    pub meaning: String,
    #[serde(default)]
    pub example: String,
    #[serde(default)]
    pub example_translation: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WordRecord {
    pub id: String,
    pub word: String,
    pub pronunciation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    pub definitions: Vec<WordDefinition>,
    pub difficulty: String,
    pub frequency: i32,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct WordFilter {
    pub difficulty: Option<String>,
    pub tags: Vec<String>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCount {
    pub name: String,
    pub count: i64,
}

// Also read back from the cache, so it needs Deserialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordCategories {
    pub total: i64,
    pub difficulties: HashMap<String, i64>,
    pub tags: Vec<TagCount>,
}

const WORD_COLUMNS: &str = r#"
    "id","word","pronunciation","audioUrl","definitions","difficulty",
    "frequency","tags","createdAt","updatedAt"
"#;

fn map_word_row(row: &PgRow) -> Result<WordRecord, sqlx::Error> {
    let definitions: serde_json::Value = row.try_get("definitions")?;
    let tags: serde_json::Value = row.try_get("tags")?;

    Ok(WordRecord {
        id: row.try_get("id")?,
        word: row.try_get("word")?,
        pronunciation: row.try_get("pronunciation")?,
        audio_url: row.try_get("audioUrl")?,
        definitions: serde_json::from_value(definitions).unwrap_or_default(),
        difficulty: row.try_get("difficulty")?,
        frequency: row.try_get("frequency")?,
        tags: serde_json::from_value(tags).unwrap_or_default(),
        created_at: format_naive_iso(row.try_get("createdAt")?),
        updated_at: format_naive_iso(row.try_get("updatedAt")?),
    })
}

fn push_filter_clauses(qb: &mut QueryBuilder<'_, sqlx::Postgres>, filter: &WordFilter) {
    if let Some(difficulty) = &filter.difficulty {
        qb.push(r#" AND "difficulty" = "#);
        qb.push_bind(difficulty.clone());
    }

    if !filter.tags.is_empty() {
        qb.push(r#" AND "tags" ?| "#);
        qb.push_bind(filter.tags.clone());
        qb.push("::text[]");
    }

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", search);
        qb.push(r#" AND ("word" ILIKE "#);
        qb.push_bind(pattern.clone());
        qb.push(r#" OR "definitions"::text ILIKE "#);
        qb.push_bind(pattern);
        qb.push(")");
    }
}

pub async fn count_words(proxy: &DatabaseProxy, filter: &WordFilter) -> Result<i64, sqlx::Error> {
    let mut qb =
        QueryBuilder::<sqlx::Postgres>::new(r#"SELECT COUNT(*) AS "count" FROM "words" WHERE 1=1"#);
    push_filter_clauses(&mut qb, filter);
    let row = qb.build().fetch_one(proxy.pool()).await?;
    row.try_get("count")
}

pub async fn list_words(
    proxy: &DatabaseProxy,
    filter: &WordFilter,
    page: i64,
    limit: i64,
) -> Result<Vec<WordRecord>, sqlx::Error> {
    let offset = (page - 1) * limit;
    let mut qb = QueryBuilder::<sqlx::Postgres>::new(format!(
        r#"SELECT {WORD_COLUMNS} FROM "words" WHERE 1=1"#
    ));
    push_filter_clauses(&mut qb, filter);
    qb.push(r#" ORDER BY "frequency" DESC, "word" ASC LIMIT "#);
    qb.push_bind(limit);
    qb.push(" OFFSET ");
    qb.push_bind(offset);

    let rows = qb.build().fetch_all(proxy.pool()).await?;
    rows.iter().map(map_word_row).collect()
}

pub async fn get_by_id(
    proxy: &DatabaseProxy,
    word_id: &str,
) -> Result<Option<WordRecord>, sqlx::Error> {
    let sql = format!(r#"SELECT {WORD_COLUMNS} FROM "words" WHERE "id" = $1 LIMIT 1"#);
    let row = sqlx::query(&sql)
        .bind(word_id)
        .fetch_optional(proxy.pool())
        .await?;
    row.map(|r| map_word_row(&r)).transpose()
}

pub async fn get_by_ids(
    proxy: &DatabaseProxy,
    word_ids: &[String],
) -> Result<Vec<WordRecord>, sqlx::Error> {
    if word_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut qb = QueryBuilder::<sqlx::Postgres>::new(format!(
        r#"SELECT {WORD_COLUMNS} FROM "words" WHERE "id" IN ("#
    ));
    {
        let mut sep = qb.separated(", ");
        for id in word_ids {
            sep.push_bind(id);
        }
    }
    qb.push(")");
    let rows = qb.build().fetch_all(proxy.pool()).await?;
    rows.iter().map(map_word_row).collect()
}

pub async fn random_words(
    proxy: &DatabaseProxy,
    count: i64,
    difficulty: Option<&str>,
) -> Result<Vec<WordRecord>, sqlx::Error> {
    let mut qb = QueryBuilder::<sqlx::Postgres>::new(format!(
        r#"SELECT {WORD_COLUMNS} FROM "words" WHERE 1=1"#
    ));
    if let Some(difficulty) = difficulty {
        qb.push(r#" AND "difficulty" = "#);
        qb.push_bind(difficulty.to_string());
    }
    qb.push(" ORDER BY RANDOM() LIMIT ");
    qb.push_bind(count);

    let rows = qb.build().fetch_all(proxy.pool()).await?;
    rows.iter().map(map_word_row).collect()
}

/// Words the user has never been exposed to, highest frequency first.
pub async fn new_words_for_user(
    proxy: &DatabaseProxy,
    user_id: &str,
    limit: i64,
) -> Result<Vec<WordRecord>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {WORD_COLUMNS} FROM "words" w
        WHERE NOT EXISTS (
            SELECT 1 FROM "user_word_progress" p
            WHERE p."userId" = $1 AND p."wordId" = w."id"
        )
        ORDER BY "frequency" DESC, "word" ASC
        LIMIT $2
        "#
    );
    let rows = sqlx::query(&sql)
        .bind(user_id)
        .bind(limit)
        .fetch_all(proxy.pool())
        .await?;
    rows.iter().map(map_word_row).collect()
}

pub async fn word_exists(proxy: &DatabaseProxy, word: &str) -> Result<bool, sqlx::Error> {
    let row = sqlx::query(r#"SELECT 1 AS "one" FROM "words" WHERE "word" = $1 LIMIT 1"#)
        .bind(word)
        .fetch_optional(proxy.pool())
        .await?;
    Ok(row.is_some())
}

pub struct CreateWordInput {
    pub word: String,
    pub pronunciation: String,
    pub audio_url: Option<String>,
    pub definitions: Vec<WordDefinition>,
    pub difficulty: String,
    pub frequency: i32,
    pub tags: Vec<String>,
}

pub async fn create_word(
    proxy: &DatabaseProxy,
    input: &CreateWordInput,
) -> Result<WordRecord, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().naive_utc();
    let definitions = serde_json::to_value(&input.definitions).unwrap_or_default();
    let tags = serde_json::to_value(&input.tags).unwrap_or_default();

    let sql = format!(
        r#"
        INSERT INTO "words"
            ("id","word","pronunciation","audioUrl","definitions","difficulty","frequency","tags","createdAt","updatedAt")
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
        RETURNING {WORD_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(&id)
        .bind(&input.word)
        .bind(&input.pronunciation)
        .bind(&input.audio_url)
        .bind(definitions)
        .bind(&input.difficulty)
        .bind(input.frequency)
        .bind(tags)
        .bind(now)
        .fetch_one(proxy.pool())
        .await?;
    map_word_row(&row)
}

pub async fn count_all_words(proxy: &DatabaseProxy) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(r#"SELECT COUNT(*) AS "count" FROM "words""#)
        .fetch_one(proxy.pool())
        .await?;
    row.try_get("count")
}

pub async fn categories(proxy: &DatabaseProxy) -> Result<WordCategories, sqlx::Error> {
    let total = count_all_words(proxy).await?;

    let difficulty_rows = sqlx::query(
        r#"
        SELECT "difficulty", COUNT(*) AS "count"
        FROM "words"
        GROUP BY "difficulty"
        "#,
    )
    .fetch_all(proxy.pool())
    .await?;

    let mut difficulties = HashMap::new();
    for row in &difficulty_rows {
        let difficulty: String = row.try_get("difficulty")?;
        let count: i64 = row.try_get("count")?;
        difficulties.insert(difficulty, count);
    }

    let tag_rows = sqlx::query(
        r#"
        SELECT "tag", COUNT(*) AS "count"
        FROM "words", jsonb_array_elements_text("tags") AS "tag"
        GROUP BY "tag"
        ORDER BY "count" DESC
        "#,
    )
    .fetch_all(proxy.pool())
    .await?;

    let mut tags = Vec::with_capacity(tag_rows.len());
    for row in &tag_rows {
        tags.push(TagCount {
            name: row.try_get("tag")?,
            count: row.try_get("count")?,
        });
    }

    Ok(WordCategories {
        total,
        difficulties,
        tags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_payload_survives_cache_round_trip() {
        let payload = WordCategories {
            total: 42,
            difficulties: HashMap::from([("easy".to_string(), 30), ("hard".to_string(), 12)]),
            tags: vec![TagCount {
                name: "CET4".to_string(),
                count: 25,
            }],
        };

        let json = serde_json::to_string(&payload).unwrap();
        let restored: WordCategories = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.total, 42);
        assert_eq!(restored.difficulties.get("easy"), Some(&30));
        assert_eq!(restored.tags[0].name, "CET4");
        assert_eq!(restored.tags[0].count, 25);
    }
}
