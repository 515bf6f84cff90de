use chrono::Utc;
use serde::Serialize;
use sqlx::Row;
use uuid::Uuid;

use crate::db::operations::format_naive_iso;
use crate::db::DatabaseProxy;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareRecord {
    pub id: String,
    pub user_id: String,
    pub r#type: String,
    pub title: String,
    pub description: String,
    pub platform: String,
    pub clicks: i32,
    pub conversions: i32,
    pub created_at: String,
}

pub struct CreateShareInput {
    pub share_type: String,
    pub title: String,
    pub description: String,
    pub platform: String,
}

pub async fn insert_share(
    proxy: &DatabaseProxy,
    user_id: &str,
    input: &CreateShareInput,
) -> Result<ShareRecord, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().naive_utc();
    let row = sqlx::query(
        r#"
        INSERT INTO "shares" ("id","userId","type","title","description","platform","createdAt")
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING "id","userId","type","title","description","platform","clicks","conversions","createdAt"
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&input.share_type)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.platform)
    .bind(now)
    .fetch_one(proxy.pool())
    .await?;

    Ok(ShareRecord {
        id: row.try_get("id")?,
        user_id: row.try_get("userId")?,
        r#type: row.try_get("type")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        platform: row.try_get("platform")?,
        clicks: row.try_get("clicks")?,
        conversions: row.try_get("conversions")?,
        created_at: format_naive_iso(row.try_get("createdAt")?),
    })
}
