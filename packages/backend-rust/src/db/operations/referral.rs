use chrono::{NaiveDateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, Row};
use uuid::Uuid;

use crate::db::operations::format_naive_iso;
use crate::db::DatabaseProxy;

/// Base reward credited to the referrer for a successful invite.
pub const REFERRAL_REWARD_POINTS: i32 = 50;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralRecord {
    pub id: String,
    pub referrer_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referee_id: Option<String>,
    pub referral_code: String,
    pub status: String,
    pub reward_points: i32,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rewarded_at: Option<String>,
}

const REFERRAL_COLUMNS: &str = r#"
    "id","referrerId","refereeId","referralCode","status","rewardPoints",
    "createdAt","completedAt","rewardedAt"
"#;

fn map_referral_row(row: &PgRow) -> Result<ReferralRecord, sqlx::Error> {
    let completed_at: Option<NaiveDateTime> = row.try_get("completedAt")?;
    let rewarded_at: Option<NaiveDateTime> = row.try_get("rewardedAt")?;
    Ok(ReferralRecord {
        id: row.try_get("id")?,
        referrer_id: row.try_get("referrerId")?,
        referee_id: row.try_get("refereeId")?,
        referral_code: row.try_get("referralCode")?,
        status: row.try_get("status")?,
        reward_points: row.try_get("rewardPoints")?,
        created_at: format_naive_iso(row.try_get("createdAt")?),
        completed_at: completed_at.map(format_naive_iso),
        rewarded_at: rewarded_at.map(format_naive_iso),
    })
}

pub async fn create_referral(
    proxy: &DatabaseProxy,
    referrer_id: &str,
    code: &str,
) -> Result<ReferralRecord, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().naive_utc();
    let sql = format!(
        r#"
        INSERT INTO "referrals" ("id","referrerId","referralCode","status","rewardPoints","createdAt")
        VALUES ($1, $2, $3, 'pending', $4, $5)
        RETURNING {REFERRAL_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(&id)
        .bind(referrer_id)
        .bind(code)
        .bind(REFERRAL_REWARD_POINTS)
        .bind(now)
        .fetch_one(proxy.pool())
        .await?;
    map_referral_row(&row)
}

pub async fn find_pending_by_code(
    proxy: &DatabaseProxy,
    code: &str,
) -> Result<Option<ReferralRecord>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {REFERRAL_COLUMNS} FROM "referrals"
        WHERE "referralCode" = $1 AND "status" = 'pending'
        LIMIT 1
        "#
    );
    let row = sqlx::query(&sql)
        .bind(code)
        .fetch_optional(proxy.pool())
        .await?;
    row.map(|r| map_referral_row(&r)).transpose()
}

/// Marks a pending referral as completed. Runs on the caller's connection so
/// the redeem flow can keep completion, crediting, and the reward mark in one
/// transaction. Returns false when the row was no longer pending.
pub async fn complete_referral(
    conn: &mut PgConnection,
    referral_id: &str,
    referee_id: &str,
) -> Result<bool, sqlx::Error> {
    let now = Utc::now().naive_utc();
    let result = sqlx::query(
        r#"
        UPDATE "referrals"
        SET "refereeId" = $2, "status" = 'completed', "completedAt" = $3
        WHERE "id" = $1 AND "status" = 'pending'
        "#,
    )
    .bind(referral_id)
    .bind(referee_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_rewarded(
    conn: &mut PgConnection,
    referral_id: &str,
) -> Result<(), sqlx::Error> {
    let now = Utc::now().naive_utc();
    sqlx::query(
        r#"
        UPDATE "referrals"
        SET "status" = 'rewarded', "rewardedAt" = $2
        WHERE "id" = $1 AND "status" = 'completed'
        "#,
    )
    .bind(referral_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralStats {
    pub total_invites: i64,
    pub successful_invites: i64,
    pub pending_invites: i64,
    pub total_rewards: i64,
}

pub async fn referral_stats(
    proxy: &DatabaseProxy,
    referrer_id: &str,
) -> Result<ReferralStats, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT "status", COUNT(*) AS "count", COALESCE(SUM("rewardPoints"), 0)::BIGINT AS "rewards"
        FROM "referrals"
        WHERE "referrerId" = $1
        GROUP BY "status"
        "#,
    )
    .bind(referrer_id)
    .fetch_all(proxy.pool())
    .await?;

    let mut stats = ReferralStats::default();
    for row in &rows {
        let status: String = row.try_get("status")?;
        let count: i64 = row.try_get("count")?;
        stats.total_invites += count;
        match status.as_str() {
            "pending" => stats.pending_invites = count,
            "completed" | "rewarded" => {
                stats.successful_invites += count;
                let rewards: i64 = row.try_get("rewards")?;
                stats.total_rewards += rewards;
            }
            _ => {}
        }
    }
    Ok(stats)
}

pub async fn recent_referrals(
    proxy: &DatabaseProxy,
    referrer_id: &str,
    limit: i64,
) -> Result<Vec<ReferralRecord>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {REFERRAL_COLUMNS} FROM "referrals"
        WHERE "referrerId" = $1
        ORDER BY "createdAt" DESC
        LIMIT $2
        "#
    );
    let rows = sqlx::query(&sql)
        .bind(referrer_id)
        .bind(limit)
        .fetch_all(proxy.pool())
        .await?;
    rows.iter().map(map_referral_row).collect()
}

// ==================== Points ====================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsAccount {
    pub user_id: String,
    pub total_points: i32,
    pub available_points: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointTransaction {
    pub id: String,
    pub r#type: String,
    pub amount: i32,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_id: Option<String>,
    pub created_at: String,
}

async fn upsert_points_account(
    conn: &mut PgConnection,
    user_id: &str,
) -> Result<PointsAccount, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().naive_utc();
    let row = sqlx::query(
        r#"
        INSERT INTO "user_points" ("id","userId","createdAt","updatedAt")
        VALUES ($1, $2, $3, $3)
        ON CONFLICT ("userId") DO UPDATE SET "updatedAt" = "user_points"."updatedAt"
        RETURNING "userId","totalPoints","availablePoints"
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(PointsAccount {
        user_id: row.try_get("userId")?,
        total_points: row.try_get("totalPoints")?,
        available_points: row.try_get("availablePoints")?,
    })
}

pub async fn get_or_create_points(
    proxy: &DatabaseProxy,
    user_id: &str,
) -> Result<PointsAccount, sqlx::Error> {
    let mut conn = proxy.pool().acquire().await?;
    upsert_points_account(&mut conn, user_id).await
}

/// Credits points and records the transaction in the ledger. All writes go
/// through the caller's connection so they join its transaction.
pub async fn add_points(
    conn: &mut PgConnection,
    user_id: &str,
    amount: i32,
    reason: &str,
    referral_id: Option<&str>,
) -> Result<(), sqlx::Error> {
    upsert_points_account(&mut *conn, user_id).await?;

    let now = Utc::now().naive_utc();
    sqlx::query(
        r#"
        UPDATE "user_points"
        SET "totalPoints" = "totalPoints" + $2,
            "availablePoints" = "availablePoints" + $2,
            "updatedAt" = $3
        WHERE "userId" = $1
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO "point_transactions" ("id","userId","type","amount","reason","referralId","createdAt")
        VALUES ($1, $2, 'earn', $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(amount)
    .bind(reason)
    .bind(referral_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn recent_transactions(
    proxy: &DatabaseProxy,
    user_id: &str,
    limit: i64,
) -> Result<Vec<PointTransaction>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT "id","type","amount","reason","referralId","createdAt"
        FROM "point_transactions"
        WHERE "userId" = $1
        ORDER BY "createdAt" DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(proxy.pool())
    .await?;

    let mut out = Vec::with_capacity(rows.len());
    for row in &rows {
        out.push(PointTransaction {
            id: row.try_get("id")?,
            r#type: row.try_get("type")?,
            amount: row.try_get("amount")?,
            reason: row.try_get("reason")?,
            referral_id: row.try_get("referralId")?,
            created_at: format_naive_iso(row.try_get("createdAt")?),
        });
    }
    Ok(out)
}
