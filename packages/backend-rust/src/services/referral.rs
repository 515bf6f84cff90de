use rand::Rng;
use thiserror::Error;
use tracing::info;

use crate::db::operations::referral::{self, ReferralRecord};
use crate::db::operations::user::{self, UserRecord};
use crate::db::DatabaseProxy;

const CODE_PREFIX: &str = "WM";
const CODE_SUFFIX_LEN: usize = 8;
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

#[derive(Debug, Error)]
pub enum ReferralServiceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Invite code, e.g. `WM7K2P9QRT`. The alphabet drops easily confused
/// characters (0/O, 1/I).
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..CODE_SUFFIX_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("{CODE_PREFIX}{suffix}")
}

/// Returns the user's personal referral code, minting one on first use.
pub async fn ensure_referral_code(
    proxy: &DatabaseProxy,
    user_record: &UserRecord,
) -> Result<String, ReferralServiceError> {
    if let Some(code) = &user_record.referral_code {
        return Ok(code.clone());
    }
    let code = generate_code();
    user::set_referral_code(proxy, &user_record.id, &code).await?;
    Ok(code)
}

/// Mints a fresh pending referral the user can hand out as an invite link.
pub async fn create_invite(
    proxy: &DatabaseProxy,
    user_id: &str,
) -> Result<ReferralRecord, ReferralServiceError> {
    let code = generate_code();
    let record = referral::create_referral(proxy, user_id, &code).await?;
    Ok(record)
}

/// Called during registration when the new user arrived with a referral code.
/// Completes the matching pending referral and credits the referrer in one
/// transaction, so a failed credit rolls the completion back instead of
/// leaving the referral stuck without points. A stale or unknown code is
/// ignored so registration never fails because of it.
pub async fn redeem_on_register(
    proxy: &DatabaseProxy,
    code: &str,
    referee_id: &str,
) -> Result<(), ReferralServiceError> {
    let Some(pending) = referral::find_pending_by_code(proxy, code).await? else {
        info!(code, "忽略无效的邀请码");
        return Ok(());
    };
    if pending.referrer_id == referee_id {
        return Ok(());
    }

    let mut tx = proxy.pool().begin().await?;
    if !referral::complete_referral(&mut tx, &pending.id, referee_id).await? {
        // Another registration raced us to this referral.
        tx.rollback().await?;
        return Ok(());
    }
    referral::add_points(
        &mut tx,
        &pending.referrer_id,
        pending.reward_points,
        "邀请好友注册",
        Some(&pending.id),
    )
    .await?;
    referral::mark_rewarded(&mut tx, &pending.id).await?;
    tx.commit().await?;

    info!(
        referrer = %pending.referrer_id,
        referee = %referee_id,
        points = pending.reward_points,
        "邀请奖励已发放"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_have_prefix_and_clean_alphabet() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), CODE_PREFIX.len() + CODE_SUFFIX_LEN);
            assert!(code.starts_with(CODE_PREFIX));
            for ch in code[CODE_PREFIX.len()..].chars() {
                assert!(CODE_ALPHABET.contains(&(ch as u8)), "unexpected char {ch}");
                assert!(!"01OI".contains(ch));
            }
        }
    }
}
