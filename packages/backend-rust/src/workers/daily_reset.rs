use std::sync::Arc;

use tracing::info;

use crate::db::operations::user;
use crate::db::DatabaseProxy;
use crate::workers::WorkerError;

/// Zeroes `wordsLearnedToday` for everyone at the start of a new day. Streak
/// roll-over itself happens lazily on the next review.
pub async fn reset_daily_counters(db: Arc<DatabaseProxy>) -> Result<(), WorkerError> {
    let affected = user::reset_words_learned_today(db.as_ref()).await?;
    if affected > 0 {
        info!(users = affected, "每日学习计数已重置");
    }
    Ok(())
}
