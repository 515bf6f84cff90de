use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;

use crate::db::operations::study_session;
use crate::db::DatabaseProxy;
use crate::workers::WorkerError;

const STALE_AFTER_HOURS: i64 = 24;

/// Deletes sessions that were started but never completed, so abandoned tabs
/// do not skew the study stats.
pub async fn cleanup_stale_sessions(db: Arc<DatabaseProxy>) -> Result<(), WorkerError> {
    let cutoff = (Utc::now() - Duration::hours(STALE_AFTER_HOURS)).naive_utc();
    let deleted = study_session::delete_stale_unfinished(db.as_ref(), cutoff).await?;
    if deleted > 0 {
        info!(sessions = deleted, "已清理未完成的学习会话");
    }
    Ok(())
}
