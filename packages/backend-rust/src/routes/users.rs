use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use tracing::error;

use crate::auth::AuthUser;
use crate::db::operations::referral;
use crate::response::json_error;
use crate::state::AppState;

const TRANSACTION_LIMIT: i64 = 20;

pub async fn points(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return db_unavailable();
    };

    let account = match referral::get_or_create_points(proxy.as_ref(), &auth_user.id).await {
        Ok(account) => account,
        Err(err) => return internal(err),
    };

    let transactions =
        match referral::recent_transactions(proxy.as_ref(), &auth_user.id, TRANSACTION_LIMIT).await
        {
            Ok(transactions) => transactions,
            Err(err) => return internal(err),
        };

    Json(serde_json::json!({
        "success": true,
        "data": {
            "points": account,
            "transactions": transactions,
        }
    }))
    .into_response()
}

fn db_unavailable() -> Response {
    json_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "SERVICE_UNAVAILABLE",
        "数据库服务不可用",
    )
    .into_response()
}

fn internal(err: sqlx::Error) -> Response {
    error!(error = %err, "数据库操作失败");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "服务器内部错误",
    )
    .into_response()
}
