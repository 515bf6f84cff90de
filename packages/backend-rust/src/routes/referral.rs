use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use tracing::error;

use crate::auth::AuthUser;
use crate::db::operations::referral;
use crate::db::operations::user;
use crate::response::json_error;
use crate::services::referral::{self as referral_service, ReferralServiceError};
use crate::state::AppState;

const RECENT_LIMIT: i64 = 10;

pub async fn overview(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return db_unavailable();
    };

    let user_record = match user::find_by_id(proxy.as_ref(), &auth_user.id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            return json_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "用户不存在")
                .into_response();
        }
        Err(err) => return internal(err.into()),
    };

    let code = match referral_service::ensure_referral_code(proxy.as_ref(), &user_record).await {
        Ok(code) => code,
        Err(err) => return internal(err),
    };

    let stats = match referral::referral_stats(proxy.as_ref(), &auth_user.id).await {
        Ok(stats) => stats,
        Err(err) => return internal(err.into()),
    };

    let recent = match referral::recent_referrals(proxy.as_ref(), &auth_user.id, RECENT_LIMIT).await
    {
        Ok(recent) => recent,
        Err(err) => return internal(err.into()),
    };

    Json(serde_json::json!({
        "success": true,
        "data": {
            "referralCode": code,
            "inviteLink": invite_link(&state, &code),
            "stats": stats,
            "recent": recent,
        }
    }))
    .into_response()
}

pub async fn create_invite(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return db_unavailable();
    };

    match referral_service::create_invite(proxy.as_ref(), &auth_user.id).await {
        Ok(record) => {
            let link = invite_link(&state, &record.referral_code);
            (
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "success": true,
                    "data": {
                        "referral": record,
                        "inviteLink": link,
                    }
                })),
            )
                .into_response()
        }
        Err(err) => internal(err),
    }
}

fn invite_link(state: &AppState, code: &str) -> String {
    format!("{}/register?ref={}", state.config().app_base_url, code)
}

fn db_unavailable() -> Response {
    json_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "SERVICE_UNAVAILABLE",
        "数据库服务不可用",
    )
    .into_response()
}

fn internal(err: ReferralServiceError) -> Response {
    error!(error = %err, "邀请数据操作失败");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "服务器内部错误",
    )
    .into_response()
}
