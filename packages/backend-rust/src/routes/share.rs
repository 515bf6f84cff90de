use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use tracing::error;

use crate::auth::AuthUser;
use crate::db::operations::share::{self, CreateShareInput};
use crate::response::json_error;
use crate::state::AppState;

const SHARE_TYPES: &[&str] = &["achievement", "progress", "word_card", "study_report"];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareRequest {
    #[serde(rename = "type")]
    share_type: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    platform: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateShareRequest>,
) -> Response {
    if !SHARE_TYPES.contains(&payload.share_type.as_str()) {
        return json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "分享类型无效")
            .into_response();
    }

    let Some(proxy) = state.db_proxy() else {
        return db_unavailable();
    };

    let input = CreateShareInput {
        share_type: payload.share_type,
        title: payload.title.trim().to_string(),
        description: payload.description.trim().to_string(),
        platform: payload.platform.unwrap_or_else(|| "link".to_string()),
    };

    match share::insert_share(proxy.as_ref(), &auth_user.id, &input).await {
        Ok(record) => {
            let link = format!("{}/share/{}", state.config().app_base_url, record.id);
            (
                StatusCode::CREATED,
                Json(serde_json::json!({
                    "success": true,
                    "data": {
                        "share": record,
                        "shareLink": link,
                    }
                })),
            )
                .into_response()
        }
        Err(err) => internal(err),
    }
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
