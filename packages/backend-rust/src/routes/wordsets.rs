use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use tracing::error;

use crate::auth::AuthUser;
use crate::db::operations::wordset::{self, CreateWordSetInput};
use crate::response::json_error;
use crate::state::AppState;

const CATEGORIES: &[&str] = &["CET4", "CET6", "TOEFL", "IELTS", "GRE", "custom"];

pub async fn list(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return db_unavailable();
    };

    match wordset::list_visible(proxy.as_ref(), &auth_user.id).await {
        Ok(sets) => Json(serde_json::json!({ "success": true, "data": sets })).into_response(),
        Err(err) => internal(err),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWordSetRequest {
    name: String,
    #[serde(default)]
    description: String,
    category: Option<String>,
    #[serde(default)]
    words: Vec<String>,
    #[serde(default)]
    is_public: bool,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateWordSetRequest>,
) -> Response {
    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "词书名称不能为空",
        )
        .into_response();
    }

    let category = payload.category.unwrap_or_else(|| "custom".to_string());
    if !CATEGORIES.contains(&category.as_str()) {
        return json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "词书分类无效")
            .into_response();
    }

    let Some(proxy) = state.db_proxy() else {
        return db_unavailable();
    };

    let input = CreateWordSetInput {
        name,
        description: payload.description.trim().to_string(),
        category,
        words: payload.words,
        is_public: payload.is_public,
    };

    match wordset::create_wordset(proxy.as_ref(), &auth_user.id, &input).await {
        Ok(record) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "success": true, "data": record })),
        )
            .into_response(),
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
