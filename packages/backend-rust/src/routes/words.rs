use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::auth::AuthUser;
use crate::cache::keys;
use crate::db::operations::word::{
    self, CreateWordInput, WordCategories, WordDefinition, WordFilter, WordRecord,
};
use crate::response::json_error;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;
const DEFAULT_RANDOM_COUNT: i64 = 10;
const MAX_RANDOM_COUNT: i64 = 50;

const DIFFICULTIES: &[&str] = &["easy", "medium", "hard"];

#[derive(Deserialize)]
pub struct ListQuery {
    page: Option<i64>,
    limit: Option<i64>,
    difficulty: Option<String>,
    /// Comma-separated tag list.
    tags: Option<String>,
    search: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    success: bool,
    data: ListData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListData {
    words: Vec<WordRecord>,
    total: i64,
    page: i64,
    limit: i64,
    total_pages: i64,
}

pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return db_unavailable();
    };

    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    if let Some(difficulty) = &query.difficulty {
        if !DIFFICULTIES.contains(&difficulty.as_str()) {
            return json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "难度等级无效")
                .into_response();
        }
    }

    let filter = WordFilter {
        difficulty: query.difficulty,
        tags: query
            .tags
            .as_deref()
            .map(parse_tags)
            .unwrap_or_default(),
        search: query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    };

    let total = match word::count_words(proxy.as_ref(), &filter).await {
        Ok(total) => total,
        Err(err) => return internal(err),
    };
    let words = match word::list_words(proxy.as_ref(), &filter, page, limit).await {
        Ok(words) => words,
        Err(err) => return internal(err),
    };

    Json(ListResponse {
        success: true,
        data: ListData {
            words,
            total,
            page,
            limit,
            total_pages: (total + limit - 1) / limit,
        },
    })
    .into_response()
}

#[derive(Deserialize)]
pub struct RandomQuery {
    count: Option<i64>,
    difficulty: Option<String>,
}

pub async fn random(State(state): State<AppState>, Query(query): Query<RandomQuery>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return db_unavailable();
    };

    let count = query
        .count
        .unwrap_or(DEFAULT_RANDOM_COUNT)
        .clamp(1, MAX_RANDOM_COUNT);

    if let Some(difficulty) = &query.difficulty {
        if !DIFFICULTIES.contains(&difficulty.as_str()) {
            return json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "难度等级无效")
                .into_response();
        }
    }

    match word::random_words(proxy.as_ref(), count, query.difficulty.as_deref()).await {
        Ok(words) => Json(serde_json::json!({ "success": true, "data": words })).into_response(),
        Err(err) => internal(err),
    }
}

pub async fn categories(State(state): State<AppState>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return db_unavailable();
    };

    if let Some(cache) = state.cache() {
        if let Some(cached) = cache.get::<WordCategories>(keys::word_categories_key()).await {
            return Json(serde_json::json!({ "success": true, "data": cached })).into_response();
        }
    }

    let categories = match word::categories(proxy.as_ref()).await {
        Ok(categories) => categories,
        Err(err) => return internal(err),
    };

    if let Some(cache) = state.cache() {
        cache
            .set(
                keys::word_categories_key(),
                &categories,
                keys::WORD_CATEGORIES_TTL,
            )
            .await;
    }

    Json(serde_json::json!({ "success": true, "data": categories })).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWordRequest {
    word: String,
    #[serde(default)]
    pronunciation: String,
    audio_url: Option<String>,
    #[serde(default)]
    definitions: Vec<WordDefinition>,
    difficulty: Option<String>,
    #[serde(default)]
    frequency: i32,
    #[serde(default)]
    tags: Vec<String>,
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateWordRequest>,
) -> Response {
    let word_text = payload.word.trim().to_lowercase();
    if word_text.is_empty() || payload.definitions.is_empty() {
        return json_error(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            "单词和释义不能为空",
        )
        .into_response();
    }

    let difficulty = payload.difficulty.unwrap_or_else(|| "medium".to_string());
    if !DIFFICULTIES.contains(&difficulty.as_str()) {
        return json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "难度等级无效")
            .into_response();
    }

    let Some(proxy) = state.db_proxy() else {
        return db_unavailable();
    };

    match word::word_exists(proxy.as_ref(), &word_text).await {
        Ok(true) => {
            return json_error(StatusCode::CONFLICT, "WORD_EXISTS", "该单词已存在")
                .into_response();
        }
        Ok(false) => {}
        Err(err) => return internal(err),
    }

    let input = CreateWordInput {
        word: word_text,
        pronunciation: payload.pronunciation.trim().to_string(),
        audio_url: payload.audio_url,
        definitions: payload.definitions,
        difficulty,
        frequency: payload.frequency.max(0),
        tags: payload.tags,
    };

    let record = match word::create_word(proxy.as_ref(), &input).await {
        Ok(record) => record,
        Err(err) => return internal(err),
    };

    // categories payload changed, drop the cached copy
    if let Some(cache) = state.cache() {
        cache.delete(keys::word_categories_key()).await;
    }

    info!(word = %record.word, user = %auth_user.id, "新增单词");
    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true, "data": record })),
    )
        .into_response()
}

fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_trims_tag_list() {
        assert_eq!(parse_tags("cet4, toefl ,"), vec!["cet4", "toefl"]);
        assert!(parse_tags(" , ").is_empty());
    }
}
