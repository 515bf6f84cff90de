use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use wordmaster_algo::accuracy_percent;

use crate::auth::AuthUser;
use crate::db::operations::progress::{self, ProgressRecord};
use crate::db::operations::study_session::{self, CreateSessionInput, SessionAggregate};
use crate::db::operations::user;
use crate::db::operations::word::{self, WordRecord};
use crate::db::operations::format_naive_iso;
use crate::response::json_error;
use crate::services::review::{self, ReviewError};
use crate::state::AppState;

const DEFAULT_QUEUE_LIMIT: i64 = 20;
const MAX_QUEUE_LIMIT: i64 = 50;

const SESSION_TYPES: &[&str] = &["daily_practice", "review", "quiz", "challenge"];

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProgressView {
    id: String,
    word_id: String,
    status: &'static str,
    correct_count: i32,
    incorrect_count: i32,
    last_reviewed_at: String,
    next_review_at: String,
    difficulty: f64,
}

impl ProgressView {
    fn from_record(record: &ProgressRecord) -> Self {
        Self {
            id: record.id.clone(),
            word_id: record.word_id.clone(),
            status: record.status.as_str(),
            correct_count: record.correct_count,
            incorrect_count: record.incorrect_count,
            last_reviewed_at: format_naive_iso(record.last_reviewed_at),
            next_review_at: format_naive_iso(record.next_review_at),
            difficulty: record.difficulty,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StudyCard {
    word: WordRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    progress: Option<ProgressView>,
    is_new: bool,
}

#[derive(Deserialize)]
pub struct QueueQuery {
    limit: Option<i64>,
}

pub async fn queue(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<QueueQuery>,
) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return db_unavailable();
    };

    let limit = query
        .limit
        .unwrap_or(DEFAULT_QUEUE_LIMIT)
        .clamp(1, MAX_QUEUE_LIMIT);
    let now = Utc::now().naive_utc();

    let due = match progress::list_due(proxy.as_ref(), &auth_user.id, now, limit).await {
        Ok(due) => due,
        Err(err) => return internal(err),
    };

    let due_word_ids: Vec<String> = due.iter().map(|record| record.word_id.clone()).collect();
    let due_words = match word::get_by_ids(proxy.as_ref(), &due_word_ids).await {
        Ok(words) => words,
        Err(err) => return internal(err),
    };

    let mut cards = Vec::with_capacity(limit as usize);
    // keep due order, words table may return them in any order
    for record in &due {
        if let Some(word_record) = due_words.iter().find(|w| w.id == record.word_id) {
            cards.push(StudyCard {
                word: word_record.clone(),
                progress: Some(ProgressView::from_record(record)),
                is_new: false,
            });
        }
    }
    let due_count = cards.len();

    let remaining = limit - due_count as i64;
    if remaining > 0 {
        let fresh = match word::new_words_for_user(proxy.as_ref(), &auth_user.id, remaining).await {
            Ok(fresh) => fresh,
            Err(err) => return internal(err),
        };
        for word_record in fresh {
            cards.push(StudyCard {
                word: word_record,
                progress: None,
                is_new: true,
            });
        }
    }

    let new_count = cards.len() - due_count;
    Json(serde_json::json!({
        "success": true,
        "data": {
            "cards": cards,
            "dueCount": due_count,
            "newCount": new_count,
        }
    }))
    .into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    word_id: String,
    is_correct: bool,
}

pub async fn review(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<ReviewRequest>,
) -> Response {
    if payload.word_id.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "缺少单词ID")
            .into_response();
    }

    let Some(proxy) = state.db_proxy() else {
        return db_unavailable();
    };

    let user_record = match user::find_by_id(proxy.as_ref(), &auth_user.id).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            return json_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "用户不存在")
                .into_response();
        }
        Err(err) => return internal(err),
    };

    match review::record_review(
        proxy.as_ref(),
        &user_record,
        &payload.word_id,
        payload.is_correct,
    )
    .await
    {
        Ok(record) => Json(serde_json::json!({
            "success": true,
            "data": ProgressView::from_record(&record),
        }))
        .into_response(),
        Err(ReviewError::WordNotFound) => {
            json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "单词不存在").into_response()
        }
        Err(ReviewError::Database(err)) => internal(err),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    #[serde(default, rename = "type")]
    session_type: Option<String>,
    #[serde(default)]
    words_studied: Vec<String>,
    correct_answers: i32,
    total_questions: i32,
    /// Seconds.
    duration: i32,
    started_at: Option<String>,
}

pub async fn create_session(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateSessionRequest>,
) -> Response {
    let session_type = payload
        .session_type
        .unwrap_or_else(|| "daily_practice".to_string());
    if !SESSION_TYPES.contains(&session_type.as_str()) {
        return json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "会话类型无效")
            .into_response();
    }
    if payload.correct_answers < 0
        || payload.total_questions < 0
        || payload.correct_answers > payload.total_questions
        || payload.duration < 0
    {
        return json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", "会话数据无效")
            .into_response();
    }

    let now = Utc::now();
    let started_at = match &payload.started_at {
        Some(raw) => match chrono::DateTime::parse_from_rfc3339(raw) {
            Ok(parsed) => parsed.naive_utc(),
            Err(_) => {
                return json_error(
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    "开始时间格式无效",
                )
                .into_response();
            }
        },
        None => (now - Duration::seconds(payload.duration.into())).naive_utc(),
    };

    let Some(proxy) = state.db_proxy() else {
        return db_unavailable();
    };

    let input = CreateSessionInput {
        session_type,
        words_studied: payload.words_studied,
        correct_answers: payload.correct_answers,
        total_questions: payload.total_questions,
        duration: payload.duration,
        started_at,
        completed_at: Some(now.naive_utc()),
    };

    let record = match study_session::insert_session(proxy.as_ref(), &auth_user.id, &input).await {
        Ok(record) => record,
        Err(err) => return internal(err),
    };

    if let Err(err) = user::add_study_time(proxy.as_ref(), &auth_user.id, record.duration).await {
        error!(error = %err, "累计学习时长失败");
    }

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "data": {
                "id": record.id,
                "type": record.session_type,
                "correctAnswers": record.correct_answers,
                "totalQuestions": record.total_questions,
                "duration": record.duration,
                "startedAt": format_naive_iso(record.started_at),
                "completedAt": record.completed_at.map(format_naive_iso),
            }
        })),
    )
        .into_response()
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PeriodStats {
    sessions: i64,
    words_studied: i64,
    correct_answers: i64,
    total_questions: i64,
    accuracy: u32,
    time_spent_seconds: i64,
}

impl PeriodStats {
    fn from_aggregate(aggregate: SessionAggregate) -> Self {
        let accuracy = accuracy_percent(
            aggregate.correct_answers.max(0) as u32,
            aggregate.total_questions.max(0) as u32,
        );
        Self {
            sessions: aggregate.sessions,
            words_studied: aggregate.words_studied,
            correct_answers: aggregate.correct_answers,
            total_questions: aggregate.total_questions,
            accuracy,
            time_spent_seconds: aggregate.duration_seconds,
        }
    }
}

pub async fn stats(
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
        Err(err) => return internal(err),
    };

    let now = Utc::now();
    let today_start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap_or_else(|| now.naive_utc());
    let week_start = (now - Duration::days(7)).naive_utc();
    let month_start = (now - Duration::days(30)).naive_utc();

    let today = match study_session::aggregate_since(proxy.as_ref(), &auth_user.id, today_start).await
    {
        Ok(aggregate) => aggregate,
        Err(err) => return internal(err),
    };
    let week = match study_session::aggregate_since(proxy.as_ref(), &auth_user.id, week_start).await
    {
        Ok(aggregate) => aggregate,
        Err(err) => return internal(err),
    };
    let month =
        match study_session::aggregate_since(proxy.as_ref(), &auth_user.id, month_start).await {
            Ok(aggregate) => aggregate,
            Err(err) => return internal(err),
        };

    let counts = match progress::count_by_status(proxy.as_ref(), &auth_user.id).await {
        Ok(counts) => counts,
        Err(err) => return internal(err),
    };

    Json(serde_json::json!({
        "success": true,
        "data": {
            "today": PeriodStats::from_aggregate(today),
            "week": PeriodStats::from_aggregate(week),
            "month": PeriodStats::from_aggregate(month),
            "progress": {
                "learning": counts.learning,
                "reviewing": counts.reviewing,
                "mastered": counts.mastered,
            },
            "user": {
                "currentStreak": user_record.current_streak,
                "longestStreak": user_record.longest_streak,
                "totalStudyTime": user_record.total_study_time,
                "wordsLearnedToday": user_record.words_learned_today,
                "dailyGoal": user_record.daily_goal,
            }
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
