use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::auth::{self, AuthUser};
use crate::db::operations::user::{self, PublicUser};
use crate::response::json_error;
use crate::services::referral as referral_service;
use crate::state::AppState;

const BCRYPT_COST: u32 = 12;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    email: String,
    username: String,
    password: String,
    confirm_password: String,
    #[serde(default, rename = "ref")]
    referral_code: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct AuthResponse {
    success: bool,
    data: AuthData,
}

#[derive(Serialize)]
struct AuthData {
    user: PublicUser,
    token: String,
}

#[derive(Serialize)]
struct UserResponse {
    success: bool,
    data: PublicUser,
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Response {
    let email = payload.email.trim().to_lowercase();
    let username = payload.username.trim().to_string();

    if let Err(message) = validate_registration(&email, &username, &payload) {
        return json_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message).into_response();
    }

    let Some(proxy) = state.db_proxy() else {
        return db_unavailable();
    };

    match user::find_by_email(proxy.as_ref(), &email).await {
        Ok(Some(_)) => {
            return json_error(StatusCode::CONFLICT, "EMAIL_TAKEN", "该邮箱已被注册")
                .into_response();
        }
        Ok(None) => {}
        Err(err) => return internal(err),
    }

    match user::username_exists(proxy.as_ref(), &username).await {
        Ok(true) => {
            return json_error(StatusCode::CONFLICT, "USERNAME_TAKEN", "该用户名已被使用")
                .into_response();
        }
        Ok(false) => {}
        Err(err) => return internal(err),
    }

    let password_hash = match bcrypt::hash(&payload.password, BCRYPT_COST) {
        Ok(hash) => hash,
        Err(err) => {
            error!(error = %err, "密码哈希失败");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "注册失败，请稍后再试",
            )
            .into_response();
        }
    };

    let referred_by = payload
        .referral_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty());

    let record = match user::create_user(
        proxy.as_ref(),
        &email,
        &username,
        &password_hash,
        referred_by,
    )
    .await
    {
        Ok(record) => record,
        Err(err) => return internal(err),
    };

    if let Some(code) = referred_by {
        if let Err(err) = referral_service::redeem_on_register(proxy.as_ref(), code, &record.id).await
        {
            // registration already succeeded, the reward can be retried later
            error!(error = %err, "邀请奖励发放失败");
        }
    }

    info!(user = %record.id, "新用户注册");
    issue_token_response(StatusCode::CREATED, record.sanitize(), &record.id, &record.email)
}

pub async fn login(State(state): State<AppState>, Json(payload): Json<LoginRequest>) -> Response {
    let email = payload.email.trim().to_lowercase();

    let Some(proxy) = state.db_proxy() else {
        return db_unavailable();
    };

    let record = match user::find_by_email(proxy.as_ref(), &email).await {
        Ok(Some(record)) => record,
        Ok(None) => return bad_credentials(),
        Err(err) => return internal(err),
    };

    match bcrypt::verify(&payload.password, &record.password_hash) {
        Ok(true) => {}
        Ok(false) => return bad_credentials(),
        Err(err) => {
            error!(error = %err, "密码校验失败");
            return bad_credentials();
        }
    }

    if let Err(err) = user::update_last_login(proxy.as_ref(), &record.id).await {
        error!(error = %err, "更新登录时间失败");
    }

    issue_token_response(StatusCode::OK, record.sanitize(), &record.id, &record.email)
}

pub async fn logout() -> Response {
    let body = serde_json::json!({
        "success": true,
        "message": "已退出登录",
    });
    (
        StatusCode::OK,
        [(header::SET_COOKIE, auth::clear_auth_cookie())],
        Json(body),
    )
        .into_response()
}

pub async fn me(State(state): State<AppState>, Extension(auth_user): Extension<AuthUser>) -> Response {
    let Some(proxy) = state.db_proxy() else {
        return db_unavailable();
    };

    match user::find_by_id(proxy.as_ref(), &auth_user.id).await {
        Ok(Some(record)) => Json(UserResponse {
            success: true,
            data: record.sanitize(),
        })
        .into_response(),
        Ok(None) => {
            json_error(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "用户不存在").into_response()
        }
        Err(err) => internal(err),
    }
}

fn issue_token_response(
    status: StatusCode,
    public: PublicUser,
    user_id: &str,
    email: &str,
) -> Response {
    let (token, expires_at) = match auth::sign_jwt_for_user(user_id, email) {
        Ok(pair) => pair,
        Err(err) => {
            error!(error = %err, "签发令牌失败");
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "服务器内部错误",
            )
            .into_response();
        }
    };

    let max_age = (expires_at - Utc::now().naive_utc()).num_seconds().max(0);
    let cookie = auth::auth_cookie(&token, max_age);

    (
        status,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            success: true,
            data: AuthData {
                user: public,
                token,
            },
        }),
    )
        .into_response()
}

fn validate_registration(
    email: &str,
    username: &str,
    payload: &RegisterRequest,
) -> Result<(), &'static str> {
    if !is_valid_email(email) {
        return Err("邮箱格式无效");
    }

    let username_len = username.chars().count();
    if !(2..=20).contains(&username_len) {
        return Err("用户名长度需为2-20个字符");
    }

    if !is_valid_password(&payload.password) {
        return Err("密码至少8位，且需包含字母和数字");
    }

    if payload.password != payload.confirm_password {
        return Err("两次输入的密码不一致");
    }

    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

fn is_valid_password(password: &str) -> bool {
    password.len() >= 8
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
}

fn bad_credentials() -> Response {
    json_error(StatusCode::UNAUTHORIZED, "BAD_CREDENTIALS", "邮箱或密码错误").into_response()
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
    fn accepts_plain_email_rejects_garbage() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a.b@mail.example.co"));
        assert!(!is_valid_email("userexample.com"));
        assert!(!is_valid_email("user@nodot"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@.com"));
    }

    #[test]
    fn password_needs_length_letter_and_digit() {
        assert!(is_valid_password("abcdef12"));
        assert!(!is_valid_password("short1"));
        assert!(!is_valid_password("alllowercase"));
        assert!(!is_valid_password("12345678"));
    }
}
