mod auth;
mod health;
mod referral;
mod share;
mod study;
mod users;
mod words;
mod wordsets;

use axum::handler::Handler;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::auth::require_auth;
use crate::middleware::rate_limit::auth_rate_limit_middleware;
use crate::response::json_error;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let auth_mw = middleware::from_fn_with_state(state.clone(), require_auth);

    let protected = Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/study/queue", get(study::queue))
        .route("/api/study/review", post(study::review))
        .route("/api/study/sessions", post(study::create_session))
        .route("/api/study/stats", get(study::stats))
        .route(
            "/api/wordsets",
            get(wordsets::list).post(wordsets::create),
        )
        .route(
            "/api/referral",
            get(referral::overview).post(referral::create_invite),
        )
        .route("/api/share", post(share::create))
        .route("/api/users/me/points", get(users::points))
        .route_layer(auth_mw.clone());

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route(
            "/api/words",
            get(words::list).post(words::create.layer(auth_mw)),
        )
        .route("/api/words/random", get(words::random))
        .route("/api/words/categories", get(words::categories))
        .merge(protected)
        .nest("/health", health::router())
        .fallback(fallback_handler)
        .layer(middleware::from_fn(auth_rate_limit_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "接口不存在").into_response()
}
