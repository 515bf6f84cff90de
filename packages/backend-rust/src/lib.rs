#![allow(dead_code)]

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;
pub mod workers;

use crate::config::Config;
use crate::state::AppState;

/// Router wired against whatever environment is available; without a
/// reachable database every data route answers 503. Used by the integration
/// tests, `main` runs the full startup sequence itself.
pub async fn create_app() -> axum::Router {
    let config = Config::from_env();
    let db_proxy = db::DatabaseProxy::from_env().await.ok();
    let state = AppState::new(config, db_proxy, None);
    routes::router(state)
}
