use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, OnceLock};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header::RETRY_AFTER, HeaderName, HeaderValue, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::sync::Mutex;

use crate::response::json_error;

const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
const RATE_LIMIT_RESET: HeaderName = HeaderName::from_static("ratelimit-reset");

const AUTH_WINDOW_MS: u64 = 5 * 60 * 1000;
const AUTH_MAX: u64 = 30;

static AUTH_LIMITER: OnceLock<Arc<RateLimiter>> = OnceLock::new();

/// Per-IP limiter on the auth endpoints, to slow down credential stuffing.
pub async fn auth_rate_limit_middleware(req: Request<Body>, next: Next) -> Response {
    if is_test_env() || is_loopback_request(&req) {
        return next.run(req).await;
    }

    let path = req.uri().path();
    if !path.starts_with("/api/auth") {
        return next.run(req).await;
    }

    let limiter = AUTH_LIMITER.get_or_init(|| {
        Arc::new(RateLimiter::new(RateLimitConfig {
            window_ms: env_u64("AUTH_RATE_LIMIT_WINDOW_MS").unwrap_or(AUTH_WINDOW_MS),
            max: env_u64("AUTH_RATE_LIMIT_MAX").unwrap_or(AUTH_MAX),
        }))
    });

    let ip = extract_client_ip(&req).unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
    let check = limiter.check(ip).await;

    if !check.allowed {
        let mut res = json_error(
            StatusCode::TOO_MANY_REQUESTS,
            "TOO_MANY_AUTH_REQUESTS",
            "认证请求过于频繁，请稍后再试",
        )
        .into_response();
        apply_rate_limit_headers(&mut res, check);
        return res;
    }

    let mut res = next.run(req).await;
    apply_rate_limit_headers(&mut res, check);
    res
}

fn apply_rate_limit_headers(res: &mut Response, check: RateLimitCheck) {
    if let Ok(value) = HeaderValue::from_str(&check.limit.to_string()) {
        res.headers_mut().insert(RATE_LIMIT_LIMIT, value);
    }
    if let Ok(value) = HeaderValue::from_str(&check.remaining.to_string()) {
        res.headers_mut().insert(RATE_LIMIT_REMAINING, value);
    }
    if let Ok(value) = HeaderValue::from_str(&check.reset_after_seconds.to_string()) {
        res.headers_mut().insert(RATE_LIMIT_RESET, value.clone());
        if check.remaining == 0 {
            res.headers_mut().insert(RETRY_AFTER, value);
        }
    }
}

fn env_u64(key: &str) -> Option<u64> {
    let value = std::env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<u64>().ok()
}

fn is_test_env() -> bool {
    matches!(std::env::var("APP_ENV").ok().as_deref(), Some("test"))
}

fn is_loopback_request(req: &Request<Body>) -> bool {
    extract_client_ip(req)
        .map(|ip| ip.is_loopback())
        .unwrap_or(false)
}

#[derive(Debug, Clone, Copy)]
struct RateLimitConfig {
    window_ms: u64,
    max: u64,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    window_start_ms: u64,
    hits: u64,
}

#[derive(Debug, Clone, Copy)]
struct RateLimitCheck {
    allowed: bool,
    limit: u64,
    remaining: u64,
    reset_after_seconds: u64,
}

#[derive(Debug)]
struct RateLimiterState {
    entries: HashMap<IpAddr, Entry>,
    last_cleanup_ms: u64,
}

#[derive(Debug)]
struct RateLimiter {
    config: RateLimitConfig,
    state: Mutex<RateLimiterState>,
}

impl RateLimiter {
    fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Mutex::new(RateLimiterState {
                entries: HashMap::new(),
                last_cleanup_ms: now_ms(),
            }),
        }
    }

    async fn check(&self, ip: IpAddr) -> RateLimitCheck {
        let now_ms = now_ms();
        let mut state = self.state.lock().await;

        if now_ms.saturating_sub(state.last_cleanup_ms) >= self.config.window_ms {
            let window_ms = self.config.window_ms;
            state
                .entries
                .retain(|_, entry| now_ms.saturating_sub(entry.window_start_ms) < window_ms);
            state.last_cleanup_ms = now_ms;
        }

        let entry = state.entries.entry(ip).or_insert_with(|| Entry {
            window_start_ms: now_ms,
            hits: 0,
        });

        if now_ms.saturating_sub(entry.window_start_ms) >= self.config.window_ms {
            entry.window_start_ms = now_ms;
            entry.hits = 0;
        }

        entry.hits = entry.hits.saturating_add(1);
        let allowed = entry.hits <= self.config.max;
        let remaining = self
            .config
            .max
            .saturating_sub(entry.hits)
            .min(self.config.max);
        let reset_after_ms = self
            .config
            .window_ms
            .saturating_sub(now_ms.saturating_sub(entry.window_start_ms));
        let reset_after_seconds = (reset_after_ms + 999) / 1000;

        RateLimitCheck {
            allowed,
            limit: self.config.max,
            remaining: if allowed { remaining } else { 0 },
            reset_after_seconds,
        }
    }
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

fn extract_client_ip(req: &Request<Body>) -> Option<IpAddr> {
    if trust_proxy_enabled() {
        if let Some(ip) = extract_x_forwarded_for(req) {
            return Some(ip);
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
}

fn trust_proxy_enabled() -> bool {
    let value = std::env::var("TRUST_PROXY").ok();
    let Some(value) = value else { return false };
    let normalized = value.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return false;
    }
    !matches!(normalized.as_str(), "0" | "false")
}

fn extract_x_forwarded_for(req: &Request<Body>) -> Option<IpAddr> {
    let raw = req
        .headers()
        .get(HeaderName::from_static("x-forwarded-for"))?
        .to_str()
        .ok()?;
    let first = raw.split(',').next()?.trim();
    first.parse::<IpAddr>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blocks_after_limit_and_resets_window() {
        let limiter = RateLimiter::new(RateLimitConfig {
            window_ms: 60_000,
            max: 3,
        });
        let ip: IpAddr = "203.0.113.9".parse().unwrap();

        for _ in 0..3 {
            assert!(limiter.check(ip).await.allowed);
        }
        let blocked = limiter.check(ip).await;
        assert!(!blocked.allowed);
        assert_eq!(blocked.remaining, 0);

        // a different client is unaffected
        let other: IpAddr = "203.0.113.10".parse().unwrap();
        assert!(limiter.check(other).await.allowed);
    }
}
