use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub primary_url: String,
    pub redis_url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub health_check: HealthCheckConfig,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, DbConfigError> {
        let primary_url = std::env::var("DATABASE_URL").map_err(|_| DbConfigError::Missing {
            key: "DATABASE_URL",
        })?;

        let redis_url = std::env::var("REDIS_URL").ok();

        let max_connections = env_u64("DB_MAX_CONNECTIONS", 10) as u32;
        let acquire_timeout = Duration::from_millis(env_u64("DB_ACQUIRE_TIMEOUT_MS", 5000));

        Ok(Self {
            primary_url,
            redis_url,
            max_connections,
            acquire_timeout,
            health_check: HealthCheckConfig::from_env(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct HealthCheckConfig {
    pub interval: Duration,
    pub timeout: Duration,
    pub failure_threshold: u32,
    pub recovery_threshold: u32,
}

impl HealthCheckConfig {
    fn from_env() -> Self {
        Self {
            interval: Duration::from_millis(env_u64("DB_HEALTH_CHECK_INTERVAL_MS", 30_000)),
            timeout: Duration::from_millis(env_u64("DB_HEALTH_CHECK_TIMEOUT_MS", 3_000)),
            failure_threshold: env_u64("DB_HEALTH_FAILURE_THRESHOLD", 3) as u32,
            recovery_threshold: env_u64("DB_HEALTH_RECOVERY_THRESHOLD", 2) as u32,
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

#[derive(Debug, Error)]
pub enum DbConfigError {
    #[error("missing environment variable {key}")]
    Missing { key: &'static str },
}
