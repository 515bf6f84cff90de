use std::collections::VecDeque;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::db::config::HealthCheckConfig;

#[derive(Debug, Clone)]
pub struct HealthCheckResult {
    pub healthy: bool,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
    pub timestamp_ms: u64,
}

impl HealthCheckResult {
    pub fn healthy(latency: Duration) -> Self {
        Self {
            healthy: true,
            latency_ms: Some(latency.as_millis() as u64),
            error: None,
            timestamp_ms: now_ms(),
        }
    }

    pub fn unhealthy(error: String) -> Self {
        Self {
            healthy: false,
            latency_ms: None,
            error: Some(error),
            timestamp_ms: now_ms(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthCheckSnapshot {
    pub healthy: bool,
    pub latency_ms: Option<u64>,
    pub error: Option<String>,
    pub timestamp_ms: Option<u64>,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
}

#[derive(Debug)]
pub struct HealthTracker {
    config: HealthCheckConfig,
    consecutive_failures: u32,
    consecutive_successes: u32,
    last_result: Option<HealthCheckResult>,
    window: VecDeque<bool>,
    window_size: usize,
}

impl HealthTracker {
    pub fn new(config: HealthCheckConfig) -> Self {
        Self {
            config,
            consecutive_failures: 0,
            consecutive_successes: 0,
            last_result: None,
            window: VecDeque::new(),
            window_size: 10,
        }
    }

    pub fn process(&mut self, result: HealthCheckResult) {
        self.window.push_back(result.healthy);
        if self.window.len() > self.window_size {
            self.window.pop_front();
        }

        if result.healthy {
            self.consecutive_successes = self.consecutive_successes.saturating_add(1);

            // A run of recent failures keeps the failure counter visible even
            // when individual checks flap back to healthy.
            let recent_failures = self.window.iter().filter(|healthy| !**healthy).count() as u32;
            if recent_failures >= self.config.failure_threshold {
                self.consecutive_failures = recent_failures;
            } else {
                self.consecutive_failures = 0;
            }
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
            self.consecutive_successes = 0;
        }

        self.last_result = Some(result);
    }

    pub fn snapshot(&self) -> HealthCheckSnapshot {
        HealthCheckSnapshot {
            healthy: self.last_result.as_ref().map(|r| r.healthy).unwrap_or(false),
            latency_ms: self.last_result.as_ref().and_then(|r| r.latency_ms),
            error: self.last_result.as_ref().and_then(|r| r.error.clone()),
            timestamp_ms: self.last_result.as_ref().map(|r| r.timestamp_ms),
            consecutive_failures: self.consecutive_failures,
            consecutive_successes: self.consecutive_successes,
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> HealthTracker {
        HealthTracker::new(HealthCheckConfig {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(3),
            failure_threshold: 3,
            recovery_threshold: 2,
        })
    }

    #[test]
    fn consecutive_failures_accumulate() {
        let mut t = tracker();
        t.process(HealthCheckResult::unhealthy("down".to_string()));
        t.process(HealthCheckResult::unhealthy("down".to_string()));
        let snapshot = t.snapshot();
        assert!(!snapshot.healthy);
        assert_eq!(snapshot.consecutive_failures, 2);
    }

    #[test]
    fn recovery_resets_failure_counter() {
        let mut t = tracker();
        t.process(HealthCheckResult::unhealthy("down".to_string()));
        t.process(HealthCheckResult::healthy(Duration::from_millis(5)));
        t.process(HealthCheckResult::healthy(Duration::from_millis(5)));
        let snapshot = t.snapshot();
        assert!(snapshot.healthy);
        assert_eq!(snapshot.consecutive_failures, 0);
        assert_eq!(snapshot.consecutive_successes, 2);
    }
}
