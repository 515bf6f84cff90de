//! Tracing setup: stdout always, plus an optional daily-rolling file sink
//! (`ENABLE_FILE_LOGS` / `LOG_DIR`).

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "wordmaster.log";
// sqlx logs every statement at info; keep it quiet unless asked for.
const FALLBACK_DIRECTIVES: &str = "info,sqlx=warn";

/// Keeps the non-blocking file writer alive. Dropping it flushes and closes
/// the sink, so `main` holds it for the lifetime of the process.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

pub fn file_logging_enabled() -> bool {
    std::env::var("ENABLE_FILE_LOGS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}

pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    let env_filter =
        EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new(FALLBACK_DIRECTIVES));
    let stdout_layer = fmt::layer().with_target(true);

    if file_logging_enabled() {
        let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());
        match std::fs::create_dir_all(&log_dir) {
            Err(err) => eprintln!("failed to create log directory {log_dir}: {err}"),
            Ok(()) => {
                let file_appender =
                    RollingFileAppender::new(Rotation::DAILY, &log_dir, LOG_FILE_PREFIX);
                let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
                let file_layer = fmt::layer()
                    .with_writer(file_writer)
                    .with_ansi(false)
                    .with_target(true);

                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(stdout_layer)
                    .with(file_layer)
                    .init();

                return Some(FileLogGuard { _guard: guard });
            }
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .init();

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_logging_disabled_by_default() {
        std::env::remove_var("ENABLE_FILE_LOGS");
        assert!(!file_logging_enabled());
        std::env::set_var("ENABLE_FILE_LOGS", "1");
        assert!(file_logging_enabled());
        std::env::set_var("ENABLE_FILE_LOGS", "false");
        assert!(!file_logging_enabled());
        std::env::remove_var("ENABLE_FILE_LOGS");
    }
}
