//! Structured JSONL logging to a file plus human-readable stderr output.
//!
//! - **JSONL to file** (~/.tms-host/logs/tms-host.jsonl) - one JSON object per event
//! - **Compact to stderr** - for whoever launched the host from a console
//!
//! # Usage
//!
//! ```rust,ignore
//! use tms_host::logging;
//!
//! // Keep the guard alive for the duration of the program
//! let _guard = logging::init();
//! tracing::info!(event_type = "session", "Session started");
//! ```

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_FILE_NAME: &str = "tms-host.jsonl";

/// Guard that must be kept alive for the duration of the program.
/// Dropping this guard will flush and close the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the dual-output logging system.
///
/// Returns a guard that MUST be kept alive for the duration of the program.
pub fn init() -> LoggingGuard {
    let log_dir = log_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }

    let path = log_path();
    let file: Box<dyn Write + Send> = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    {
        Ok(file) => Box::new(file),
        Err(e) => {
            eprintln!("[LOGGING] Failed to open log file: {}", e);
            Box::new(std::io::sink())
        }
    };

    // Non-blocking so pump threads never wait on disk
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gpui=warn"));

    let json_layer = fmt::layer()
        .json()
        .with_writer(non_blocking_file)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .with_level(true)
        .compact();

    if let Err(e) = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()
    {
        eprintln!("[LOGGING] Subscriber already installed: {}", e);
    }

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = %path.display(),
        "Host logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Log directory (~/.tms-host/logs/), or a temp dir without a home.
fn log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".tms-host").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("tms-host-logs"))
}

/// Path of the JSONL log file.
pub fn log_path() -> PathBuf {
    log_dir().join(LOG_FILE_NAME)
}

/// Categorized info-level log line.
pub fn log(category: &str, message: &str) {
    tracing::info!(category = category, "{}", message);
}

/// Session lifecycle event (`started`, `startup_failed`, `exited`, `closed`).
pub fn log_session_event(action: &str, script: &str, exit_code: Option<i32>) {
    tracing::info!(
        event_type = "session",
        action = action,
        script = script,
        exit_code = ?exit_code,
        "Session {}",
        action
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_path_file_name() {
        let path = log_path();
        assert_eq!(
            path.file_name().and_then(|name| name.to_str()),
            Some(LOG_FILE_NAME)
        );
        assert!(path.parent().is_some_and(|dir| dir.ends_with("logs")
            || dir.ends_with("tms-host-logs")));
    }

    #[test]
    fn test_log_helpers_without_subscriber() {
        // No subscriber installed: must be a no-op, not a panic
        log("TEST", "message");
        log_session_event("started", "setup.ps1", None);
    }
}
