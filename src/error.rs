use std::path::PathBuf;

use thiserror::Error;
use tracing::{error, warn};

/// Error severity for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,     // informational
    Warning,  // recoverable, defaults used
    Error,    // operation failed
    Critical, // session cannot run
}

/// Host errors. Startup failures are shown in the window; the rest are logged.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("No script interpreter found (tried: {})", tried.join(", "))]
    InterpreterNotFound { tried: Vec<String> },

    #[error("Script not found: {}", path.display())]
    ScriptNotFound { path: PathBuf },

    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Child process {0} was started without a pipe")]
    MissingPipe(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Window operation failed: {0}")]
    Window(String),
}

impl HostError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InterpreterNotFound { .. } => ErrorSeverity::Critical,
            Self::ScriptNotFound { .. } => ErrorSeverity::Critical,
            Self::Spawn { .. } => ErrorSeverity::Critical,
            Self::MissingPipe(_) => ErrorSeverity::Error,
            Self::Config(_) => ErrorSeverity::Warning,
            Self::Window(_) => ErrorSeverity::Error,
        }
    }

    /// Whether this error prevented the child process from starting.
    pub fn is_startup_failure(&self) -> bool {
        matches!(
            self,
            Self::InterpreterNotFound { .. }
                | Self::ScriptNotFound { .. }
                | Self::Spawn { .. }
                | Self::MissingPipe(_)
        )
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::InterpreterNotFound { tried } => {
                format!("Could not find a script interpreter ({})", tried.join(" or "))
            }
            Self::ScriptNotFound { path } => format!("Script does not exist: {}", path.display()),
            Self::Spawn { program, source } => {
                format!("Could not start process {}: {}", program, source)
            }
            Self::MissingPipe(stream) => format!("Could not connect to process {}", stream),
            Self::Config(msg) => format!("Configuration issue: {}", msg),
            Self::Window(msg) => msg.clone(),
        }
    }
}

pub type Result<T> = std::result::Result<T, HostError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use on best-effort paths where the failure is not worth surfacing.
///
/// ```ignore
/// use tms_host::error::ResultExt;
///
/// stdin.flush().warn_on_err();
/// ```
pub trait ResultExt<T> {
    /// Log error with caller location and return None.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_startup_failures_are_critical() {
        let missing = HostError::ScriptNotFound {
            path: PathBuf::from("/nope/setup.ps1"),
        };
        assert!(missing.is_startup_failure());
        assert_eq!(missing.severity(), ErrorSeverity::Critical);
        assert_eq!(missing.user_message(), "Script does not exist: /nope/setup.ps1");

        let config = HostError::Config("bad json".to_string());
        assert!(!config.is_startup_failure());
        assert_eq!(config.severity(), ErrorSeverity::Warning);
    }

    #[test]
    fn test_interpreter_not_found_lists_candidates() {
        let err = HostError::InterpreterNotFound {
            tried: vec!["pwsh".to_string(), "powershell".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "No script interpreter found (tried: pwsh, powershell)"
        );
        assert_eq!(
            err.user_message(),
            "Could not find a script interpreter (pwsh or powershell)"
        );
    }

    #[test]
    fn test_spawn_error_keeps_source() {
        use std::error::Error as _;
        let err = HostError::Spawn {
            program: "pwsh".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert!(err.source().is_some());
        assert_eq!(err.to_string(), "Failed to start 'pwsh': no such file");
    }

    #[test]
    fn test_result_ext_discards_errors() {
        let ok: std::result::Result<u8, String> = Ok(3);
        let failed: std::result::Result<u8, String> = Err("boom".to_string());
        assert_eq!(ok.log_err(), Some(3));
        assert_eq!(failed.clone().log_err(), None);
        assert_eq!(failed.warn_on_err(), None);
    }
}
