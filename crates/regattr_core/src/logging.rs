//! Logger bootstrap.
//!
//! # Responsibility
//! - Start the process-wide `flexi_logger` backend exactly once.
//! - Report the active configuration.
//!
//! # Invariants
//! - Initialization is idempotent for the same level and target.
//! - Re-initialization with a different level or target is rejected.
//! - Initialization never panics.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use thiserror::Error;

const LOG_FILE_BASENAME: &str = "regattr";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

/// Where log records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// Rotating files under an absolute directory.
    Directory(PathBuf),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoggingError {
    #[error("unsupported log level `{0}`; expected trace|debug|info|warn|error")]
    UnsupportedLevel(String),
    #[error("log directory must be an absolute path, got `{0}`")]
    RelativeDirectory(PathBuf),
    #[error("failed to create log directory `{path}`: {message}")]
    CreateDirectory { path: PathBuf, message: String },
    #[error("failed to start logger: {0}")]
    Backend(String),
    #[error("logging already initialized with {active}; refusing to switch to {requested}")]
    Conflict { active: String, requested: String },
}

struct LoggingState {
    level: &'static str,
    target: LogTarget,
    _logger: LoggerHandle,
}

/// Initializes logging at `level` for `target`.
///
/// # Errors
/// - `UnsupportedLevel` / `RelativeDirectory` for bad arguments.
/// - `CreateDirectory` / `Backend` when the backend cannot start.
/// - `Conflict` when logging is already active with another configuration.
pub fn init_logging(level: &str, target: LogTarget) -> Result<(), LoggingError> {
    let level = normalize_level(level)?;
    if let LogTarget::Directory(dir) = &target {
        if !dir.is_absolute() {
            return Err(LoggingError::RelativeDirectory(dir.clone()));
        }
    }

    let state = LOGGING_STATE.get_or_try_init(|| start_logger(level, target.clone()))?;
    if state.level != level || state.target != target {
        return Err(LoggingError::Conflict {
            active: describe(state.level, &state.target),
            requested: describe(level, &target),
        });
    }
    Ok(())
}

/// `(level, target)` of the active logger, if any.
pub fn logging_status() -> Option<(&'static str, LogTarget)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.target.clone()))
}

/// `debug` in debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_logger(level: &'static str, target: LogTarget) -> Result<LoggingState, LoggingError> {
    let logger =
        Logger::try_with_str(level).map_err(|err| LoggingError::Backend(err.to_string()))?;
    let logger = match &target {
        LogTarget::Stderr => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::detailed_format),
        LogTarget::Directory(dir) => {
            create_dir(dir)?;
            logger
                .log_to_file(
                    FileSpec::default()
                        .directory(dir.as_path())
                        .basename(LOG_FILE_BASENAME),
                )
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
        }
    };
    let handle = logger
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    info!(
        "event=logging_init module=logging status=ok level={} target={} version={}",
        level,
        describe_target(&target),
        env!("CARGO_PKG_VERSION")
    );
    Ok(LoggingState {
        level,
        target,
        _logger: handle,
    })
}

fn create_dir(dir: &Path) -> Result<(), LoggingError> {
    std::fs::create_dir_all(dir).map_err(|err| LoggingError::CreateDirectory {
        path: dir.to_path_buf(),
        message: err.to_string(),
    })
}

fn normalize_level(level: &str) -> Result<&'static str, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(LoggingError::UnsupportedLevel(other.to_string())),
    }
}

fn describe(level: &str, target: &LogTarget) -> String {
    format!("level `{level}` and target `{}`", describe_target(target))
}

fn describe_target(target: &LogTarget) -> String {
    match target {
        LogTarget::Stderr => "stderr".to_string(),
        LogTarget::Directory(dir) => dir.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, normalize_level, LogTarget, LoggingError};
    use std::path::PathBuf;

    #[test]
    fn normalize_level_accepts_known_values() {
        assert_eq!(normalize_level("INFO"), Ok("info"));
        assert_eq!(normalize_level(" warning "), Ok("warn"));
        assert_eq!(
            normalize_level("loud"),
            Err(LoggingError::UnsupportedLevel("loud".to_string()))
        );
    }

    #[test]
    fn relative_directories_are_rejected() {
        let err = init_logging("info", LogTarget::Directory(PathBuf::from("logs/dev")))
            .expect_err("relative paths must be rejected");
        assert!(matches!(err, LoggingError::RelativeDirectory(_)));
    }

    #[test]
    fn init_logging_is_idempotent_and_rejects_conflicts() {
        let dir = tempfile::tempdir().expect("temp dir");
        let target = LogTarget::Directory(dir.path().join("logs"));

        init_logging("info", target.clone()).expect("first init should succeed");
        init_logging("INFO", target.clone()).expect("same config should be idempotent");

        let level_error = init_logging("debug", target.clone()).expect_err("level conflict");
        assert!(level_error.to_string().contains("refusing to switch"));
        let target_error = init_logging("info", LogTarget::Stderr).expect_err("target conflict");
        assert!(matches!(target_error, LoggingError::Conflict { .. }));

        assert_eq!(logging_status(), Some(("info", target)));
        assert!(dir.path().join("logs").is_dir());
    }
}
