//! Error types for daytrace.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - A business taxonomy (`ErrorCategory`) shared by callers of the tracker
//! - Category-based exit codes (2=storage, 3=not_found, 4=invalid, 5=limit, ...)
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for daytrace operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Category ────────────────────────────────────────────

/// Business taxonomy for errors surfaced to callers.
///
/// Ownership failures are reported as `NotFound`, never as a distinct
/// "forbidden" category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    NotFound,
    LimitExceeded,
    InvalidReference,
    InvalidState,
    ResourceExhausted,
    Storage,
    Config,
    Io,
    Internal,
}

impl ErrorCategory {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::LimitExceeded => "limit_exceeded",
            Self::InvalidReference => "invalid_reference",
            Self::InvalidState => "invalid_state",
            Self::ResourceExhausted => "resource_exhausted",
            Self::Storage => "storage",
            Self::Config => "config",
            Self::Io => "io",
            Self::Internal => "internal",
        }
    }
}

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
///
/// Each code maps to a SCREAMING_SNAKE string and a category-based
/// exit code. Clients match on the string; shell scripts on the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Storage (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    TaskNotFound,
    NightSessionNotFound,
    PlanNotFound,
    ReviewNotFound,
    NoteNotFound,

    // Invalid reference / state (exit 4)
    InvalidProgram,
    InvalidTheme,
    InvalidArgument,
    InvalidTaskStatus,
    InvalidSessionStatus,

    // Limit (exit 5)
    RefreshLimitReached,

    // Exhausted (exit 6)
    NoTemplateAvailable,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::NightSessionNotFound => "NIGHT_SESSION_NOT_FOUND",
            Self::PlanNotFound => "PLAN_NOT_FOUND",
            Self::ReviewNotFound => "REVIEW_NOT_FOUND",
            Self::NoteNotFound => "NOTE_NOT_FOUND",
            Self::InvalidProgram => "INVALID_PROGRAM",
            Self::InvalidTheme => "INVALID_THEME",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidTaskStatus => "INVALID_TASK_STATUS",
            Self::InvalidSessionStatus => "INVALID_SESSION_STATUS",
            Self::RefreshLimitReached => "REFRESH_LIMIT_REACHED",
            Self::NoTemplateAvailable => "NO_TEMPLATE_AVAILABLE",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Taxonomy category of this code.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => {
                ErrorCategory::Storage
            }
            Self::TaskNotFound
            | Self::NightSessionNotFound
            | Self::PlanNotFound
            | Self::ReviewNotFound
            | Self::NoteNotFound => ErrorCategory::NotFound,
            Self::InvalidProgram | Self::InvalidTheme | Self::InvalidArgument => {
                ErrorCategory::InvalidReference
            }
            Self::InvalidTaskStatus | Self::InvalidSessionStatus => ErrorCategory::InvalidState,
            Self::RefreshLimitReached => ErrorCategory::LimitExceeded,
            Self::NoTemplateAvailable => ErrorCategory::ResourceExhausted,
            Self::ConfigError => ErrorCategory::Config,
            Self::IoError | Self::JsonError => ErrorCategory::Io,
            Self::InternalError => ErrorCategory::Internal,
        }
    }

    /// Category-based exit code (1-8).
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self.category() {
            ErrorCategory::Internal => 1,
            ErrorCategory::Storage => 2,
            ErrorCategory::NotFound => 3,
            ErrorCategory::InvalidReference | ErrorCategory::InvalidState => 4,
            ErrorCategory::LimitExceeded => 5,
            ErrorCategory::ResourceExhausted => 6,
            ErrorCategory::Config => 7,
            ErrorCategory::Io => 8,
        }
    }

    /// Whether a caller should retry with corrected input.
    ///
    /// True for bad references and transient database contention.
    /// False for missing records, exhausted budgets and internal errors.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidProgram | Self::InvalidTheme | Self::InvalidArgument | Self::DatabaseError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in daytrace operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `dt init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Task not found: {id}")]
    TaskNotFound { id: String },

    #[error("Night session not found: {id}")]
    NightSessionNotFound { id: String },

    #[error("Year plan not found for {year}")]
    PlanNotFound { year: i32 },

    #[error("Year plan not found: {id}")]
    PlanIdNotFound { id: String },

    #[error("Review not found: {id}")]
    ReviewNotFound { id: String },

    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    #[error("Refresh limit reached ({limit} per day)")]
    RefreshLimitExceeded { limit: u32 },

    #[error("Unknown night program: {id}")]
    InvalidProgram { id: String },

    #[error("Unknown year theme: {id}")]
    InvalidTheme { id: String },

    #[error("Invalid task status: expected {expected}, got {actual}")]
    InvalidTaskStatus { expected: String, actual: String },

    #[error("Invalid night session status: expected {expected}, got {actual}")]
    InvalidSessionStatus { expected: String, actual: String },

    #[error("No template available for replacement")]
    NoTemplateAvailable,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::TaskNotFound { .. } => ErrorCode::TaskNotFound,
            Self::NightSessionNotFound { .. } => ErrorCode::NightSessionNotFound,
            Self::PlanNotFound { .. } | Self::PlanIdNotFound { .. } => ErrorCode::PlanNotFound,
            Self::ReviewNotFound { .. } => ErrorCode::ReviewNotFound,
            Self::NoteNotFound { .. } => ErrorCode::NoteNotFound,
            Self::RefreshLimitExceeded { .. } => ErrorCode::RefreshLimitReached,
            Self::InvalidProgram { .. } => ErrorCode::InvalidProgram,
            Self::InvalidTheme { .. } => ErrorCode::InvalidTheme,
            Self::InvalidTaskStatus { .. } => ErrorCode::InvalidTaskStatus,
            Self::InvalidSessionStatus { .. } => ErrorCode::InvalidSessionStatus,
            Self::NoTemplateAvailable => ErrorCode::NoTemplateAvailable,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Taxonomy category, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.error_code().category()
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Whether this is a unique-constraint violation from SQLite.
    ///
    /// Idempotent creators use this to detect that a concurrent caller
    /// won the insert race.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(rusqlite::Error::SqliteFailure(err, _)) => {
                err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            }
            _ => false,
        }
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => Some("Run `dt init` to initialize the database".to_string()),

            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),

            Self::TaskNotFound { .. } => {
                Some("Use `dt today` to see the task ids for a day.".to_string())
            }

            Self::NightSessionNotFound { .. } => Some(
                "Start one with: dt night start <program-id>. \
                 Use `dt night programs` to list programs."
                    .to_string(),
            ),

            Self::PlanNotFound { year } => Some(format!(
                "Create one with: dt year plan create {year} <theme-id>. \
                 Use `dt year themes` to list themes."
            )),

            Self::PlanIdNotFound { .. } => {
                Some("Use `dt year plan show <year>` to see the plan id.".to_string())
            }

            Self::RefreshLimitExceeded { .. } => {
                Some("The refresh budget resets tomorrow.".to_string())
            }

            Self::InvalidProgram { .. } => {
                Some("Use `dt night programs` to list available programs.".to_string())
            }

            Self::InvalidTheme { .. } => {
                Some("Use `dt year themes` to list available themes.".to_string())
            }

            Self::InvalidTaskStatus { actual, .. } => Some(format!(
                "The task is already '{actual}'. Done and skipped tasks are final."
            )),

            Self::InvalidSessionStatus { .. } => {
                Some("A finished night session cannot be finished again.".to_string())
            }

            Self::NoTemplateAvailable => Some(
                "Every active template is already on today's list. \
                 Try again without --mood or skip the task instead."
                    .to_string(),
            ),

            Self::InvalidArgument(msg) => {
                if msg.contains("date") {
                    Some("Dates use the YYYY-MM-DD format".to_string())
                } else if msg.contains("related_type") {
                    Some("Valid related types: daily_task, night_session".to_string())
                } else {
                    None
                }
            }

            Self::ReviewNotFound { .. }
            | Self::NoteNotFound { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    ///
    /// Includes error code, category, message, retryability, exit code, and
    /// optional recovery hint.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "category": code.category().as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_errors_share_category() {
        let errors = [
            Error::TaskNotFound { id: "t".into() },
            Error::NightSessionNotFound { id: "n".into() },
            Error::PlanNotFound { year: 2024 },
            Error::PlanIdNotFound { id: "p".into() },
            Error::ReviewNotFound { id: "r".into() },
            Error::NoteNotFound { id: "m".into() },
        ];
        for err in &errors {
            assert_eq!(err.category(), ErrorCategory::NotFound);
            assert_eq!(err.exit_code(), 3);
        }
    }

    #[test]
    fn test_refresh_limit_code_is_stable() {
        let err = Error::RefreshLimitExceeded { limit: 2 };
        assert_eq!(err.error_code().as_str(), "REFRESH_LIMIT_REACHED");
        assert_eq!(err.category(), ErrorCategory::LimitExceeded);
        assert!(!err.error_code().is_retryable());
    }

    #[test]
    fn test_structured_json_shape() {
        let json = Error::NoTemplateAvailable.to_structured_json();
        assert_eq!(json["error"]["code"], "NO_TEMPLATE_AVAILABLE");
        assert_eq!(json["error"]["category"], "resource_exhausted");
        assert_eq!(json["error"]["exit_code"], 6);
        assert!(json["error"]["hint"].is_string());
    }

    #[test]
    fn test_unique_violation_detection() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (k TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();
        let err: Error = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();
        assert!(err.is_unique_violation());
        assert!(!Error::NoTemplateAvailable.is_unique_violation());
    }
}
