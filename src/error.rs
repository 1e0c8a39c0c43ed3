//! Error types for the coding-context library
//!
//! Only failures at discovery and selection boundaries are represented here.
//! Everything that can go wrong while expanding a fragment body is reported
//! as a [`Warning`](crate::core::Warning) instead, so a single malformed
//! fragment never prevents the rest of the context from being assembled.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for all library operations
#[derive(Error, Debug)]
pub enum ContextError {
    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regular expression errors
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// An explicitly requested file does not exist
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// No task file matches the requested name
    #[error("Task not found: {name}")]
    TaskNotFound { name: String },

    /// Several task files in the same search root share a name
    #[error("Task {name} is ambiguous: {}", join_paths(.paths))]
    AmbiguousTask { name: String, paths: Vec<PathBuf> },

    /// Malformed `key=value` selector
    #[error("Invalid selector '{input}': {reason}")]
    InvalidSelector { input: String, reason: String },

    /// Malformed parameter or argument list
    #[error("Invalid parameter '{input}': {reason}")]
    InvalidParameter { input: String, reason: String },

    /// Selector expression that does not parse
    #[error("Invalid selector expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    /// `--agent` or a task's `agent` key names no known agent
    #[error("Unknown agent '{name}' (supported: {supported})")]
    UnknownAgent { name: String, supported: String },

    /// A shell command was terminated by a signal
    #[error("Interrupted while running: {command}")]
    Interrupted { command: String },
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ContextError>;

impl ContextError {
    /// Create a new file not found error
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a new task not found error
    pub fn task_not_found(name: impl Into<String>) -> Self {
        Self::TaskNotFound { name: name.into() }
    }

    /// Create a new ambiguous task error
    pub fn ambiguous_task(name: impl Into<String>, paths: Vec<PathBuf>) -> Self {
        Self::AmbiguousTask {
            name: name.into(),
            paths,
        }
    }

    /// Create a new invalid selector error
    pub fn invalid_selector(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid parameter error
    pub fn invalid_parameter(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a new invalid expression error
    pub fn invalid_expression(expression: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidExpression {
            expression: expression.into(),
            reason: reason.into(),
        }
    }

    /// Create a new unknown agent error
    pub fn unknown_agent(name: impl Into<String>, supported: impl Into<String>) -> Self {
        Self::UnknownAgent {
            name: name.into(),
            supported: supported.into(),
        }
    }

    /// Create a new interrupted error
    pub fn interrupted(command: impl Into<String>) -> Self {
        Self::Interrupted {
            command: command.into(),
        }
    }

    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(io_err) => !matches!(
                io_err.kind(),
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied
            ),
            Self::FileNotFound { .. }
            | Self::TaskNotFound { .. }
            | Self::AmbiguousTask { .. }
            | Self::Interrupted { .. } => false,
            Self::InvalidSelector { .. }
            | Self::InvalidParameter { .. }
            | Self::InvalidExpression { .. }
            | Self::UnknownAgent { .. } => true,
            Self::Yaml(_) | Self::Json(_) | Self::Regex(_) => true,
        }
    }

    /// Get the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::FileNotFound { .. } | Self::TaskNotFound { .. } | Self::Interrupted { .. } => {
                ErrorSeverity::Critical
            }
            Self::AmbiguousTask { .. } | Self::Yaml(_) => ErrorSeverity::High,
            Self::Regex(_) => ErrorSeverity::Low,
            _ => ErrorSeverity::Medium,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
