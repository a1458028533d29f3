//! Error types for housekeeping runs
//!
//! Only fatal conditions are errors. Per-entry problems (ambiguous capture
//! groups, a failed action handler) are values recorded in the reports.

use cyclekeeper_domain::{CycleTimeError, Operation};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for housekeeping operations
pub type Result<T> = std::result::Result<T, HousekeepingError>;

/// Fatal errors that abort a housekeeping run
#[derive(Error, Debug)]
pub enum HousekeepingError {
    /// Rule file missing, unreadable or malformed
    #[error("Configuration error in {}: {reason}", .path.display())]
    Config {
        /// Rule file being parsed
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// A rule line failed validation
    #[error("Invalid rule at {}:{line}: {source}", .path.display())]
    InvalidRule {
        /// Rule file being parsed
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Validation failure
        source: RuleValidationError,
    },

    /// A rule built directly (not from a file) failed validation
    #[error("Invalid rule: {0}")]
    Rule(#[from] RuleValidationError),

    /// An exclude/only filter expression is not a valid regex
    #[error("Invalid filter pattern '{pattern}': {source}")]
    Filter {
        /// Offending expression
        pattern: String,
        /// Regex compilation error
        source: regex::Error,
    },

    /// Run settings are unusable
    #[error("Settings error: {0}")]
    Settings(String),

    /// Settings file could not be parsed
    #[error("Settings parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Filesystem failure outside a single candidate's action
    #[error("I/O error while {operation} {}: {source}", .path.display())]
    Io {
        /// What was being attempted
        operation: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}

impl HousekeepingError {
    pub(crate) fn config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }
}

/// Reasons a housekeeping rule is rejected at construction time
#[derive(Error, Debug)]
pub enum RuleValidationError {
    /// Capture groups cannot be combined into a 10-digit cycle time
    #[error("Bad pattern '{pattern}': {reason}")]
    BadPattern {
        /// Offending match pattern
        pattern: String,
        /// Why the shape was rejected
        reason: &'static str,
    },

    /// Match pattern is not a valid regex
    #[error("Bad pattern '{pattern}': {source}")]
    InvalidRegex {
        /// Offending match pattern
        pattern: String,
        /// Regex compilation error
        source: regex::Error,
    },

    /// Base cycle time is not `YYYYMMDDHH`
    #[error("{0}")]
    InvalidCycleTime(#[from] CycleTimeError),

    /// Offset is not an integer number of hours
    #[error("Cycle time offset must be integer: {0}")]
    InvalidOffset(String),

    /// Source directory does not exist
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Operation is not copy, move or delete
    #[error("Illegal operation: {0}")]
    UnknownOperation(String),

    /// Copy or move without a destination
    #[error("Operation '{0}' requires a destination")]
    MissingDestination(Operation),
}
