//! Error types for the CLI application.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Housekeeping run failed
    #[error(transparent)]
    Housekeeping(#[from] cyclekeeper_janitor::HousekeepingError),

    /// An existing target differs from the entry being copied or moved
    #[error("Non-identical target already exists: {}", .0.display())]
    NonIdenticalTarget(PathBuf),

    /// Filesystem operation failed
    #[error("{0:#}")]
    Action(#[from] anyhow::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_action_error_shows_context_chain() {
        let err: CliError = Err::<(), _>(std::io::Error::from(std::io::ErrorKind::NotFound))
            .context("removing /data/2008080800")
            .unwrap_err()
            .into();
        let text = err.to_string();
        assert!(text.starts_with("removing /data/2008080800: "), "{}", text);
    }

    #[test]
    fn test_non_identical_target_message() {
        let err = CliError::NonIdenticalTarget(PathBuf::from("/arch/2008080800"));
        assert_eq!(
            err.to_string(),
            "Non-identical target already exists: /arch/2008080800"
        );
    }
}
