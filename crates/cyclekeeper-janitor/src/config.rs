//! Run settings for housekeeping
//!
//! Defines batch sizing, dry-run mode and the action handler command.

use crate::{HousekeepingError, Result};
use cyclekeeper_domain::Operation;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings applied to every rule of a housekeeping run
///
/// # Examples
///
/// ```
/// use cyclekeeper_janitor::HousekeepingConfig;
///
/// // Default configuration (balanced)
/// let config = HousekeepingConfig::default();
/// assert_eq!(config.batch_size, 10);
///
/// // Fewer concurrent handlers
/// let config = HousekeepingConfig::conservative();
/// assert_eq!(config.batch_size, 4);
///
/// // More concurrent handlers
/// let config = HousekeepingConfig::aggressive();
/// assert_eq!(config.batch_size, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousekeepingConfig {
    /// Maximum number of action handlers running at once
    /// Default: 10
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Dry-run mode: report actionable entries without launching handlers
    /// Default: false
    #[serde(default)]
    pub dry_run: bool,

    /// Log every entry decision at info level
    /// Default: false
    #[serde(default)]
    pub verbose: bool,

    /// Ask handlers for the cheapest implementation (hard links over copies)
    /// Default: false
    #[serde(default)]
    pub cheap: bool,

    /// Per-invocation deadline in seconds; unset means wait forever
    /// Default: none
    #[serde(default)]
    pub handler_timeout_secs: Option<u64>,

    /// Action handler command(s)
    #[serde(default)]
    pub handler: HandlerConfig,
}

/// External command invoked for a single candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Program to execute
    pub program: PathBuf,

    /// Leading arguments placed before the per-candidate arguments
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Command with no leading arguments
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a leading argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Which command handles which operation
///
/// `command` is shared by every operation unless a per-operation override is
/// given. When nothing is configured the caller supplies a fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Command used for every operation without an override
    #[serde(default)]
    pub command: Option<CommandSpec>,

    /// Override for copy
    #[serde(default)]
    pub copy: Option<CommandSpec>,

    /// Override for move
    #[serde(default, rename = "move")]
    pub move_: Option<CommandSpec>,

    /// Override for delete
    #[serde(default)]
    pub delete: Option<CommandSpec>,
}

impl HandlerConfig {
    /// Configured command for `operation`, if any
    pub fn command_for(&self, operation: Operation) -> Option<&CommandSpec> {
        let specific = match operation {
            Operation::Copy => self.copy.as_ref(),
            Operation::Move => self.move_.as_ref(),
            Operation::Delete => self.delete.as_ref(),
        };
        specific.or(self.command.as_ref())
    }
}

fn default_batch_size() -> usize {
    10
}

impl Default for HousekeepingConfig {
    /// Balanced defaults
    ///
    /// - Batch size: 10
    /// - No dry run, not verbose, not cheap
    /// - No handler timeout
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            dry_run: false,
            verbose: false,
            cheap: false,
            handler_timeout_secs: None,
            handler: HandlerConfig::default(),
        }
    }
}

impl HousekeepingConfig {
    /// Small batches and a one-hour handler deadline
    ///
    /// Suitable for shared filesystems where many concurrent copies hurt.
    pub fn conservative() -> Self {
        Self {
            batch_size: 4,
            handler_timeout_secs: Some(3600),
            ..Self::default()
        }
    }

    /// Large batches for fast local disks with many stale entries
    pub fn aggressive() -> Self {
        Self {
            batch_size: 32,
            ..Self::default()
        }
    }

    /// Parse settings from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: HousekeepingConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| HousekeepingError::io("reading settings", path, e))?;
        Self::from_toml_str(&contents)
    }

    /// Reject settings that cannot drive a run
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(HousekeepingError::Settings(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.handler_timeout_secs == Some(0) {
            return Err(HousekeepingError::Settings(
                "handler_timeout_secs must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Handler deadline as a Duration
    pub fn handler_timeout(&self) -> Option<Duration> {
        self.handler_timeout_secs.map(Duration::from_secs)
    }
}
