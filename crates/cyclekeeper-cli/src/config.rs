//! Configuration management for the CLI.

use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use cyclekeeper_janitor::{CommandSpec, HousekeepingConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
///
/// ```toml
/// [housekeeping]
/// batch_size = 8
/// cheap = true
///
/// [housekeeping.handler.delete]
/// program = "/usr/local/bin/purge"
///
/// [output]
/// color = false
/// format = "json"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Run settings handed to the janitor
    #[serde(default)]
    pub housekeeping: HousekeepingConfig,

    /// Output settings
    #[serde(default)]
    pub output: OutputSettings,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (totals only) format
    Quiet,
}

impl From<crate::cli::CliFormat> for OutputFormat {
    fn from(format: crate::cli::CliFormat) -> Self {
        match format {
            crate::cli::CliFormat::Table => OutputFormat::Table,
            crate::cli::CliFormat::Json => OutputFormat::Json,
            crate::cli::CliFormat::Quiet => OutputFormat::Quiet,
        }
    }
}

impl Config {
    /// Default settings file location (`<config dir>/cyclekeeper/settings.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cyclekeeper").join("settings.toml"))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used when present, otherwise built-in defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) if !path.is_file() => {
                return Err(CliError::Config(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
            Some(path) => path.to_path_buf(),
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        tracing::debug!("Loading settings from {}", path.display());
        let contents = fs::read_to_string(&path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.housekeeping.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides to the run settings.
    pub fn apply_run_args(&mut self, args: &RunArgs, verbose: bool) {
        let settings = &mut self.housekeeping;
        if let Some(batch_size) = args.batch_size {
            settings.batch_size = batch_size;
        }
        if let Some(timeout) = args.timeout {
            settings.handler_timeout_secs = Some(timeout);
        }
        settings.dry_run |= args.dry_run;
        settings.cheap |= args.cheap;
        settings.verbose |= verbose;
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

/// Handler used for operations the settings leave unset: this executable's
/// own `action` subcommand.
pub fn default_handler() -> Result<CommandSpec> {
    let exe = std::env::current_exe()
        .map_err(|e| CliError::Config(format!("Cannot locate own executable: {}", e)))?;
    Ok(CommandSpec::new(exe).arg("action"))
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}
