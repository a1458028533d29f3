//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use cyclekeeper_domain::Operation;
use std::path::PathBuf;

/// Cyclekeeper - cycle-time driven housekeeping for product directories.
#[derive(Debug, Parser)]
#[command(name = "cyclekeeper")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Report every entry decision and pass --verbose to action handlers
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (totals only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a rule file and action every rule
    Run(RunArgs),

    /// Copy, move or delete a single entry (the built-in action handler)
    Action(ActionArgs),
}

/// Arguments for the run command.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Housekeeping rule file
    pub rules: PathBuf,

    /// Base cycle time (YYYYMMDDHH)
    #[arg(env = "CYCLE_TIME")]
    pub cycle_time: String,

    /// Skip rule lines matching any of these comma/space separated regexes
    #[arg(short = 'e', long)]
    pub exclude: Option<String>,

    /// Only action rule lines matching one of these comma/space separated regexes
    #[arg(short = 'o', long)]
    pub only: Option<String>,

    /// Maximum number of action handlers running at once
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Prefer hard links over copies
    #[arg(short, long)]
    pub cheap: bool,

    /// Report what would be actioned without launching handlers
    #[arg(long)]
    pub dry_run: bool,

    /// Kill action handlers running longer than this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Settings file (TOML)
    #[arg(short, long, env = "CYCLEKEEPER_SETTINGS")]
    pub settings: Option<PathBuf>,
}

/// Arguments for the action command.
#[derive(Debug, Parser)]
pub struct ActionArgs {
    /// Try hard links before copying
    #[arg(long)]
    pub cheap: bool,

    /// Operation to perform
    pub operation: Operation,

    /// Entry to act on
    pub source: PathBuf,

    /// Destination directory (empty or absent for delete)
    pub destination: Option<String>,
}

impl ActionArgs {
    /// Destination, treating an empty argument as absent
    pub fn destination(&self) -> Option<PathBuf> {
        self.destination
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
    }
}
