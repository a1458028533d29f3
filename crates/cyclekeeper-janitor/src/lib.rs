//! Cyclekeeper Janitor
//!
//! Cycle-time driven housekeeping for directories of forecast or
//! observation products.
//!
//! # Overview
//!
//! Entries whose names embed a `YYYYMMDDHH` cycle time are copied, moved or
//! deleted once they are older than a cutoff. The Janitor is responsible for:
//! - **Rule parsing**: reading a line-oriented rule file, with variable
//!   definitions and exclude/only line filters
//! - **Matching**: extracting a cycle time from each entry and testing it
//!   against the rule's cutoff
//! - **Destination templating**: expanding `YYYY`, `MM`, `DD`, `HH` (and
//!   their concatenations) in destination paths
//! - **Batch execution**: running action handlers in bounded, fully joined
//!   batches
//! - **Reporting**: per-rule and per-run counts
//!
//! # Rule files
//!
//! ```text
//! # SOURCE            MATCH                    OPERATION  OFFSET  [DESTINATION]
//! ARCHIVE=/archive/$USER
//! $DATA/nwp           nwp_(\d{10})\.nc         delete     48
//! $DATA/obs           obs_(\d{8})_(\d{2})      move       24      $ARCHIVE/YYYY/MM
//! ```
//!
//! An entry is actionable when `hours(base - extracted) >= offset`.
//!
//! # Usage
//!
//! ```no_run
//! use cyclekeeper_domain::Environment;
//! use cyclekeeper_janitor::{CommandSpec, HousekeepingConfig, Janitor, LineFilter};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let janitor = Janitor::with_commands(
//!         HousekeepingConfig::default(),
//!         &CommandSpec::new("cyclekeeper").arg("action"),
//!     );
//!
//!     let filter = LineFilter::new(Some("scratch"), None)?;
//!     let report = janitor
//!         .run_file(Path::new("housekeeping.conf"), "2008080800", filter, Environment::from_process())
//!         .await?;
//!
//!     println!("{}", report.summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration Presets
//!
//! ```
//! use cyclekeeper_janitor::HousekeepingConfig;
//!
//! // Default: batches of 10, no handler deadline
//! let config = HousekeepingConfig::default();
//!
//! // Conservative: batches of 4, one-hour deadline per handler
//! let config = HousekeepingConfig::conservative();
//!
//! // Aggressive: batches of 32
//! let config = HousekeepingConfig::aggressive();
//! ```
//!
//! # Configuration
//!
//! Run settings can be loaded from TOML:
//!
//! ```toml
//! batch_size = 10
//! dry_run = false
//! verbose = false
//! cheap = true
//! handler_timeout_secs = 3600
//!
//! [handler.command]
//! program = "/usr/local/bin/cyclekeeper"
//! args = ["action"]
//!
//! [handler.delete]
//! program = "/usr/local/bin/purge"
//! ```

#![warn(missing_docs)]

mod batch;
mod config;
mod error;
mod handler;
mod janitor;
mod matcher;
mod parser;
mod report;
mod rule;
mod template;

pub use batch::{BatchExecutor, BatchState};
pub use config::{CommandSpec, HandlerConfig, HousekeepingConfig};
pub use error::{HousekeepingError, Result, RuleValidationError};
pub use handler::{ActionHandler, ActionInvocation, ActionOutcome, CommandHandler, HandlerTable};
pub use janitor::Janitor;
pub use matcher::{Candidate, CandidateMatcher, MatchDiagnostic, MatchOutcome};
pub use parser::{LineFilter, RuleFileParser};
pub use report::{ActionReport, RunReport};
pub use rule::{HousekeepingRule, RuleDefinition, RuleFlags};
pub use template::DestinationTemplate;
