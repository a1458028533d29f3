//! Run command implementation.

use crate::cli::RunArgs;
use crate::config::{default_handler, Config};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use cyclekeeper_domain::{cycle_time, Environment};
use cyclekeeper_janitor::{Janitor, LineFilter, RunReport};

/// Execute the run command.
pub async fn execute_run(
    args: RunArgs,
    verbose: bool,
    mut config: Config,
    formatter: &Formatter,
) -> Result<RunReport> {
    if !cycle_time::is_valid(&args.cycle_time) {
        return Err(CliError::InvalidInput(format!(
            "Bad cycle time: {}",
            args.cycle_time
        )));
    }

    config.apply_run_args(&args, verbose);
    let filter = LineFilter::new(args.exclude.as_deref(), args.only.as_deref())?;

    let janitor = Janitor::with_commands(config.housekeeping, &default_handler()?);
    let report = janitor
        .run_file(&args.rules, &args.cycle_time, filter, Environment::from_process())
        .await?;

    println!("{}", formatter.format_run(&report)?);
    Ok(report)
}
