//! Cyclekeeper CLI - cycle-time driven housekeeping.

use clap::Parser;
use cyclekeeper_cli::commands;
use cyclekeeper_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Logs go to stderr so that report output on stdout stays machine readable.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "info,cyclekeeper_janitor=debug,cyclekeeper_cli=debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> cyclekeeper_cli::Result<()> {
    match cli.command {
        Command::Action(args) => commands::execute_action(args, cli.verbose),
        Command::Run(args) => {
            let config = Config::load(args.settings.as_deref())?;

            let format = cli.format.map(Into::into).unwrap_or(config.output.format);
            let color_enabled = !cli.no_color && config.output.color;
            let formatter = Formatter::new(format, color_enabled);

            let report = commands::execute_run(args, cli.verbose, config, &formatter).await?;
            if report.total_failed() > 0 {
                eprintln!(
                    "{}",
                    formatter.warning(&format!("{} action(s) failed", report.total_failed()))
                );
            }
            Ok(())
        }
    }
}
