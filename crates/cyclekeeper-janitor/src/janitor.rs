//! Run orchestration: parse, then action each rule in order

use crate::batch::BatchExecutor;
use crate::config::{CommandSpec, HousekeepingConfig};
use crate::error::Result;
use crate::handler::{ActionHandler, CommandHandler, HandlerTable};
use crate::parser::{LineFilter, RuleFileParser};
use crate::report::RunReport;
use crate::rule::{HousekeepingRule, RuleFlags};
use cyclekeeper_domain::Environment;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Housekeeping service
///
/// Rules run strictly one after another; the only concurrency is inside a
/// rule's batches. Each rule gets a fresh [`BatchExecutor`].
///
/// # Examples
///
/// ```no_run
/// use cyclekeeper_domain::Environment;
/// use cyclekeeper_janitor::{CommandSpec, HousekeepingConfig, Janitor, LineFilter};
/// use std::path::Path;
///
/// # async fn demo() -> cyclekeeper_janitor::Result<()> {
/// let janitor = Janitor::with_commands(
///     HousekeepingConfig::default(),
///     &CommandSpec::new("/usr/local/bin/cyclekeeper").arg("action"),
/// );
///
/// let report = janitor
///     .run_file(
///         Path::new("housekeeping.conf"),
///         "2008080800",
///         LineFilter::keep_all(),
///         Environment::from_process(),
///     )
///     .await?;
/// println!("{}", report.summary());
/// # Ok(())
/// # }
/// ```
pub struct Janitor {
    config: HousekeepingConfig,
    handler: Arc<dyn ActionHandler>,
}

impl Janitor {
    /// Create a janitor that hands actionable entries to `handler`
    pub fn new(config: HousekeepingConfig, handler: Arc<dyn ActionHandler>) -> Self {
        Self { config, handler }
    }

    /// Create a janitor that spawns the configured handler commands
    ///
    /// `fallback` is used for every operation the settings leave unset.
    pub fn with_commands(config: HousekeepingConfig, fallback: &CommandSpec) -> Self {
        let table = HandlerTable::from_config(&config.handler, fallback);
        let handler = CommandHandler::new(table).with_timeout(config.handler_timeout());
        Self::new(config, Arc::new(handler))
    }

    /// Run settings
    pub fn config(&self) -> &HousekeepingConfig {
        &self.config
    }

    /// Flags applied to every rule parsed by [`Janitor::run_file`]
    pub fn rule_flags(&self) -> RuleFlags {
        RuleFlags {
            verbose: self.config.verbose,
            cheap: self.config.cheap,
        }
    }

    /// Action every rule in order
    ///
    /// Stops at the first fatal error (an unreadable source directory);
    /// failed handler invocations are only counted.
    pub async fn run(&self, rules: &[HousekeepingRule], env: Arc<Environment>) -> Result<RunReport> {
        self.config.validate()?;
        let start = Instant::now();

        if self.config.dry_run {
            tracing::info!("DRY RUN: no action handlers will be launched");
        }

        let mut run = RunReport::new();
        for rule in rules {
            let mut batch = BatchExecutor::new(
                self.config.batch_size,
                Arc::clone(&self.handler),
                Arc::clone(&env),
            )
            .with_dry_run(self.config.dry_run);

            let report = rule.action(&mut batch).await?;
            run.record(report);
        }

        run.total_runtime_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(
            "Housekeeping finished: {} rule(s), {} actioned, {} failed in {}ms",
            run.rules.len(),
            run.total_actioned(),
            run.total_failed(),
            run.total_runtime_ms
        );

        Ok(run)
    }

    /// Parse a rule file against `base` and run it
    ///
    /// Definitions in the file extend `env`, which is then passed to every
    /// handler invocation.
    pub async fn run_file(
        &self,
        path: &Path,
        base: &str,
        filter: LineFilter,
        mut env: Environment,
    ) -> Result<RunReport> {
        let rules = RuleFileParser::new(base)
            .with_filter(filter)
            .with_flags(self.rule_flags())
            .parse_file(path, &mut env)
            .await?;

        self.run(&rules, Arc::new(env)).await
    }
}
