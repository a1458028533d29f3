//! Housekeeping rules
//!
//! A rule is validated in full when it is built, so a rule that exists can
//! always be actioned. Actioning scans the source directory one level deep
//! and feeds eligible entries to a [`BatchExecutor`].

use crate::batch::BatchExecutor;
use crate::error::{HousekeepingError, Result, RuleValidationError};
use crate::handler::ActionInvocation;
use crate::matcher::{Candidate, CandidateMatcher, MatchOutcome};
use crate::report::ActionReport;
use crate::template::DestinationTemplate;
use cyclekeeper_domain::{CycleTime, Environment, Operation};
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};

const SINGLE_GROUP_FORMS: [&str; 2] = [r"(\d{10})", r"([0-9]{10})"];
const DATE_GROUP_FORMS: [&str; 2] = [r"(\d{8})", r"([0-9]{8})"];
const HOUR_GROUP_FORMS: [&str; 2] = [r"(\d{2})", r"([0-9]{2})"];

/// Per-rule output and handler options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleFlags {
    /// Log every entry decision at info level and ask handlers for verbose output
    pub verbose: bool,

    /// Ask handlers for the cheapest implementation (hard links for copies)
    pub cheap: bool,
}

/// Raw fields of one rule line, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDefinition {
    /// Source directory (may reference variables)
    pub source: String,

    /// Match pattern
    pub pattern: String,

    /// Operation name
    pub operation: String,

    /// Offset in hours
    pub offset: String,

    /// Destination template (may reference variables)
    pub destination: Option<String>,
}

impl RuleDefinition {
    /// Definition from the four mandatory fields
    pub fn new(
        source: impl Into<String>,
        pattern: impl Into<String>,
        operation: impl Into<String>,
        offset: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            pattern: pattern.into(),
            operation: operation.into(),
            offset: offset.into(),
            destination: None,
        }
    }

    /// Set the destination template
    pub fn with_destination(mut self, destination: impl Into<String>) -> Self {
        self.destination = Some(destination.into());
        self
    }
}

/// A validated retention policy for one source directory
#[derive(Debug, Clone)]
pub struct HousekeepingRule {
    source: PathBuf,
    matcher: CandidateMatcher,
    operation: Operation,
    base: CycleTime,
    offset: i64,
    destination: Option<DestinationTemplate>,
    flags: RuleFlags,
}

impl HousekeepingRule {
    /// Validate a definition against a base cycle time
    ///
    /// Checks run in a fixed order and stop at the first failure: pattern
    /// shape, base cycle time, offset, source directory, operation, and
    /// finally the destination requirement. Source and destination are
    /// expanded against `env` first.
    pub fn from_definition(
        definition: &RuleDefinition,
        base: &str,
        flags: RuleFlags,
        env: &Environment,
    ) -> std::result::Result<Self, RuleValidationError> {
        let pattern = compile_pattern(&definition.pattern)?;
        let base = CycleTime::parse(base)?;
        let offset: i64 = definition
            .offset
            .parse()
            .map_err(|_| RuleValidationError::InvalidOffset(definition.offset.clone()))?;

        let source = PathBuf::from(env.expand(&definition.source));
        if !source.is_dir() {
            return Err(RuleValidationError::SourceNotFound(source));
        }

        let operation = Operation::parse(&definition.operation)
            .ok_or_else(|| RuleValidationError::UnknownOperation(definition.operation.clone()))?;

        let destination = definition
            .destination
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| DestinationTemplate::expand(d, env));
        if operation.requires_destination() && destination.is_none() {
            return Err(RuleValidationError::MissingDestination(operation));
        }

        Ok(Self {
            source,
            matcher: CandidateMatcher::new(pattern, base, offset),
            operation,
            base,
            offset,
            destination,
            flags,
        })
    }

    /// Source directory (expanded)
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Match pattern
    pub fn pattern(&self) -> &str {
        self.matcher.pattern().as_str()
    }

    /// Operation applied to eligible entries
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Base cycle time
    pub fn base(&self) -> CycleTime {
        self.base
    }

    /// Offset in hours
    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Destination template, if any
    pub fn destination(&self) -> Option<&DestinationTemplate> {
        self.destination.as_ref()
    }

    /// Output and handler options
    pub fn flags(&self) -> RuleFlags {
        self.flags
    }

    /// Oldest cycle time that is still kept, for display
    pub fn cutoff(&self) -> Option<CycleTime> {
        self.base.minus_hours(self.offset).ok()
    }

    /// Run the matcher on a candidate
    pub fn matches(&self, candidate: &mut Candidate) -> MatchOutcome {
        self.matcher.matches(candidate)
    }

    /// Fill in the candidate's destination from its matched cycle time
    ///
    /// Delete rules never carry a destination to their handler.
    pub fn resolve_destination(&self, candidate: &mut Candidate) {
        if self.operation == Operation::Delete {
            return;
        }
        if let (Some(template), Some(cycle_time)) = (&self.destination, &candidate.cycle_time) {
            let resolved = template.resolve(cycle_time);
            if template.has_placeholders() {
                self.note(format_args!(" + expanded destination: {}", resolved.display()));
            }
            candidate.destination = Some(resolved);
        }
    }

    /// Scan the source directory and submit every eligible entry
    ///
    /// Entries are visited in name order. The executor is drained before
    /// returning, so every submitted entry is accounted for in the report.
    pub async fn action(&self, batch: &mut BatchExecutor) -> Result<ActionReport> {
        self.log_header();

        let mut report = ActionReport::new(self.source.clone(), self.operation.as_str());
        report.dry_run = batch.is_dry_run();
        let failed_before = batch.failed();

        for path in self.list_entries().await? {
            self.note(format_args!("Source item: {}", path.display()));
            let mut candidate = Candidate::new(path);

            match self.matches(&mut candidate) {
                MatchOutcome::NoMatch => {
                    self.note(format_args!(" + does not match"));
                    report.record_not_matched();
                }
                MatchOutcome::Diagnostic(diagnostic) => {
                    tracing::warn!("{} (pattern: {})", diagnostic, self.pattern());
                    report.record_diagnostic();
                }
                MatchOutcome::BelowCutoff { cycle_time, gap } => {
                    self.note(format_args!(
                        " + {}: {} hours old, ignoring (does not make the cutoff)",
                        cycle_time, gap
                    ));
                    report.record_below_cutoff();
                }
                MatchOutcome::Actionable { cycle_time, gap } => {
                    self.note(format_args!(
                        " + {}: {} hours old, ACTIONABLE",
                        cycle_time, gap
                    ));
                    report.record_eligible();
                    self.resolve_destination(&mut candidate);
                    report.actioned += batch.add_or_process(self.invocation(candidate)).await;
                }
            }
        }
        report.actioned += batch.process().await;
        report.failed = batch.failed() - failed_before;

        tracing::info!("MATCHED : {}/{}", report.matched, report.scanned);
        tracing::info!("ACTIONED: {}/{}", report.actioned, report.matched);
        if report.failed > 0 {
            tracing::warn!("{} {} action(s) failed", report.failed, self.operation);
        }

        Ok(report)
    }

    fn invocation(&self, candidate: Candidate) -> ActionInvocation {
        ActionInvocation {
            operation: self.operation,
            source: candidate.path,
            destination: candidate.destination,
            verbose: self.flags.verbose,
            cheap: self.flags.cheap,
        }
    }

    async fn list_entries(&self) -> Result<Vec<PathBuf>> {
        let mut dir = tokio::fs::read_dir(&self.source)
            .await
            .map_err(|e| HousekeepingError::io("listing", &self.source, e))?;

        let mut entries = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| HousekeepingError::io("listing", &self.source, e))?
        {
            entries.push(entry.path());
        }
        entries.sort();
        Ok(entries)
    }

    fn log_header(&self) {
        tracing::info!("SOURCE: {}", self.source.display());
        if let Some(destination) = &self.destination {
            tracing::info!("TARGET: {}", destination.as_str());
        }
        tracing::info!("MATCH : {}", self.pattern());
        tracing::info!("ACTION: {}", self.operation);
        match self.cutoff() {
            Some(cutoff) => tracing::info!("CUTOFF: {} - {} = {}", self.base, self.offset, cutoff),
            None => tracing::info!("CUTOFF: {} - {} = (out of range)", self.base, self.offset),
        }
    }

    fn note(&self, message: fmt::Arguments<'_>) {
        if self.flags.verbose {
            tracing::info!("{}", message);
        } else {
            tracing::debug!("{}", message);
        }
    }
}

impl fmt::Display for HousekeepingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.source.display(),
            self.pattern(),
            self.operation,
            self.offset
        )?;
        if let Some(destination) = &self.destination {
            write!(f, " {}", destination.as_str())?;
        }
        Ok(())
    }
}

/// Compile a match pattern and check that its groups form a cycle time
fn compile_pattern(pattern: &str) -> std::result::Result<Regex, RuleValidationError> {
    let regex = Regex::new(pattern).map_err(|source| RuleValidationError::InvalidRegex {
        pattern: pattern.to_string(),
        source,
    })?;

    let has = |forms: &[&str]| forms.iter().any(|form| pattern.contains(form));
    let shaped = match regex.captures_len() - 1 {
        1 => has(&SINGLE_GROUP_FORMS),
        2 => has(&DATE_GROUP_FORMS) && has(&HOUR_GROUP_FORMS),
        _ => false,
    };

    if shaped {
        Ok(regex)
    } else {
        Err(RuleValidationError::BadPattern {
            pattern: pattern.to_string(),
            reason: r"expected one (\d{10}) group, or (\d{8}) and (\d{2}) groups",
        })
    }
}
