//! Reports produced by housekeeping runs

use serde::Serialize;
use std::path::PathBuf;

/// Counts for one rule's pass over its source directory
///
/// Every scanned entry ends up either matched or not matched. Matched
/// entries are either below the cutoff or eligible; eligible entries are
/// either actioned or failed once their batch has run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionReport {
    /// Directory that was scanned
    pub source: PathBuf,

    /// Operation name (copy, move, delete)
    pub operation: String,

    /// Entries listed in the source directory
    pub scanned: usize,

    /// Entries that yielded a valid cycle time
    pub matched: usize,

    /// Entries that did not match (including diagnostics)
    pub not_matched: usize,

    /// Pattern hits that produced no usable cycle time
    pub diagnostics: usize,

    /// Matched entries younger than the cutoff
    pub below_cutoff: usize,

    /// Matched entries handed to the batch executor
    pub eligible: usize,

    /// Handler invocations that exited successfully
    pub actioned: usize,

    /// Handler invocations that failed, timed out or never started
    pub failed: usize,

    /// Whether handlers were suppressed (dry run)
    pub dry_run: bool,
}

impl ActionReport {
    /// Create an empty report for a rule
    pub fn new(source: impl Into<PathBuf>, operation: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            operation: operation.into(),
            ..Self::default()
        }
    }

    /// Record an entry that the pattern does not match
    pub fn record_not_matched(&mut self) {
        self.scanned += 1;
        self.not_matched += 1;
    }

    /// Record a pattern hit without a usable cycle time
    pub fn record_diagnostic(&mut self) {
        self.record_not_matched();
        self.diagnostics += 1;
    }

    /// Record a matched entry that is too young
    pub fn record_below_cutoff(&mut self) {
        self.scanned += 1;
        self.matched += 1;
        self.below_cutoff += 1;
    }

    /// Record a matched entry that was submitted for action
    pub fn record_eligible(&mut self) {
        self.scanned += 1;
        self.matched += 1;
        self.eligible += 1;
    }

    /// Whether the counters add up
    pub fn is_consistent(&self) -> bool {
        self.matched + self.not_matched == self.scanned
            && self.below_cutoff + self.eligible == self.matched
            && self.actioned + self.failed <= self.eligible
    }

    /// Two-line summary in the classic housekeeping layout
    pub fn summary(&self) -> String {
        format!(
            "MATCHED : {}/{}\nACTIONED: {}/{}",
            self.matched, self.scanned, self.actioned, self.matched
        )
    }
}

/// Aggregate of every rule in a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Per-rule reports in execution order
    pub rules: Vec<ActionReport>,

    /// Wall-clock duration of the run in milliseconds
    pub total_runtime_ms: u64,
}

impl RunReport {
    /// Create an empty run report
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finished rule
    pub fn record(&mut self, report: ActionReport) {
        self.rules.push(report);
    }

    /// Entries scanned across all rules
    pub fn total_scanned(&self) -> usize {
        self.rules.iter().map(|r| r.scanned).sum()
    }

    /// Entries matched across all rules
    pub fn total_matched(&self) -> usize {
        self.rules.iter().map(|r| r.matched).sum()
    }

    /// Successful actions across all rules
    pub fn total_actioned(&self) -> usize {
        self.rules.iter().map(|r| r.actioned).sum()
    }

    /// Failed actions across all rules
    pub fn total_failed(&self) -> usize {
        self.rules.iter().map(|r| r.failed).sum()
    }

    /// Generate a summary report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Housekeeping Summary".to_string(),
            "====================".to_string(),
            format!("Rules: {}", self.rules.len()),
            format!("Total runtime: {}ms", self.total_runtime_ms),
            String::new(),
        ];

        for report in &self.rules {
            let marker = if report.dry_run { " (dry run)" } else { "" };
            lines.push(format!(
                "  {} {}{}: matched {}/{}, actioned {}/{}, failed {}",
                report.operation,
                report.source.display(),
                marker,
                report.matched,
                report.scanned,
                report.actioned,
                report.matched,
                report.failed
            ));
        }

        if !self.rules.is_empty() {
            lines.push(String::new());
        }
        lines.push(format!("Total scanned: {}", self.total_scanned()));
        lines.push(format!("Total matched: {}", self.total_matched()));
        lines.push(format!("Total actioned: {}", self.total_actioned()));
        lines.push(format!("Total failed: {}", self.total_failed()));

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_creation() {
        let report = ActionReport::new("/data", "delete");
        assert_eq!(report.scanned, 0);
        assert_eq!(report.operation, "delete");
        assert!(report.is_consistent());
    }

    #[test]
    fn test_counters_partition_scanned_entries() {
        let mut report = ActionReport::new("/data", "copy");
        report.record_not_matched();
        report.record_diagnostic();
        report.record_below_cutoff();
        report.record_eligible();
        report.record_eligible();
        report.actioned = 1;
        report.failed = 1;

        assert_eq!(report.scanned, 5);
        assert_eq!(report.matched, 3);
        assert_eq!(report.not_matched, 2);
        assert_eq!(report.diagnostics, 1);
        assert!(report.is_consistent());
    }

    #[test]
    fn test_inconsistent_when_overcounted() {
        let mut report = ActionReport::new("/data", "copy");
        report.record_eligible();
        report.actioned = 2;
        assert!(!report.is_consistent());
    }

    #[test]
    fn test_rule_summary() {
        let mut report = ActionReport::new("/data", "move");
        report.record_eligible();
        report.record_not_matched();
        report.actioned = 1;
        assert_eq!(report.summary(), "MATCHED : 1/2\nACTIONED: 1/1");
    }

    #[test]
    fn test_run_totals_and_summary() {
        let mut run = RunReport::new();

        let mut a = ActionReport::new("/a", "delete");
        a.record_eligible();
        a.actioned = 1;
        run.record(a);

        let mut b = ActionReport::new("/b", "copy");
        b.record_eligible();
        b.record_below_cutoff();
        b.failed = 1;
        b.dry_run = true;
        run.record(b);
        run.total_runtime_ms = 42;

        assert_eq!(run.total_scanned(), 3);
        assert_eq!(run.total_matched(), 3);
        assert_eq!(run.total_actioned(), 1);
        assert_eq!(run.total_failed(), 1);

        let summary = run.summary();
        assert!(summary.contains("Rules: 2"));
        assert!(summary.contains("Total runtime: 42ms"));
        assert!(summary.contains("delete /a: matched 1/1, actioned 1/1, failed 0"));
        assert!(summary.contains("copy /b (dry run)"));
        assert!(summary.contains("Total actioned: 1"));
    }
}
