//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use cyclekeeper_janitor::RunReport;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format a finished run.
    pub fn format_run(&self, report: &RunReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
            OutputFormat::Table => Ok(self.format_run_table(report)),
            OutputFormat::Quiet => Ok(self.format_run_quiet(report)),
        }
    }

    /// Format a run as a per-rule table followed by totals.
    fn format_run_table(&self, report: &RunReport) -> String {
        if report.rules.is_empty() {
            return self.colorize("No housekeeping rules to action.", "yellow");
        }

        let mut builder = Builder::default();
        builder.push_record(["Operation", "Source", "Matched", "Actioned", "Failed"]);

        for rule in &report.rules {
            let operation = if rule.dry_run {
                format!("{} (dry run)", rule.operation)
            } else {
                rule.operation.clone()
            };
            builder.push_record([
                operation,
                rule.source.display().to_string(),
                format!("{}/{}", rule.matched, rule.scanned),
                format!("{}/{}", rule.actioned, rule.matched),
                rule.failed.to_string(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let totals = format!(
            "{} rule(s), {} actioned, {} failed in {}ms",
            report.rules.len(),
            report.total_actioned(),
            report.total_failed(),
            report.total_runtime_ms
        );
        let totals = if report.total_failed() > 0 {
            self.warning(&totals)
        } else {
            self.success(&totals)
        };

        format!("{}\n{}", table, totals)
    }

    /// Format a run in quiet mode (`actioned/matched failed`).
    fn format_run_quiet(&self, report: &RunReport) -> String {
        format!(
            "{}/{} {}",
            report.total_actioned(),
            report.total_matched(),
            report.total_failed()
        )
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
