//! Rule file parsing
//!
//! A rule file is read top to bottom. Variable definitions (`NAME=VALUE`)
//! bind into the [`Environment`] as they are met, so a rule line sees every
//! definition above it. Any invalid rule aborts the whole parse.

use crate::error::{HousekeepingError, Result};
use crate::rule::{HousekeepingRule, RuleDefinition, RuleFlags};
use cyclekeeper_domain::Environment;
use regex::Regex;
use std::path::Path;

/// Exclude/only selection of rule lines
///
/// Each list holds regular expressions searched against the content line
/// (comments already stripped). A line matching any exclude expression is
/// skipped. When only-expressions are present, their verdict decides alone:
/// a line matching one of them is kept even if it also matched an exclude
/// expression.
#[derive(Debug, Clone, Default)]
pub struct LineFilter {
    exclude: Vec<Regex>,
    only: Vec<Regex>,
}

impl LineFilter {
    /// Build a filter from comma- or space-separated expression lists
    pub fn new(exclude: Option<&str>, only: Option<&str>) -> Result<Self> {
        Ok(Self {
            exclude: compile_list(exclude)?,
            only: compile_list(only)?,
        })
    }

    /// Filter that keeps every line
    pub fn keep_all() -> Self {
        Self::default()
    }

    /// Whether no expressions were given
    pub fn is_empty(&self) -> bool {
        self.exclude.is_empty() && self.only.is_empty()
    }

    /// Whether `line` survives the filter
    pub fn keep(&self, line: &str) -> bool {
        let mut skip = false;
        if !self.exclude.is_empty() {
            skip = self.exclude.iter().any(|re| re.is_match(line));
        }
        if !self.only.is_empty() {
            // replaces the exclude verdict rather than combining with it
            skip = !self.only.iter().any(|re| re.is_match(line));
        }
        !skip
    }
}

fn compile_list(list: Option<&str>) -> Result<Vec<Regex>> {
    list.unwrap_or_default()
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map(|p| {
            Regex::new(p).map_err(|source| HousekeepingError::Filter {
                pattern: p.to_string(),
                source,
            })
        })
        .collect()
}

/// Parser for line-oriented housekeeping rule files
///
/// ```text
/// # comment
/// ARCHIVE=/archive/$USER
/// $DATA/nwp   nwp_(\d{10})\.nc          delete  48
/// $DATA/obs   obs_(\d{8})_(\d{2})\.dat  copy    24   $ARCHIVE/YYYY/MM
/// ```
#[derive(Debug, Clone)]
pub struct RuleFileParser {
    base: String,
    filter: LineFilter,
    flags: RuleFlags,
}

impl RuleFileParser {
    /// Parser validating every rule against `base`
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            filter: LineFilter::keep_all(),
            flags: RuleFlags::default(),
        }
    }

    /// Apply an exclude/only filter to rule lines
    pub fn with_filter(mut self, filter: LineFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Flags given to every parsed rule
    pub fn with_flags(mut self, flags: RuleFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Parse a rule file, binding its variable definitions into `env`
    pub async fn parse_file(
        &self,
        path: &Path,
        env: &mut Environment,
    ) -> Result<Vec<HousekeepingRule>> {
        let is_file = tokio::fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(HousekeepingError::config(path, "file not found"));
        }

        let shown = tokio::fs::canonicalize(path)
            .await
            .unwrap_or_else(|_| path.to_path_buf());
        tracing::info!("Parsing housekeeping config file {}", shown.display());

        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| HousekeepingError::io("reading", path, e))?;
        self.parse_str(&contents, path, env)
    }

    /// Parse rule file contents; `origin` is only used in error messages
    pub fn parse_str(
        &self,
        contents: &str,
        origin: &Path,
        env: &mut Environment,
    ) -> Result<Vec<HousekeepingRule>> {
        let mut rules = Vec::new();

        for (index, raw) in contents.lines().enumerate() {
            let number = index + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let line = strip_comment(raw);
            if line.trim().is_empty() {
                continue;
            }

            if let Some((name, raw)) = split_definition(&line) {
                let value = env.define(name, raw.trim());
                if self.flags.verbose {
                    tracing::info!("Defining variable: {} = {}", name, value);
                } else {
                    tracing::debug!("Defining variable: {} = {}", name, value);
                }
                continue;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            let mut definition = match tokens.as_slice() {
                [source, pattern, operation, offset] => {
                    RuleDefinition::new(*source, *pattern, *operation, *offset)
                }
                [source, pattern, operation, offset, destination] => {
                    RuleDefinition::new(*source, *pattern, *operation, *offset)
                        .with_destination(*destination)
                }
                _ => {
                    return Err(HousekeepingError::config(
                        origin,
                        format!("illegal config line {}: {}", number, line.trim()),
                    ));
                }
            };

            if !self.filter.keep(&line) {
                tracing::info!("SKIPPING {}", line.trim());
                continue;
            }

            definition.destination = definition.destination.filter(|d| !d.is_empty());
            let rule = HousekeepingRule::from_definition(&definition, &self.base, self.flags, env)
                .map_err(|source| HousekeepingError::InvalidRule {
                    path: origin.to_path_buf(),
                    line: number,
                    source,
                })?;
            rules.push(rule);
        }

        tracing::debug!("Parsed {} housekeeping rule(s) from {}", rules.len(), origin.display());
        Ok(rules)
    }
}

/// `NAME=VALUE` with a word-character name starting the line
fn split_definition(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once('=')?;
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    (!name.is_empty() && name.chars().all(is_word)).then_some((name, value))
}

/// Drop everything from the first unescaped `#`; `\#` becomes a literal `#`
fn strip_comment(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'#') => {
                out.push('#');
                chars.next();
            }
            '#' => break,
            _ => out.push(c),
        }
    }

    out
}
