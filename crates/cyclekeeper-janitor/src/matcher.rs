//! Candidate matching
//!
//! Decides, for one directory entry, whether it names a cycle time and
//! whether that cycle time is old enough to act on. The decision is pure:
//! it depends only on the path, the pattern and the cutoff.

use cyclekeeper_domain::CycleTime;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};

/// One directory entry under evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Full path of the entry
    pub path: PathBuf,

    /// Cycle time extracted from the path, once matched
    pub cycle_time: Option<CycleTime>,

    /// Resolved destination, once templated
    pub destination: Option<PathBuf>,
}

impl Candidate {
    /// Fresh, unmatched candidate
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cycle_time: None,
            destination: None,
        }
    }
}

/// Why a pattern hit was not usable (non-fatal)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchDiagnostic {
    /// Capture groups cannot be combined into a 10-digit cycle time
    AmbiguousGroups {
        /// Entry path
        path: String,
        /// Captured text per group (`None` for a group that did not take part)
        groups: Vec<Option<String>>,
    },

    /// Extracted text is not a real cycle time
    InvalidCycleTime {
        /// Entry path
        path: String,
        /// Text assembled from the capture groups
        extracted: String,
    },
}

impl fmt::Display for MatchDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchDiagnostic::AmbiguousGroups { path, groups } => {
                write!(f, "Housekeeping match problem: {} (extracted time groups: {:?})", path, groups)
            }
            MatchDiagnostic::InvalidCycleTime { path, extracted } => {
                write!(f, "Extracted cycle time is not valid: {} (from {})", extracted, path)
            }
        }
    }
}

/// Result of evaluating one entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Pattern does not occur in the path
    NoMatch,

    /// Pattern occurs but yields no usable cycle time
    Diagnostic(MatchDiagnostic),

    /// Matched, but younger than the cutoff
    BelowCutoff {
        /// Extracted cycle time
        cycle_time: CycleTime,
        /// Hours between the base cycle time and the extracted one
        gap: i64,
    },

    /// Matched and old enough to act on
    Actionable {
        /// Extracted cycle time
        cycle_time: CycleTime,
        /// Hours between the base cycle time and the extracted one
        gap: i64,
    },
}

impl MatchOutcome {
    /// Whether the entry counts as matched (a usable cycle time was found)
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::BelowCutoff { .. } | MatchOutcome::Actionable { .. })
    }

    /// Whether the entry should be handed to an action handler
    pub fn is_eligible(&self) -> bool {
        matches!(self, MatchOutcome::Actionable { .. })
    }

    /// Extracted cycle time, if any
    pub fn cycle_time(&self) -> Option<&CycleTime> {
        match self {
            MatchOutcome::BelowCutoff { cycle_time, .. }
            | MatchOutcome::Actionable { cycle_time, .. } => Some(cycle_time),
            _ => None,
        }
    }
}

/// Cutoff test shared by every entry of one rule
#[derive(Debug, Clone)]
pub struct CandidateMatcher {
    pattern: Regex,
    base: CycleTime,
    offset: i64,
}

impl CandidateMatcher {
    /// Matcher for an already validated pattern
    pub fn new(pattern: Regex, base: CycleTime, offset: i64) -> Self {
        Self {
            pattern,
            base,
            offset,
        }
    }

    /// The compiled match pattern
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Evaluate a path
    ///
    /// The pattern is searched for anywhere in the full path. An entry is
    /// actionable when `hours(base - extracted) >= offset`.
    pub fn evaluate(&self, path: &Path) -> MatchOutcome {
        let path = path.to_string_lossy();
        let Some(caps) = self.pattern.captures(&path) else {
            return MatchOutcome::NoMatch;
        };

        let groups: Vec<Option<&str>> = caps.iter().skip(1).map(|g| g.map(|m| m.as_str())).collect();

        let extracted = match groups.as_slice() {
            [Some(stamp)] => stamp.to_string(),
            [Some(a), Some(b)] if a.len() == 8 && b.len() == 2 => format!("{}{}", a, b),
            [Some(a), Some(b)] if a.len() == 2 && b.len() == 8 => format!("{}{}", b, a),
            _ => {
                return MatchOutcome::Diagnostic(MatchDiagnostic::AmbiguousGroups {
                    path: path.to_string(),
                    groups: groups.iter().map(|g| g.map(str::to_string)).collect(),
                });
            }
        };

        let Ok(cycle_time) = CycleTime::parse(&extracted) else {
            return MatchOutcome::Diagnostic(MatchDiagnostic::InvalidCycleTime {
                path: path.to_string(),
                extracted,
            });
        };

        // Assumes the extracted time is at or before the base time
        let gap = self.base.hours_since(&cycle_time);
        if gap >= self.offset {
            MatchOutcome::Actionable { cycle_time, gap }
        } else {
            MatchOutcome::BelowCutoff { cycle_time, gap }
        }
    }

    /// Evaluate a candidate, recording the extracted cycle time on success
    pub fn matches(&self, candidate: &mut Candidate) -> MatchOutcome {
        let outcome = self.evaluate(&candidate.path);
        candidate.cycle_time = outcome.cycle_time().copied();
        outcome
    }
}
