//! Destination path templating
//!
//! Destinations may embed cycle-time placeholders (`YYYY`, `MM`, `DD`, `HH`
//! and their concatenations). Expansion is one left-to-right pass that
//! recognises the longest placeholder at each position, so text produced by
//! one substitution is never rescanned. Text that came from a variable value
//! is never scanned at all.

use cyclekeeper_domain::{CycleTime, Environment, Fragment};
use std::ops::Range;
use std::path::PathBuf;

/// Placeholders and the slice of the `YYYYMMDDHH` stamp each one stands for,
/// longest first
const PLACEHOLDERS: [(&str, Range<usize>); 8] = [
    ("YYYYMMDDHH", 0..10),
    ("YYYYMMDD", 0..8),
    ("YYYYMM", 0..6),
    ("MMDD", 4..8),
    ("YYYY", 0..4),
    ("MM", 4..6),
    ("DD", 6..8),
    ("HH", 8..10),
];

/// A destination path that may contain cycle-time placeholders
///
/// # Examples
///
/// ```
/// use cyclekeeper_domain::{CycleTime, Environment};
/// use cyclekeeper_janitor::DestinationTemplate;
///
/// let ct: CycleTime = "2008081306".parse().unwrap();
///
/// let template = DestinationTemplate::new("/data/YYYY/MM/YYYYMMDDHH");
/// assert_eq!(template.render(&ct), "/data/2008/08/2008081306");
///
/// let mut env = Environment::new();
/// env.set("ARCHIVE", "/home/DDavies");
/// let template = DestinationTemplate::expand("$ARCHIVE/YYYY", &env);
/// assert_eq!(template.render(&ct), "/home/DDavies/2008");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationTemplate {
    text: String,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    // written in the rule file; placeholders apply
    Literal(String),
    // substituted from a variable; copied verbatim
    Fixed(String),
}

impl DestinationTemplate {
    /// Wrap a template string; all of it is scanned for placeholders
    pub fn new(raw: impl Into<String>) -> Self {
        let text = raw.into();
        Self {
            parts: vec![Part::Literal(text.clone())],
            text,
        }
    }

    /// Expand variable references in `raw`, keeping their values out of
    /// placeholder rendering
    pub fn expand(raw: &str, env: &Environment) -> Self {
        let fragments = env.fragments(raw);
        let text = fragments.iter().map(Fragment::as_str).collect();
        let parts = fragments
            .into_iter()
            .map(|fragment| match fragment {
                Fragment::Literal(text) => Part::Literal(text.to_string()),
                Fragment::Value(text) => Part::Fixed(text.to_string()),
            })
            .collect();
        Self { text, parts }
    }

    /// The template with variables expanded and placeholders unrendered
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Whether any placeholder occurs in the scanned text
    pub fn has_placeholders(&self) -> bool {
        self.parts.iter().any(|part| match part {
            Part::Literal(text) => PLACEHOLDERS.iter().any(|(token, _)| text.contains(token)),
            Part::Fixed(_) => false,
        })
    }

    /// Expand placeholders for `cycle_time`
    pub fn render(&self, cycle_time: &CycleTime) -> String {
        let stamp = cycle_time.to_string();
        let mut out = String::with_capacity(self.text.len() + 8);

        for part in &self.parts {
            match part {
                Part::Literal(text) => render_literal(text, &stamp, &mut out),
                Part::Fixed(text) => out.push_str(text),
            }
        }

        out
    }

    /// Expand placeholders into a path
    pub fn resolve(&self, cycle_time: &CycleTime) -> PathBuf {
        PathBuf::from(self.render(cycle_time))
    }
}

fn render_literal(text: &str, stamp: &str, out: &mut String) {
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        match PLACEHOLDERS.iter().find(|(token, _)| rest.starts_with(token)) {
            Some((token, range)) => {
                out.push_str(&stamp[range.clone()]);
                rest = &rest[token.len()..];
            }
            None => {
                out.push(c);
                rest = &rest[c.len_utf8()..];
            }
        }
    }
}
