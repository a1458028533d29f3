//! Environment module - variable bindings threaded through a housekeeping run
//!
//! Rule files may define variables (`NAME=VALUE`) that later lines and every
//! spawned action handler can see. Instead of mutating the process
//! environment, the bindings live in an [`Environment`] value owned by the
//! caller.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};

/// One piece of an expanded string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'a> {
    /// Text as written, including references to undefined variables
    Literal(&'a str),

    /// Value substituted for a `$NAME` or `${NAME}` reference
    Value(&'a str),
}

impl<'a> Fragment<'a> {
    /// Text of the fragment
    pub fn as_str(&self) -> &'a str {
        match *self {
            Fragment::Literal(text) | Fragment::Value(text) => text,
        }
    }
}

/// Ordered set of variable bindings
///
/// # Examples
///
/// ```
/// use cyclekeeper_domain::Environment;
///
/// let mut env = Environment::new();
/// env.define("ROOT", "/data");
/// env.define("OUT", "$ROOT/out");
/// assert_eq!(env.get("OUT"), Some("/data/out"));
/// assert_eq!(env.expand("${OUT}/x $MISSING"), "/data/out/x $MISSING");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
    // inherited bindings that are not valid UTF-8; never expanded, only passed on
    opaque: BTreeMap<OsString, OsString>,
}

impl Environment {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the current process environment
    pub fn from_process() -> Self {
        let mut env = Self::new();
        for (name, value) in std::env::vars_os() {
            env.set_os(name, value);
        }
        env
    }

    /// Look up a variable
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Bind `name` to `value` verbatim
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Bind a variable that may not be valid UTF-8
    ///
    /// Non-UTF-8 bindings cannot be referenced from rule files but are still
    /// handed to every action handler.
    pub fn set_os(&mut self, name: impl Into<OsString>, value: impl Into<OsString>) {
        match (name.into().into_string(), value.into().into_string()) {
            (Ok(name), Ok(value)) => {
                self.vars.insert(name, value);
            }
            (name, value) => {
                let name = name.map_or_else(|raw| raw, OsString::from);
                let value = value.map_or_else(|raw| raw, OsString::from);
                self.opaque.insert(name, value);
            }
        }
    }

    /// Expand `raw` against the current bindings and bind the result to `name`
    ///
    /// Returns the expanded value.
    pub fn define(&mut self, name: &str, raw: &str) -> &str {
        let value = self.expand(raw);
        self.vars.insert(name.to_string(), value);
        self.vars.get(name).map(String::as_str).unwrap_or_default()
    }

    /// Expand `$NAME` and `${NAME}` references
    ///
    /// References to undefined variables are left untouched.
    pub fn expand(&self, input: &str) -> String {
        self.fragments(input).iter().map(Fragment::as_str).collect()
    }

    /// Split `input` into literal text and substituted values
    ///
    /// Adjacent literal text is returned as a single fragment.
    pub fn fragments<'a>(&'a self, input: &'a str) -> Vec<Fragment<'a>> {
        let mut fragments = Vec::new();
        let mut literal_start = 0;
        let mut pos = 0;

        while let Some(offset) = input[pos..].find('$') {
            let dollar = pos + offset;
            let tail = &input[dollar + 1..];

            let (name, consumed) = if let Some(braced) = tail.strip_prefix('{') {
                match braced.find('}') {
                    Some(end) => (&braced[..end], end + 2),
                    None => ("", 0),
                }
            } else {
                let end = tail
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(tail.len());
                (&tail[..end], end)
            };

            match self.vars.get(name) {
                Some(value) if !name.is_empty() => {
                    if literal_start < dollar {
                        fragments.push(Fragment::Literal(&input[literal_start..dollar]));
                    }
                    fragments.push(Fragment::Value(value));
                    pos = dollar + 1 + consumed;
                    literal_start = pos;
                }
                _ => pos = dollar + 1,
            }
        }

        if literal_start < input.len() {
            fragments.push(Fragment::Literal(&input[literal_start..]));
        }
        fragments
    }

    /// Iterate over the UTF-8 bindings in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over every binding, non-UTF-8 ones first
    pub fn vars_os(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.opaque
            .iter()
            .map(|(k, v)| (k.as_os_str(), v.as_os_str()))
            .chain(self.iter().map(|(k, v)| (OsStr::new(k), OsStr::new(v))))
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.vars.len() + self.opaque.len()
    }

    /// Whether there are no bindings
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty() && self.opaque.is_empty()
    }
}
