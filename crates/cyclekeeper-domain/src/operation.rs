//! Operation module - what a housekeeping rule does to old entries

use std::fmt;

/// Housekeeping operation applied to an actionable entry
///
/// The set is closed: a rule file naming anything else is rejected when the
/// rule is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    /// Copy the entry into the destination directory
    Copy,

    /// Move the entry into the destination directory
    Move,

    /// Remove the entry
    Delete,
}

impl Operation {
    /// Every operation, in rule-file order
    pub const ALL: [Operation; 3] = [Operation::Copy, Operation::Move, Operation::Delete];

    /// Get the operation name as it appears in rule files
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Copy => "copy",
            Operation::Move => "move",
            Operation::Delete => "delete",
        }
    }

    /// Parse an operation from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "copy" => Some(Operation::Copy),
            "move" => Some(Operation::Move),
            "delete" => Some(Operation::Delete),
            _ => None,
        }
    }

    /// Whether the operation needs a destination path
    pub fn requires_destination(&self) -> bool {
        match self {
            Operation::Copy | Operation::Move => true,
            Operation::Delete => false,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Illegal operation: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_operations() {
        assert_eq!(Operation::parse("copy"), Some(Operation::Copy));
        assert_eq!(Operation::parse("MOVE"), Some(Operation::Move));
        assert_eq!(Operation::parse("Delete"), Some(Operation::Delete));
    }

    #[test]
    fn test_parse_unknown_operation() {
        assert_eq!(Operation::parse("archive"), None);
        assert!("remove".parse::<Operation>().is_err());
    }

    #[test]
    fn test_name_roundtrip() {
        for op in Operation::ALL {
            assert_eq!(Operation::parse(op.as_str()), Some(op));
            assert_eq!(op.to_string(), op.as_str());
        }
    }

    #[test]
    fn test_destination_requirement() {
        assert!(Operation::Copy.requires_destination());
        assert!(Operation::Move.requires_destination());
        assert!(!Operation::Delete.requires_destination());
    }
}
