//! Debug positions attached to instructions
//!
//! Every instruction the backend creates carries a `Position` so that line
//! tables survive register allocation. Moves inserted by the allocator borrow
//! the position of the instruction they are scheduled in front of.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in a source file (line and column are 1-based)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub filename: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(filename: &str, line: u32, column: u32) -> Self {
        Self {
            filename: filename.to_string(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.filename, self.line, self.column)
    }
}

/// Debug position of an instruction.
///
/// `None` marks synthetic code with no source counterpart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[default]
    None,
    Source(SourceLocation),
}

impl Position {
    pub fn new(filename: &str, line: u32, column: u32) -> Self {
        Position::Source(SourceLocation::new(filename, line, column))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Position::None)
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Position::None => None,
            Position::Source(loc) => Some(loc),
        }
    }
}

impl From<SourceLocation> for Position {
    fn from(location: SourceLocation) -> Self {
        Position::Source(location)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::None => write!(f, "<none>"),
            Position::Source(loc) => write!(f, "{}", loc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_display() {
        assert_eq!(format!("{}", Position::new("main.c", 12, 3)), "main.c:12:3");
        assert_eq!(format!("{}", Position::None), "<none>");
    }

    #[test]
    fn test_default_is_none() {
        let pos = Position::default();
        assert!(pos.is_none());
        assert!(pos.location().is_none());
    }

    #[test]
    fn test_from_location() {
        let pos: Position = SourceLocation::new("a.c", 1, 2).into();
        assert!(!pos.is_none());
        assert_eq!(pos.location().map(|l| l.line), Some(1));
    }

    #[test]
    fn test_serde_round_trip_keeps_location() {
        let pos = Position::new("a.c", 4, 1);
        let json = serde_json::to_string(&pos).unwrap();
        let back: Position = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pos);
    }
}
