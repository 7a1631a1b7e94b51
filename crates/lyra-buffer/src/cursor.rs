//! Positions and the caret.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A position in the buffer. Both fields are 0-based; `column` counts
/// characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const ZERO: Position = Position { line: 0, column: 0 };

    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line
            .cmp(&other.line)
            .then(self.column.cmp(&other.column))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-based for anything a user reads
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// The text-insertion caret.
///
/// Vertical motion remembers the column the caret started from so that
/// passing over a short line does not pull it left for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub position: Position,
    /// Column to aim for when moving up or down
    pub preferred_column: Option<usize>,
}

impl Cursor {
    pub fn new(position: Position) -> Self {
        Self {
            position,
            preferred_column: None,
        }
    }

    /// Places the caret, forgetting any preferred column.
    pub fn move_to(&mut self, position: Position) {
        self.position = position;
        self.preferred_column = None;
    }

    /// Moves to `line`, landing on the preferred column clamped to `line_len`.
    pub fn move_vertically(&mut self, line: usize, line_len: usize) {
        let wanted = *self.preferred_column.get_or_insert(self.position.column);
        self.position = Position::new(line, wanted.min(line_len));
    }

    pub fn line(&self) -> usize {
        self.position.line
    }
}
