//! Source position tracking for error reporting.

use std::fmt;

/// Represents a position in the text of the current unit.
///
/// Positions are relative to the start of the unit being parsed: the counters
/// are reset whenever the source's unit buffer is reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Line number (0-indexed within the unit)
    pub line: usize,
    /// Column number (1-indexed; 0 for a line break)
    pub column: usize,
    /// Character offset from the start of the unit, line breaks excluded
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// Move past `ch`, which has just been read.
    pub fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
            self.offset += 1;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line: {}, column: {}", self.line, self.column)
    }
}
