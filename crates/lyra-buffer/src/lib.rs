//! # Lyra Buffer
//!
//! The document buffer behind every editor tab.
//!
//! A [`TextBuffer`] is an ordered sequence of lines stored in a rope. It is
//! owned by exactly one text surface and changes only through edits
//! (insert, delete, undo, redo) or a bulk [`TextBuffer::set_text`].
//!
//! Line counting follows the rope: an empty buffer has one line, and a
//! trailing line break opens one more (empty) line.

mod buffer;
mod cursor;
mod history;

pub use buffer::{display_width, TextBuffer};
pub use cursor::{Cursor, Position};
pub use history::{Edit, EditKind, History};

/// Result type for buffer operations
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer operations
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("Position {line}:{column} is out of bounds")]
    PositionOutOfBounds { line: usize, column: usize },

    #[error("Invalid character index: {0}")]
    InvalidCharIndex(usize),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}
