//! The rope-backed text buffer.

use ropey::{Rope, RopeSlice};
use std::ops::Range;
use unicode_width::UnicodeWidthChar;

use crate::history::{Edit, EditKind, History};
use crate::{BufferError, BufferResult, Position};

/// An editable document held in a rope.
///
/// Content is kept verbatim: line endings are neither normalised on the way
/// in nor rewritten on the way out.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    rope: Rope,
    history: History,
    /// Whether the buffer changed since it was loaded or last saved
    modified: bool,
    /// Bumped by every change to the content
    revision: u64,
}

impl TextBuffer {
    /// Creates an empty buffer.
    ///
    /// # Example
    /// ```
    /// use lyra_buffer::TextBuffer;
    ///
    /// let buffer = TextBuffer::new();
    /// assert_eq!(buffer.len_lines(), 1);
    /// ```
    pub fn new() -> Self {
        Self::with_history_limit(1000)
    }

    /// Creates an empty buffer keeping at most `undo_limit` undo steps.
    pub fn with_history_limit(undo_limit: usize) -> Self {
        Self {
            rope: Rope::new(),
            history: History::new(undo_limit),
            modified: false,
            revision: 0,
        }
    }

    /// Replaces the whole content. Undo history is dropped and the buffer
    /// counts as unmodified afterwards.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.history.clear();
        self.modified = false;
        self.revision += 1;
    }

    /// Returns the whole content.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    // ==================== Measurements ====================

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    #[inline]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Number of lines. Never zero.
    #[inline]
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Returns a line without its line break.
    pub fn line_content(&self, line_idx: usize) -> BufferResult<String> {
        let slice = self.line_slice(line_idx)?;
        let len = content_len(slice);
        Ok(slice.slice(..len).to_string())
    }

    /// Length of a line in characters, line break excluded.
    pub fn line_len(&self, line_idx: usize) -> BufferResult<usize> {
        Ok(content_len(self.line_slice(line_idx)?))
    }

    fn line_slice(&self, line_idx: usize) -> BufferResult<RopeSlice<'_>> {
        if line_idx >= self.len_lines() {
            return Err(BufferError::PositionOutOfBounds {
                line: line_idx,
                column: 0,
            });
        }
        Ok(self.rope.line(line_idx))
    }

    // ==================== Mutations ====================

    /// Inserts text at a character index.
    pub fn insert(&mut self, char_idx: usize, text: &str) -> BufferResult<()> {
        if char_idx > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(char_idx));
        }
        if text.is_empty() {
            return Ok(());
        }

        self.rope.insert(char_idx, text);
        self.history.push(Edit::insert(char_idx, text));
        self.touch();
        Ok(())
    }

    /// Deletes a character range, returning the removed text.
    pub fn delete(&mut self, range: Range<usize>) -> BufferResult<String> {
        if range.end > self.len_chars() || range.start > range.end {
            return Err(BufferError::InvalidCharIndex(range.end));
        }
        if range.is_empty() {
            return Ok(String::new());
        }

        let removed = self.rope.slice(range.clone()).to_string();
        self.rope.remove(range.clone());
        self.history.push(Edit::delete(range.start, removed.clone()));
        self.touch();
        Ok(removed)
    }

    // ==================== Undo/Redo ====================

    /// Reverts the newest undo step and returns the character index where
    /// the caret belongs afterwards.
    pub fn undo(&mut self) -> BufferResult<usize> {
        let group = self.history.undo().ok_or(BufferError::NothingToUndo)?;
        let mut caret = 0;
        for edit in group.iter().rev() {
            caret = match edit.kind {
                EditKind::Insert => {
                    self.rope.remove(edit.position..edit.end());
                    edit.position
                }
                EditKind::Delete => {
                    self.rope.insert(edit.position, &edit.content);
                    edit.end()
                }
            };
        }
        self.touch();
        Ok(caret)
    }

    /// Re-applies the newest redo step and returns the caret's character
    /// index afterwards.
    pub fn redo(&mut self) -> BufferResult<usize> {
        let group = self.history.redo().ok_or(BufferError::NothingToRedo)?;
        let mut caret = 0;
        for edit in &group {
            caret = match edit.kind {
                EditKind::Insert => {
                    self.rope.insert(edit.position, &edit.content);
                    edit.end()
                }
                EditKind::Delete => {
                    self.rope.remove(edit.position..edit.end());
                    edit.position
                }
            };
        }
        self.touch();
        Ok(caret)
    }

    /// Ends the current undo step.
    pub fn seal_history(&mut self) {
        self.history.seal();
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ==================== Position Conversion ====================

    /// Converts a position to a character index. The column may sit at the
    /// end of the line, but not past it.
    pub fn position_to_char_idx(&self, pos: Position) -> BufferResult<usize> {
        let out_of_bounds = BufferError::PositionOutOfBounds {
            line: pos.line,
            column: pos.column,
        };
        if pos.line >= self.len_lines() {
            return Err(out_of_bounds);
        }
        if pos.column > self.line_len(pos.line)? {
            return Err(out_of_bounds);
        }
        Ok(self.rope.line_to_char(pos.line) + pos.column)
    }

    /// Converts a character index to a position.
    pub fn char_idx_to_position(&self, char_idx: usize) -> BufferResult<Position> {
        if char_idx > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(char_idx));
        }
        let line = self.rope.char_to_line(char_idx);
        let column = char_idx - self.rope.line_to_char(line);
        // An index between '\r' and '\n' belongs at the end of the line.
        let column = column.min(content_len(self.rope.line(line)));
        Ok(Position { line, column })
    }

    /// Clamps a position to the nearest valid one.
    pub fn clamp(&self, pos: Position) -> Position {
        let line = pos.line.min(self.len_lines() - 1);
        let len = content_len(self.rope.line(line));
        Position::new(line, pos.column.min(len))
    }

    /// Position just before a line's break. Out-of-range lines clamp to the
    /// last one.
    pub fn end_of_line(&self, line_idx: usize) -> Position {
        let line = line_idx.min(self.len_lines() - 1);
        Position::new(line, content_len(self.rope.line(line)))
    }

    /// Position just past the last character.
    pub fn end_position(&self) -> Position {
        let line = self.len_lines() - 1;
        Position::new(line, content_len(self.rope.line(line)))
    }

    // ==================== State ====================

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn set_modified(&mut self, modified: bool) {
        self.modified = modified;
    }

    /// A counter that changes whenever the content does. A saved snapshot
    /// is still current while the revision matches.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.modified = true;
        self.revision += 1;
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TextBuffer {
    fn from(s: &str) -> Self {
        let mut buffer = Self::new();
        buffer.set_text(s);
        buffer
    }
}

impl From<String> for TextBuffer {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

/// Number of characters in a line slice, excluding its line break.
fn content_len(line: RopeSlice<'_>) -> usize {
    let len = line.len_chars();
    if len == 0 {
        return 0;
    }
    match line.char(len - 1) {
        '\n' if len >= 2 && line.char(len - 2) == '\r' => len - 2,
        '\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}' => len - 1,
        _ => len,
    }
}

/// Width of `text` in terminal-style columns, expanding tabs to the next
/// multiple of `tab_width`.
pub fn display_width(text: &str, tab_width: usize) -> usize {
    let tab_width = tab_width.max(1);
    text.chars().fold(0, |col, ch| match ch {
        '\t' => (col / tab_width + 1) * tab_width,
        _ => col + ch.width().unwrap_or(0),
    })
}
