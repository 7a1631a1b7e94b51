//! Undo/redo history.
//!
//! Edits are recorded as they happen and grouped into undo steps. Consecutive
//! single-line edits that continue each other (typing forward, backspacing
//! backward) coalesce into one step until the history is sealed, which the
//! surface does whenever the caret moves on its own.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// The type of edit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditKind {
    Insert,
    Delete,
}

/// A single recorded edit, in character offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    pub kind: EditKind,
    /// Character index where the edit starts
    pub position: usize,
    /// Inserted or removed text
    pub content: String,
}

impl Edit {
    pub fn insert(position: usize, content: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Insert,
            position,
            content: content.into(),
        }
    }

    pub fn delete(position: usize, content: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Delete,
            position,
            content: content.into(),
        }
    }

    /// Length of the edited text in characters.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    /// Character index just past the edit once it has been applied.
    pub fn end(&self) -> usize {
        self.position + self.char_len()
    }

    /// Returns true if `next` continues this edit and may share its undo step.
    fn continues_with(&self, next: &Edit) -> bool {
        if self.kind != next.kind || self.content.contains('\n') || next.content.contains('\n') {
            return false;
        }
        match self.kind {
            EditKind::Insert => self.end() == next.position,
            // Backspace walks left, forward delete stays put.
            EditKind::Delete => next.end() == self.position || next.position == self.position,
        }
    }

    fn absorb(&mut self, next: Edit) {
        match self.kind {
            EditKind::Insert => self.content.push_str(&next.content),
            EditKind::Delete if next.position < self.position => {
                self.content.insert_str(0, &next.content);
                self.position = next.position;
            }
            EditKind::Delete => self.content.push_str(&next.content),
        }
    }
}

/// Bounded undo/redo stacks of edit groups.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<Vec<Edit>>,
    redo_stack: Vec<Vec<Edit>>,
    max_groups: usize,
    /// Whether the newest undo group may still absorb edits
    open: bool,
}

impl History {
    /// Creates a history keeping at most `max_groups` undo steps.
    pub fn new(max_groups: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_groups: max_groups.max(1),
            open: false,
        }
    }

    /// Records an edit that has just been applied to the buffer.
    ///
    /// Any redo steps are discarded.
    pub fn push(&mut self, edit: Edit) {
        self.redo_stack.clear();

        if self.open {
            if let Some(last) = self.undo_stack.back_mut().and_then(|group| group.last_mut()) {
                if last.continues_with(&edit) {
                    last.absorb(edit);
                    return;
                }
            }
        }

        self.undo_stack.push_back(vec![edit]);
        self.open = true;
        while self.undo_stack.len() > self.max_groups {
            self.undo_stack.pop_front();
        }
    }

    /// Closes the current undo step; the next edit starts a new one.
    pub fn seal(&mut self) {
        self.open = false;
    }

    /// Pops the newest undo step. Edits are returned in the order they were
    /// applied; the caller reverts them back to front.
    pub fn undo(&mut self) -> Option<Vec<Edit>> {
        let group = self.undo_stack.pop_back()?;
        self.redo_stack.push(group.clone());
        self.open = false;
        Some(group)
    }

    /// Pops the newest redo step, in application order.
    pub fn redo(&mut self) -> Option<Vec<Edit>> {
        let group = self.redo_stack.pop()?;
        self.undo_stack.push_back(group.clone());
        self.open = false;
        Some(group)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.open = false;
    }

    /// Number of undo steps available.
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(1000)
    }
}
