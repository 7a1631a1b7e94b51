//! The text surface: a document buffer, its caret and its viewport.
//!
//! The surface owns everything the gutter needs to know about and answers
//! geometry questions in widget coordinates (origin at the widget's top-left
//! corner, `y` growing downward). Whenever something changes that affects
//! painting it publishes a [`SurfaceEvent`].
//!
//! Without soft wrap every line is exactly one `line_height` tall and line
//! tops are plain arithmetic. With soft wrap a line is as tall as the number
//! of rows it wraps into, and tops are found by walking lines from the top of
//! the document.

use lyra_buffer::{display_width, Cursor, Position, TextBuffer};

use crate::config::EditorConfig;
use crate::event::{EventBus, Invalidation, SubscriptionId, SurfaceEvent};
use crate::paint::Rect;

/// Blank pixels between the left edge of the text area and the first column.
pub const DOCUMENT_MARGIN: i32 = 4;

/// Width of the caret bar in pixels.
pub const CARET_WIDTH: i32 = 2;

/// Pixel metrics of the (monospace) editor font.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontMetrics {
    /// Advance of the digit '9'
    pub digit_width: i32,
    /// Advance of any character cell
    pub char_width: i32,
    pub line_height: i32,
}

impl FontMetrics {
    /// Approximates metrics for a monospace face: a cell is 0.6 em wide.
    pub fn monospace(font_size: f32, line_height: f32) -> Self {
        let advance = (font_size * 0.6).ceil().max(1.0) as i32;
        Self {
            digit_width: advance,
            char_width: advance,
            line_height: (font_size * line_height).ceil().max(1.0) as i32,
        }
    }
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self::monospace(14.0, 1.3)
    }
}

/// How long lines are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// One row per line; long lines scroll horizontally
    #[default]
    NoWrap,
    /// Lines wrap at the width of the text area
    Viewport,
}

/// Caret motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    LineStart,
    LineEnd,
    DocumentStart,
    DocumentEnd,
    PageUp,
    PageDown,
}

/// Vertical extent of one line, in widget coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineGeometry {
    /// 0-based line index
    pub line: usize,
    pub top: i32,
    pub height: i32,
}

impl LineGeometry {
    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }
}

/// A plain multi-line editing surface.
#[derive(Debug)]
pub struct TextSurface {
    buffer: TextBuffer,
    cursor: Cursor,
    metrics: FontMetrics,
    wrap: WrapMode,
    tab_size: usize,
    page_overlap: usize,

    /// Widget size, gutter included
    width: i32,
    height: i32,
    /// Pixels reserved on the left for the gutter
    left_margin: i32,
    scroll_x: i32,
    scroll_y: i32,

    /// Line count last announced to listeners
    line_count: usize,
    events: EventBus,
}

impl TextSurface {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            buffer: TextBuffer::with_history_limit(config.undo_limit),
            cursor: Cursor::default(),
            metrics: FontMetrics::default(),
            wrap: if config.word_wrap {
                WrapMode::Viewport
            } else {
                WrapMode::NoWrap
            },
            tab_size: config.tab_size.max(1),
            page_overlap: config.page_overlap_lines,
            width: 0,
            height: 0,
            left_margin: 0,
            scroll_x: 0,
            scroll_y: 0,
            line_count: 1,
            events: EventBus::new(),
        }
    }

    // ==================== Notifications ====================

    /// Registers a listener for caret and geometry notifications.
    pub fn subscribe(&mut self, listener: impl FnMut(&SurfaceEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn invalidate(&mut self, invalidation: Invalidation) {
        self.events.emit(SurfaceEvent::GeometryInvalidated(invalidation));
    }

    // ==================== Content ====================

    /// Replaces the whole document. The caret and scroll position go back to
    /// the start and a full repaint is requested.
    pub fn set_text(&mut self, content: &str) {
        let previous = self.cursor.line();
        self.buffer.set_text(content);
        self.cursor = Cursor::default();
        self.scroll_x = 0;
        self.scroll_y = 0;
        self.line_count = self.buffer.len_lines();

        self.invalidate(Invalidation::LineCountChanged(self.line_count));
        if previous != 0 {
            self.events.emit(SurfaceEvent::CaretLineChanged {
                previous,
                current: 0,
            });
        }
    }

    /// Returns the document exactly as stored.
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    pub fn line_count(&self) -> usize {
        self.buffer.len_lines()
    }

    /// A line's text without its line break, tabs expanded to spaces.
    pub fn display_line(&self, line: usize) -> String {
        let content = self.buffer.line_content(line).unwrap_or_default();
        expand_tabs(&content, self.tab_size)
    }

    pub fn is_modified(&self) -> bool {
        self.buffer.is_modified()
    }

    pub fn mark_saved(&mut self) {
        self.buffer.set_modified(false);
    }

    /// Edit counter of the buffer; see [`TextBuffer::revision`].
    pub fn revision(&self) -> u64 {
        self.buffer.revision()
    }

    /// Clears the modified flag if nothing changed since `revision` was
    /// taken. Returns whether it did.
    pub fn mark_saved_at(&mut self, revision: u64) -> bool {
        if self.buffer.revision() != revision {
            return false;
        }
        self.buffer.set_modified(false);
        true
    }

    // ==================== Editing ====================

    /// Inserts text at the caret and moves the caret past it.
    pub fn insert_str(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let previous = self.cursor.line();
        let block_before = self.block_height(previous);
        let idx = self.caret_index();
        if let Err(e) = self.buffer.insert(idx, text) {
            tracing::warn!("Insert at {} failed: {}", idx, e);
            return false;
        }
        self.place_caret_at_index(idx + text.chars().count());
        self.edited(previous, Some(block_before));
        true
    }

    pub fn insert_newline(&mut self) -> bool {
        self.insert_str("\n")
    }

    /// Deletes the character before the caret (a `\r\n` pair counts as one).
    pub fn delete_backward(&mut self) -> bool {
        let idx = self.caret_index();
        if idx == 0 {
            return false;
        }
        let start = if self.caret().column == 0 {
            self.buffer
                .position_to_char_idx(self.buffer.end_of_line(self.caret().line - 1))
                .unwrap_or(idx - 1)
        } else {
            idx - 1
        };
        self.delete_range(start, idx, start)
    }

    /// Deletes the character after the caret (a `\r\n` pair counts as one).
    pub fn delete_forward(&mut self) -> bool {
        let idx = self.caret_index();
        if idx >= self.buffer.len_chars() {
            return false;
        }
        let pos = self.caret();
        let end = if pos.column == self.current_line_len() {
            self.buffer
                .position_to_char_idx(Position::new(pos.line + 1, 0))
                .unwrap_or(idx + 1)
        } else {
            idx + 1
        };
        self.delete_range(idx, end, idx)
    }

    fn delete_range(&mut self, start: usize, end: usize, caret: usize) -> bool {
        let previous = self.cursor.line();
        let block_before = self.block_height(previous);
        if let Err(e) = self.buffer.delete(start..end) {
            tracing::warn!("Delete of {}..{} failed: {}", start, end, e);
            return false;
        }
        self.place_caret_at_index(caret);
        self.edited(previous, Some(block_before));
        true
    }

    /// Reverts the newest undo step. Returns false if there was none.
    pub fn undo(&mut self) -> bool {
        let previous = self.cursor.line();
        match self.buffer.undo() {
            Ok(idx) => {
                self.place_caret_at_index(idx);
                self.edited(previous, None);
                true
            }
            Err(_) => false,
        }
    }

    /// Re-applies the newest undone step. Returns false if there was none.
    pub fn redo(&mut self) -> bool {
        let previous = self.cursor.line();
        match self.buffer.redo() {
            Ok(idx) => {
                self.place_caret_at_index(idx);
                self.edited(previous, None);
                true
            }
            Err(_) => false,
        }
    }

    /// Announces an edit: a line-count change, or the edited line otherwise.
    /// When soft wrap changes the edited line's height, every line below it
    /// moves, so the region reaches the bottom of the viewport.
    /// `block_before` is the edited line's height before the edit, if known.
    fn edited(&mut self, previous_line: usize, block_before: Option<i32>) {
        let count = self.buffer.len_lines();
        if count != self.line_count {
            self.line_count = count;
            self.scroll_y = self.scroll_y.min(self.max_scroll_y());
            self.invalidate(Invalidation::LineCountChanged(count));
        } else if self.wrap == WrapMode::Viewport
            && block_before.is_none_or(|h| h != self.block_height(self.cursor.line()))
        {
            self.scroll_y = self.scroll_y.min(self.max_scroll_y());
            let first = previous_line.min(self.cursor.line());
            self.invalidate(Invalidation::Region(self.region_below(first)));
        } else {
            self.invalidate(Invalidation::Region(self.caret_line_rect()));
        }
        self.caret_moved(previous_line);
    }

    /// The text area from the top of `line` down to the viewport's bottom.
    fn region_below(&self, line: usize) -> Rect {
        let viewport = self.viewport_rect();
        let top = self.line_geometry(line).top.clamp(viewport.top(), viewport.bottom());
        Rect::new(viewport.x, top, viewport.width, viewport.bottom() - top)
    }

    // ==================== Caret ====================

    pub fn caret(&self) -> Position {
        self.cursor.position
    }

    pub fn caret_line(&self) -> usize {
        self.cursor.line()
    }

    /// Places the caret, clamped to the document.
    pub fn set_caret(&mut self, position: Position) {
        let previous = self.cursor.line();
        self.cursor.move_to(self.buffer.clamp(position));
        self.buffer.seal_history();
        self.caret_moved(previous);
    }

    /// Moves the caret. Returns false if it stayed where it was.
    pub fn move_caret(&mut self, motion: Motion) -> bool {
        let before = self.cursor.position;
        let Position { line, column } = before;
        let last_line = self.buffer.len_lines() - 1;

        match motion {
            Motion::Left if column > 0 => self.cursor.move_to(Position::new(line, column - 1)),
            Motion::Left if line > 0 => self.cursor.move_to(self.buffer.end_of_line(line - 1)),
            Motion::Left => {}
            Motion::Right if column < self.current_line_len() => {
                self.cursor.move_to(Position::new(line, column + 1))
            }
            Motion::Right if line < last_line => self.cursor.move_to(Position::new(line + 1, 0)),
            Motion::Right => {}
            Motion::Up if line > 0 => self.move_vertically(line - 1),
            Motion::Up => self.cursor.move_to(Position::ZERO),
            Motion::Down if line < last_line => self.move_vertically(line + 1),
            Motion::Down => self.cursor.move_to(self.buffer.end_position()),
            Motion::LineStart => self.cursor.move_to(Position::new(line, 0)),
            Motion::LineEnd => self.cursor.move_to(self.buffer.end_of_line(line)),
            Motion::DocumentStart => self.cursor.move_to(Position::ZERO),
            Motion::DocumentEnd => self.cursor.move_to(self.buffer.end_position()),
            Motion::PageUp => self.move_vertically(line.saturating_sub(self.page_lines())),
            Motion::PageDown => self.move_vertically((line + self.page_lines()).min(last_line)),
        }

        self.buffer.seal_history();
        self.caret_moved(before.line);
        self.cursor.position != before
    }

    fn move_vertically(&mut self, line: usize) {
        let len = self.buffer.line_len(line).unwrap_or(0);
        self.cursor.move_vertically(line, len);
    }

    fn page_lines(&self) -> usize {
        let rows = (self.height / self.metrics.line_height.max(1)) as usize;
        rows.saturating_sub(self.page_overlap).max(1)
    }

    fn caret_moved(&mut self, previous_line: usize) {
        let current = self.cursor.line();
        if current != previous_line {
            self.events.emit(SurfaceEvent::CaretLineChanged {
                previous: previous_line,
                current,
            });
        }
        self.ensure_caret_visible();
    }

    fn caret_index(&self) -> usize {
        let pos = self.buffer.clamp(self.cursor.position);
        self.buffer
            .position_to_char_idx(pos)
            .unwrap_or_else(|_| self.buffer.len_chars())
    }

    fn place_caret_at_index(&mut self, idx: usize) {
        let pos = self
            .buffer
            .char_idx_to_position(idx)
            .unwrap_or_else(|_| self.buffer.end_position());
        self.cursor.move_to(pos);
    }

    fn current_line_len(&self) -> usize {
        self.buffer.line_len(self.cursor.line()).unwrap_or(0)
    }

    // ==================== Viewport ====================

    pub fn metrics(&self) -> FontMetrics {
        self.metrics
    }

    pub fn wrap(&self) -> WrapMode {
        self.wrap
    }

    pub fn tab_size(&self) -> usize {
        self.tab_size
    }

    /// Widget size as `(width, height)`.
    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn left_margin(&self) -> i32 {
        self.left_margin
    }

    /// Scroll offsets as `(x, y)` pixels into the document.
    pub fn scroll_offset(&self) -> (i32, i32) {
        (self.scroll_x, self.scroll_y)
    }

    /// The text area: the widget minus the gutter's margin.
    pub fn viewport_rect(&self) -> Rect {
        Rect::new(
            self.left_margin,
            0,
            (self.width - self.left_margin).max(0),
            self.height,
        )
    }

    pub fn resize(&mut self, width: i32, height: i32) {
        let (width, height) = (width.max(0), height.max(0));
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        self.scroll_y = self.scroll_y.min(self.max_scroll_y());
        self.invalidate(Invalidation::Resized { width, height });
    }

    /// Reserves `margin` pixels on the left for the gutter. Callers repaint
    /// the whole widget afterwards, so nothing is published.
    pub fn set_left_margin(&mut self, margin: i32) {
        self.left_margin = margin.max(0);
    }

    pub fn set_font_metrics(&mut self, metrics: FontMetrics) {
        if metrics == self.metrics {
            return;
        }
        self.metrics = metrics;
        self.scroll_y = self.scroll_y.min(self.max_scroll_y());
        self.invalidate(Invalidation::Reflowed);
    }

    pub fn set_wrap(&mut self, wrap: WrapMode) {
        if wrap == self.wrap {
            return;
        }
        self.wrap = wrap;
        self.scroll_x = 0;
        self.scroll_y = self.scroll_y.min(self.max_scroll_y());
        self.invalidate(Invalidation::Reflowed);
    }

    pub fn set_tab_size(&mut self, tab_size: usize) {
        let tab_size = tab_size.max(1);
        if tab_size != self.tab_size {
            self.tab_size = tab_size;
            self.invalidate(Invalidation::Reflowed);
        }
    }

    /// Scrolls so that document pixel `y` is at the top, clamped to the
    /// document.
    pub fn scroll_to(&mut self, y: i32) {
        let y = y.clamp(0, self.max_scroll_y());
        if y == self.scroll_y {
            return;
        }
        let dy = self.scroll_y - y;
        self.scroll_y = y;
        self.invalidate(Invalidation::Scrolled { dy });
    }

    pub fn scroll_by(&mut self, dy: i32) {
        self.scroll_to(self.scroll_y + dy);
    }

    fn max_scroll_y(&self) -> i32 {
        (self.document_height() - self.height).max(0)
    }

    /// Scrolls just enough to bring the caret into view.
    pub fn ensure_caret_visible(&mut self) {
        let (row, col) = self.caret_row_and_column();
        let lh = self.metrics.line_height;
        let top = self.line_top(self.cursor.line()) + row as i32 * lh;
        if top < self.scroll_y {
            self.scroll_to(top);
        } else if top + lh > self.scroll_y + self.height && self.height > 0 {
            self.scroll_to(top + lh - self.height);
        }

        if self.wrap == WrapMode::NoWrap {
            let visible = (self.viewport_rect().width - 2 * DOCUMENT_MARGIN).max(0);
            let x = col as i32 * self.metrics.char_width;
            let scroll_x = if x < self.scroll_x {
                x
            } else if x + self.metrics.char_width > self.scroll_x + visible && visible > 0 {
                x + self.metrics.char_width - visible
            } else {
                self.scroll_x
            };
            if scroll_x != self.scroll_x {
                self.scroll_x = scroll_x;
                self.invalidate(Invalidation::Region(self.viewport_rect()));
            }
        }
    }

    // ==================== Geometry ====================

    /// Character cells per row when wrapping.
    pub fn wrap_columns(&self) -> usize {
        let usable = self.viewport_rect().width - 2 * DOCUMENT_MARGIN;
        (usable / self.metrics.char_width.max(1)).max(1) as usize
    }

    /// Number of rows a line occupies on screen.
    pub fn visual_rows(&self, line: usize) -> usize {
        match self.wrap {
            WrapMode::NoWrap => 1,
            WrapMode::Viewport => {
                let width = display_width(&self.buffer.line_content(line).unwrap_or_default(), self.tab_size);
                width.div_ceil(self.wrap_columns()).max(1)
            }
        }
    }

    /// Pixel height of a line's block.
    pub fn block_height(&self, line: usize) -> i32 {
        self.visual_rows(line) as i32 * self.metrics.line_height
    }

    /// Top of a line in document coordinates (not scrolled).
    pub fn line_top(&self, line: usize) -> i32 {
        match self.wrap {
            WrapMode::NoWrap => line as i32 * self.metrics.line_height,
            WrapMode::Viewport => (0..line.min(self.line_count())).map(|l| self.block_height(l)).sum(),
        }
    }

    pub fn document_height(&self) -> i32 {
        self.line_top(self.line_count() - 1) + self.block_height(self.line_count() - 1)
    }

    /// First line at least partly visible, with its document-space top.
    fn first_visible(&self) -> (usize, i32) {
        let last = self.line_count() - 1;
        match self.wrap {
            WrapMode::NoWrap => {
                let line = ((self.scroll_y / self.metrics.line_height.max(1)) as usize).min(last);
                (line, line as i32 * self.metrics.line_height)
            }
            WrapMode::Viewport => {
                let mut top = 0;
                for line in 0..last {
                    let bottom = top + self.block_height(line);
                    if bottom > self.scroll_y {
                        return (line, top);
                    }
                    top = bottom;
                }
                (last, top)
            }
        }
    }

    pub fn first_visible_line(&self) -> usize {
        self.first_visible().0
    }

    /// Lines overlapping `clip`, top to bottom, in widget coordinates.
    pub fn visible_lines(&self, clip: Rect) -> Vec<LineGeometry> {
        let (mut line, doc_top) = self.first_visible();
        let mut top = doc_top - self.scroll_y;
        let mut lines = Vec::new();

        while line < self.line_count() && top < clip.bottom() {
            let height = self.block_height(line);
            if clip.overlaps_span(top, top + height) {
                lines.push(LineGeometry { line, top, height });
            }
            top += height;
            line += 1;
        }
        lines
    }

    /// Geometry of a single line, in widget coordinates.
    pub fn line_geometry(&self, line: usize) -> LineGeometry {
        LineGeometry {
            line,
            top: self.line_top(line) - self.scroll_y,
            height: self.block_height(line),
        }
    }

    /// The caret's line across the text area.
    pub fn caret_line_rect(&self) -> Rect {
        let geometry = self.line_geometry(self.cursor.line());
        let viewport = self.viewport_rect();
        Rect::new(viewport.x, geometry.top, viewport.width, geometry.height)
    }

    /// The caret bar, in widget coordinates.
    pub fn caret_rect(&self) -> Rect {
        let (row, col) = self.caret_row_and_column();
        let lh = self.metrics.line_height;
        let top = self.line_geometry(self.cursor.line()).top + row as i32 * lh;
        Rect::new(self.text_origin_x() + col as i32 * self.metrics.char_width, top, CARET_WIDTH, lh)
    }

    /// X coordinate of column 0, horizontal scroll applied.
    pub fn text_origin_x(&self) -> i32 {
        self.left_margin + DOCUMENT_MARGIN - self.scroll_x
    }

    /// Visual row inside the caret's block and display column inside that row.
    fn caret_row_and_column(&self) -> (usize, usize) {
        let content = self.buffer.line_content(self.cursor.line()).unwrap_or_default();
        let prefix: String = content.chars().take(self.cursor.position.column).collect();
        let width = display_width(&prefix, self.tab_size);
        match self.wrap {
            WrapMode::NoWrap => (0, width),
            WrapMode::Viewport => {
                let cols = self.wrap_columns();
                let row = (width / cols).min(self.visual_rows(self.cursor.line()) - 1);
                (row, width - row * cols)
            }
        }
    }

    /// Splits a line into the rows it is painted as (tabs expanded).
    pub fn visual_segments(&self, line: usize) -> Vec<String> {
        let text = self.display_line(line);
        match self.wrap {
            WrapMode::NoWrap => vec![text],
            WrapMode::Viewport => wrap_segments(&text, self.wrap_columns()),
        }
    }

    /// Maps a widget-space point to the nearest caret position.
    pub fn caret_at_point(&self, x: i32, y: i32) -> Position {
        let (mut line, doc_top) = self.first_visible();
        let mut top = doc_top - self.scroll_y;
        let last = self.line_count() - 1;
        while line < last && y >= top + self.block_height(line) {
            top += self.block_height(line);
            line += 1;
        }

        let row = ((y - top).max(0) / self.metrics.line_height.max(1)) as usize;
        let row = row.min(self.visual_rows(line) - 1);
        let cw = self.metrics.char_width.max(1);
        let cell = ((x - self.text_origin_x()).max(0) + cw / 2) / cw;
        let target = match self.wrap {
            WrapMode::NoWrap => cell as usize,
            WrapMode::Viewport => row * self.wrap_columns() + (cell as usize).min(self.wrap_columns()),
        };

        let content = self.buffer.line_content(line).unwrap_or_default();
        Position::new(line, column_at_display(&content, target, self.tab_size))
    }

    /// Places the caret at a widget-space point.
    pub fn click(&mut self, x: i32, y: i32) {
        let position = self.caret_at_point(x, y);
        self.set_caret(position);
    }
}

impl Default for TextSurface {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

fn expand_tabs(text: &str, tab_size: usize) -> String {
    if !text.contains('\t') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut col = 0;
    for ch in text.chars() {
        if ch == '\t' {
            let next = (col / tab_size + 1) * tab_size;
            out.push_str(&" ".repeat(next - col));
            col = next;
        } else {
            out.push(ch);
            col += char_width(ch);
        }
    }
    out
}

fn char_width(ch: char) -> usize {
    display_width(ch.encode_utf8(&mut [0; 4]), 1)
}

/// Breaks already tab-expanded text into rows at most `columns` cells wide.
fn wrap_segments(text: &str, columns: usize) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let width = char_width(ch);
        if used + width > columns && !current.is_empty() {
            segments.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(ch);
        used += width;
    }
    segments.push(current);
    segments
}

/// The character column whose display offset is closest to `target` without
/// passing it.
fn column_at_display(content: &str, target: usize, tab_size: usize) -> usize {
    let mut prefix = String::new();
    for (column, ch) in content.chars().enumerate() {
        prefix.push(ch);
        if display_width(&prefix, tab_size) > target {
            return column;
        }
    }
    content.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn surface_with(text: &str) -> TextSurface {
        let mut surface = TextSurface::default();
        surface.set_font_metrics(FontMetrics {
            digit_width: 8,
            char_width: 8,
            line_height: 10,
        });
        surface.resize(400, 100);
        surface.set_text(text);
        surface
    }

    fn record(surface: &mut TextSurface) -> Rc<RefCell<Vec<SurfaceEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        surface.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        events
    }

    fn caret_changes(events: &[SurfaceEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, SurfaceEvent::CaretLineChanged { .. }))
            .count()
    }

    fn numbered(lines: usize) -> String {
        (1..=lines).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_empty_text_round_trip() {
        let mut surface = surface_with("abc");
        surface.set_text("");
        assert_eq!(surface.text(), "");
        assert_eq!(surface.line_count(), 1);
        assert_eq!(surface.caret(), Position::ZERO);
    }

    #[test]
    fn test_set_text_always_announces_line_count() {
        let mut surface = surface_with("a\nb");
        let events = record(&mut surface);
        surface.set_text("c\nd");
        assert_eq!(
            events.borrow().as_slice(),
            &[SurfaceEvent::GeometryInvalidated(Invalidation::LineCountChanged(2))]
        );
    }

    #[test]
    fn test_set_text_resets_caret_line() {
        let mut surface = surface_with(&numbered(5));
        surface.set_caret(Position::new(3, 2));
        let events = record(&mut surface);
        surface.set_text("x");
        assert_eq!(caret_changes(&events.borrow()), 1);
        assert_eq!(surface.caret(), Position::ZERO);
    }

    #[test]
    fn test_line_change_fires_exactly_once() {
        let mut surface = surface_with(&numbered(10));
        let events = record(&mut surface);

        surface.set_caret(Position::new(4, 0));
        assert_eq!(caret_changes(&events.borrow()), 1);
        assert_eq!(
            events.borrow()[0],
            SurfaceEvent::CaretLineChanged {
                previous: 0,
                current: 4
            }
        );
    }

    #[test]
    fn test_column_moves_are_silent() {
        let mut surface = surface_with("hello world\nsecond");
        let events = record(&mut surface);

        surface.move_caret(Motion::Right);
        surface.move_caret(Motion::LineEnd);
        surface.move_caret(Motion::Left);
        surface.set_caret(Position::new(0, 1));
        surface.insert_str("xyz");

        assert_eq!(caret_changes(&events.borrow()), 0);
    }

    #[test]
    fn test_typing_on_a_line_invalidates_only_that_line() {
        let mut surface = surface_with("one\ntwo");
        surface.set_caret(Position::new(1, 3));
        let events = record(&mut surface);

        surface.insert_str("!");
        let expected = Rect::new(0, 10, 400, 10);
        assert_eq!(
            events.borrow().as_slice(),
            &[SurfaceEvent::GeometryInvalidated(Invalidation::Region(expected))]
        );
    }

    #[test]
    fn test_newline_changes_line_count_and_caret_line() {
        let mut surface = surface_with("abcd");
        surface.set_caret(Position::new(0, 2));
        let events = record(&mut surface);

        surface.insert_newline();
        assert_eq!(surface.text(), "ab\ncd");
        assert_eq!(surface.caret(), Position::new(1, 0));
        let events = events.borrow();
        assert_eq!(
            events[0],
            SurfaceEvent::GeometryInvalidated(Invalidation::LineCountChanged(2))
        );
        assert_eq!(caret_changes(&events), 1);
    }

    #[test]
    fn test_backspace_joins_crlf_lines() {
        let mut surface = surface_with("ab\r\ncd");
        surface.set_caret(Position::new(1, 0));
        assert!(surface.delete_backward());
        assert_eq!(surface.text(), "abcd");
        assert_eq!(surface.caret(), Position::new(0, 2));

        surface.move_caret(Motion::DocumentStart);
        assert!(!surface.delete_backward());
    }

    #[test]
    fn test_delete_forward_at_line_end() {
        let mut surface = surface_with("ab\ncd");
        surface.set_caret(Position::new(0, 2));
        assert!(surface.delete_forward());
        assert_eq!(surface.text(), "abcd");
        surface.move_caret(Motion::DocumentEnd);
        assert!(!surface.delete_forward());
    }

    #[test]
    fn test_undo_restores_text_and_caret() {
        let mut surface = surface_with("");
        surface.insert_str("hello");
        surface.insert_newline();
        surface.insert_str("world");

        assert!(surface.undo());
        assert_eq!(surface.text(), "hello\n");
        assert!(surface.undo());
        assert!(surface.undo());
        assert_eq!(surface.text(), "");
        assert!(!surface.undo());
        assert!(surface.redo());
        assert_eq!(surface.text(), "hello");
        assert_eq!(surface.caret(), Position::new(0, 5));
    }

    #[test]
    fn test_vertical_motion_and_wrapping_horizontal_motion() {
        let mut surface = surface_with("long line\nab\nanother line");
        surface.set_caret(Position::new(0, 7));
        surface.move_caret(Motion::Down);
        assert_eq!(surface.caret(), Position::new(1, 2));
        surface.move_caret(Motion::Down);
        assert_eq!(surface.caret(), Position::new(2, 7));

        surface.move_caret(Motion::LineStart);
        surface.move_caret(Motion::Left);
        assert_eq!(surface.caret(), Position::new(1, 2));
        surface.move_caret(Motion::Right);
        assert_eq!(surface.caret(), Position::new(2, 0));
    }

    #[test]
    fn test_caret_motion_scrolls_into_view() {
        let mut surface = surface_with(&numbered(50));
        let events = record(&mut surface);

        surface.set_caret(Position::new(20, 0));
        // 10 rows fit; line 20 must end at the bottom edge
        assert_eq!(surface.scroll_offset().1, 110);
        assert!(events
            .borrow()
            .iter()
            .any(|e| matches!(e, SurfaceEvent::GeometryInvalidated(Invalidation::Scrolled { dy: -110 }))));
        assert_eq!(surface.first_visible_line(), 11);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let mut surface = surface_with(&numbered(15));
        surface.scroll_to(10_000);
        assert_eq!(surface.scroll_offset().1, 50);
        surface.scroll_by(-10_000);
        assert_eq!(surface.scroll_offset().1, 0);
    }

    #[test]
    fn test_visible_lines_follow_scroll() {
        let mut surface = surface_with(&numbered(30));
        surface.scroll_to(25);
        let lines = surface.visible_lines(Rect::new(0, 0, 400, 100));
        assert_eq!(lines.first().map(|g| g.line), Some(2));
        assert_eq!(lines.first().map(|g| g.top), Some(-5));
        assert_eq!(lines.last().map(|g| g.line), Some(12));
        assert_eq!(lines.len(), 11);
    }

    #[test]
    fn test_soft_wrap_makes_lines_taller() {
        let mut surface = surface_with(&format!("{}\nshort", "x".repeat(100)));
        surface.set_left_margin(0);
        surface.set_wrap(WrapMode::Viewport);
        // (400 - 8) / 8 = 49 columns
        assert_eq!(surface.wrap_columns(), 49);
        assert_eq!(surface.visual_rows(0), 3);
        assert_eq!(surface.line_top(1), 30);
        assert_eq!(surface.visual_segments(0).len(), 3);

        let lines = surface.visible_lines(Rect::new(0, 0, 400, 100));
        assert_eq!(lines[1], LineGeometry { line: 1, top: 30, height: 10 });

        surface.set_caret(Position::new(0, 60));
        assert_eq!(surface.caret_rect().y, 10);
    }

    #[test]
    fn test_wrap_growth_invalidates_lines_below() {
        let mut surface = surface_with(&format!("{}\nnext\nlast", "x".repeat(49)));
        surface.set_wrap(WrapMode::Viewport);
        surface.set_caret(Position::new(0, 49));
        assert_eq!(surface.line_geometry(1).top, 10);
        let events = record(&mut surface);

        surface.insert_str("y");
        assert_eq!(surface.visual_rows(0), 2);
        let moved = surface.line_geometry(1);
        assert_eq!(moved.top, 20);
        let region = Rect::new(0, 0, 400, 100);
        assert!(region.overlaps_span(moved.top, moved.top + moved.height));
        assert_eq!(
            events.borrow().as_slice(),
            &[SurfaceEvent::GeometryInvalidated(Invalidation::Region(region))]
        );

        // shrinking back reflows too
        events.borrow_mut().clear();
        surface.delete_backward();
        assert_eq!(surface.line_geometry(1).top, 10);
        assert_eq!(
            events.borrow().as_slice(),
            &[SurfaceEvent::GeometryInvalidated(Invalidation::Region(region))]
        );

        // an edit that keeps the height stays local
        events.borrow_mut().clear();
        surface.set_caret(Position::new(2, 4));
        events.borrow_mut().clear();
        surface.insert_str("!");
        assert_eq!(
            events.borrow().as_slice(),
            &[SurfaceEvent::GeometryInvalidated(Invalidation::Region(Rect::new(0, 20, 400, 10)))]
        );
    }

    #[test]
    fn test_resize_only_changes_viewport_width() {
        let mut surface = surface_with("abc");
        surface.set_left_margin(66);
        surface.resize(300, 100);
        assert_eq!(surface.viewport_rect(), Rect::new(66, 0, 234, 100));
        assert_eq!(surface.left_margin(), 66);
    }

    #[test]
    fn test_click_places_caret() {
        let mut surface = surface_with("first\n\tsecond");
        surface.set_left_margin(20);
        // x = 20 + 4 + 6 cells of 8px, on the second row
        surface.click(20 + DOCUMENT_MARGIN + 6 * 8, 15);
        // tab covers cells 0..4, so cell 6 is after 's', 'e'
        assert_eq!(surface.caret(), Position::new(1, 3));

        surface.click(10_000, 10_000);
        assert_eq!(surface.caret(), Position::new(1, 7));
    }

    #[test]
    fn test_tabs_are_expanded_for_display() {
        let surface = surface_with("a\tb");
        assert_eq!(surface.display_line(0), "a   b");
        assert_eq!(wrap_segments("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_segments("", 4), vec![""]);
    }

    proptest! {
        #[test]
        fn text_round_trips(s in any::<String>()) {
            let mut surface = TextSurface::default();
            surface.set_text(&s);
            prop_assert_eq!(surface.text(), s);
        }

        #[test]
        fn line_change_notifications_match_moves(target in 0usize..40, start in 0usize..40) {
            let mut surface = surface_with(&numbered(40));
            surface.set_caret(Position::new(start, 0));
            let events = record(&mut surface);
            surface.set_caret(Position::new(target, 3));
            let expected = usize::from(start != target);
            prop_assert_eq!(caret_changes(&events.borrow()), expected);
        }
    }
}
