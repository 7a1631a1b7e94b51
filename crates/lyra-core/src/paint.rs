//! Pixel geometry and the drawing seam between the editor and a renderer.
//!
//! The core never talks to a GUI toolkit. It describes what to draw through
//! [`Painter`], and the host implements that trait over whatever surface it
//! renders into.

use serde::{Deserialize, Serialize};

/// An integer pixel rectangle. `right()` and `bottom()` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn top(&self) -> i32 {
        self.y
    }

    #[inline]
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    #[inline]
    pub fn left(&self) -> i32 {
        self.x
    }

    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// True if the half-open span `[top, bottom)` overlaps this rectangle
    /// vertically.
    pub fn overlaps_span(&self, top: i32, bottom: i32) -> bool {
        top < self.bottom() && bottom > self.top()
    }

    /// True if `other` lies entirely inside this rectangle.
    pub fn contains(&self, other: &Rect) -> bool {
        other.left() >= self.left()
            && other.right() <= self.right()
            && other.top() >= self.top()
            && other.bottom() <= self.bottom()
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(left, top, right - left, bottom - top)
    }
}

/// An opaque RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Horizontal placement of text inside its box. Text is always vertically
/// centred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Drawing operations the editor needs from a renderer.
pub trait Painter {
    fn fill_rect(&mut self, rect: Rect, color: Rgb);

    /// Outlines `rect` with a stroke of `width` pixels.
    fn stroke_rect(&mut self, rect: Rect, color: Rgb, width: i32);

    fn draw_text(&mut self, rect: Rect, text: &str, align: Align, color: Rgb);
}

/// A painter that records every call, for tests and diagnostics.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Recording {
    pub ops: Vec<PaintOp>,
}

/// One recorded drawing call.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintOp {
    Fill(Rect, Rgb),
    Stroke(Rect, Rgb, i32),
    Text(Rect, String, Align, Rgb),
}

impl Recording {
    /// The text of every recorded `draw_text` call, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                PaintOp::Text(_, text, _, _) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Painter for Recording {
    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.ops.push(PaintOp::Fill(rect, color));
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgb, width: i32) {
        self.ops.push(PaintOp::Stroke(rect, color, width));
    }

    fn draw_text(&mut self, rect: Rect, text: &str, align: Align, color: Rgb) {
        self.ops.push(PaintOp::Text(rect, text.to_string(), align, color));
    }
}
