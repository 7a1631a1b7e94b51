//! The line-number gutter.
//!
//! The gutter sits to the left of the text area and draws one number per
//! visible line, aligned with the line's top edge. It keeps no per-line
//! state: rows are rebuilt from the surface on every paint. The only cached
//! value is the width, which changes solely during [`Gutter::sync`].

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{ColorScheme, GutterConfig};
use crate::event::{SubscriptionId, SurfaceEvent};
use crate::paint::{Align, Painter, Rect};
use crate::surface::TextSurface;
use crate::sync::{self, Repaint, SyncOutcome};

/// Line count the width is sized for until a document outgrows it.
pub const DEFAULT_DIGIT_FLOOR: usize = 1_000_000;

/// Number of decimal digits in `n`. Zero has one digit.
pub fn digit_count(n: usize) -> usize {
    n.checked_ilog10().map_or(1, |d| d as usize + 1)
}

/// Gutter width in pixels for a document of `line_count` lines.
pub fn gutter_width(line_count: usize, digit_floor: usize, digit_width: i32, padding: i32) -> i32 {
    padding + digit_width * digit_count(line_count.max(digit_floor)) as i32
}

/// A line number right-aligned in `min_columns`, followed by `trailing`
/// blank columns.
pub fn line_label(number: usize, min_columns: usize, trailing: usize) -> String {
    format!("{number:>min_columns$}{}", " ".repeat(trailing))
}

/// One painted gutter row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GutterRow {
    /// 1-based line number
    pub number: usize,
    pub top: i32,
    pub height: i32,
    pub label: String,
    /// Whether the caret is on this line
    pub current: bool,
}

/// Line-number gutter attached to one [`TextSurface`].
#[derive(Debug)]
pub struct Gutter {
    config: GutterConfig,
    colors: ColorScheme,
    width: i32,
    inbox: Rc<RefCell<Vec<SurfaceEvent>>>,
    subscription: Option<SubscriptionId>,
}

impl Gutter {
    /// Subscribes to `surface` and reserves the initial width on its left.
    pub fn attach(surface: &mut TextSurface, config: GutterConfig, colors: ColorScheme) -> Self {
        let inbox = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&inbox);
        let subscription = surface.subscribe(move |event| sink.borrow_mut().push(event.clone()));

        let mut gutter = Self {
            config,
            colors,
            width: 0,
            inbox,
            subscription: Some(subscription),
        };
        gutter.recompute_width(surface);
        gutter
    }

    /// Stops listening to `surface`. Pending events are dropped.
    pub fn detach(&mut self, surface: &mut TextSurface) {
        if let Some(id) = self.subscription.take() {
            surface.unsubscribe(id);
        }
        self.inbox.borrow_mut().clear();
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn config(&self) -> &GutterConfig {
        &self.config
    }

    pub fn set_colors(&mut self, colors: ColorScheme) {
        self.colors = colors;
    }

    /// True if events arrived since the last synchronisation.
    pub fn has_pending(&self) -> bool {
        !self.inbox.borrow().is_empty()
    }

    /// Folds queued events into a repaint decision, recomputing the width
    /// and the surface's left margin when the layout may have changed.
    pub fn sync(&mut self, surface: &mut TextSurface) -> SyncOutcome {
        let events = std::mem::take(&mut *self.inbox.borrow_mut());
        if events.is_empty() {
            return SyncOutcome::default();
        }

        let plan = sync::plan(&events, surface.viewport_rect());
        let mut outcome = SyncOutcome {
            repaint: plan.repaint,
            ..SyncOutcome::default()
        };
        if plan.recompute_width {
            outcome.width_recomputed = true;
            outcome.width_changed = self.recompute_width(surface);
            if outcome.width_changed {
                outcome.repaint = Repaint::Full;
            }
        }

        tracing::trace!(
            "Gutter sync: {} events -> {:?} (width {})",
            events.len(),
            outcome.repaint,
            self.width
        );
        outcome
    }

    /// Returns true if the width changed.
    fn recompute_width(&mut self, surface: &mut TextSurface) -> bool {
        let width = gutter_width(
            surface.line_count(),
            self.config.digit_floor,
            surface.metrics().digit_width,
            self.config.padding,
        );
        let changed = width != self.width;
        if changed {
            tracing::debug!("Gutter width {} -> {} ({} lines)", self.width, width, surface.line_count());
        }
        self.width = width;
        surface.set_left_margin(width);
        changed
    }

    /// Rows for every line overlapping `clip`, top to bottom.
    pub fn rows(&self, surface: &TextSurface, clip: Rect) -> Vec<GutterRow> {
        let caret_line = surface.caret_line();
        surface
            .visible_lines(clip)
            .into_iter()
            .map(|geometry| GutterRow {
                number: geometry.line + 1,
                top: geometry.top,
                height: geometry.height,
                label: line_label(
                    geometry.line + 1,
                    self.config.min_number_columns,
                    self.config.trailing_columns,
                ),
                current: geometry.line == caret_line,
            })
            .collect()
    }

    /// Paints the gutter's part of `clip`. The caret line's highlight band
    /// spans the gutter and the text area.
    pub fn paint(&self, surface: &TextSurface, clip: Rect, painter: &mut impl Painter) {
        painter.fill_rect(
            Rect::new(0, clip.top(), self.width, clip.height),
            self.colors.gutter_background,
        );

        let band_width = self.width + surface.viewport_rect().width;
        let number_height = surface.metrics().line_height;
        for row in self.rows(surface, clip) {
            if row.current && self.config.highlight_current_line {
                painter.fill_rect(
                    Rect::new(0, row.top, band_width, row.height),
                    self.colors.current_line,
                );
            }
            painter.draw_text(
                Rect::new(0, row.top, self.width, number_height),
                &row.label,
                Align::Right,
                self.colors.gutter_foreground,
            );
        }
    }
}
