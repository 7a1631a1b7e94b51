//! A text surface with its line-number gutter.

use lyra_buffer::display_width;

use crate::config::{ColorScheme, Config};
use crate::event::{SubscriptionId, SurfaceEvent};
use crate::gutter::Gutter;
use crate::paint::{Align, Painter, Rect};
use crate::surface::{FontMetrics, TextSurface};
use crate::sync::SyncOutcome;

/// Width of the current-line outline.
const OUTLINE_WIDTH: i32 = 2;

/// The editing widget: a [`TextSurface`] with an attached [`Gutter`].
///
/// Hosts mutate the surface, call [`CodeEditor::sync`] once their batch of
/// changes is done, and paint afterwards. [`CodeEditor::render`] does both.
#[derive(Debug)]
pub struct CodeEditor {
    surface: TextSurface,
    gutter: Gutter,
    colors: ColorScheme,
}

impl CodeEditor {
    pub fn new(config: &Config) -> Self {
        let mut surface = TextSurface::new(&config.editor);
        surface.set_font_metrics(FontMetrics::monospace(config.ui.font_size, config.ui.line_height));
        let gutter = Gutter::attach(&mut surface, config.gutter.clone(), config.colors.clone());
        Self {
            surface,
            gutter,
            colors: config.colors.clone(),
        }
    }

    pub fn set_text(&mut self, content: &str) {
        self.surface.set_text(content);
    }

    pub fn text(&self) -> String {
        self.surface.text()
    }

    pub fn surface(&self) -> &TextSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut TextSurface {
        &mut self.surface
    }

    pub fn gutter(&self) -> &Gutter {
        &self.gutter
    }

    pub fn colors(&self) -> &ColorScheme {
        &self.colors
    }

    pub fn set_colors(&mut self, colors: ColorScheme) {
        self.gutter.set_colors(colors.clone());
        self.colors = colors;
    }

    /// Listens to the surface's notifications alongside the gutter.
    pub fn subscribe(&mut self, listener: impl FnMut(&SurfaceEvent) + 'static) -> SubscriptionId {
        self.surface.subscribe(listener)
    }

    /// Brings the gutter up to date with everything the surface announced.
    pub fn sync(&mut self) -> SyncOutcome {
        self.gutter.sync(&mut self.surface)
    }

    /// Synchronises, then paints `clip`.
    pub fn render(&mut self, clip: Rect, painter: &mut impl Painter) -> SyncOutcome {
        let outcome = self.sync();
        self.paint(clip, painter);
        outcome
    }

    /// Paints gutter and text area inside `clip`. Call [`CodeEditor::sync`]
    /// first if the surface changed.
    pub fn paint(&self, clip: Rect, painter: &mut impl Painter) {
        let viewport = self.surface.viewport_rect();
        painter.fill_rect(
            Rect::new(viewport.x, clip.top(), viewport.width, clip.height),
            self.colors.text_background,
        );

        self.gutter.paint(&self.surface, clip, painter);
        self.paint_text(clip, painter);

        let line = self.surface.caret_line_rect();
        if clip.overlaps_span(line.top(), line.bottom()) {
            painter.stroke_rect(line, self.colors.current_line_outline, OUTLINE_WIDTH);

            let caret = self.surface.caret_rect();
            if caret.left() >= viewport.left() && caret.left() < viewport.right() {
                painter.fill_rect(caret, self.colors.caret);
            }
        }
    }

    fn paint_text(&self, clip: Rect, painter: &mut impl Painter) {
        let metrics = self.surface.metrics();
        let cell = metrics.char_width.max(1);
        let (scroll_x, _) = self.surface.scroll_offset();
        // cells hidden to the left of the text area
        let hidden = ((scroll_x + cell - 1) / cell) as usize;
        let x = self.surface.text_origin_x() + hidden as i32 * cell;

        for geometry in self.surface.visible_lines(clip) {
            let mut top = geometry.top;
            for segment in self.surface.visual_segments(geometry.line) {
                let visible = skip_cells(&segment, hidden);
                if !visible.is_empty() {
                    let width = display_width(visible, 1) as i32 * cell;
                    painter.draw_text(
                        Rect::new(x, top, width, metrics.line_height),
                        visible,
                        Align::Left,
                        self.colors.text_foreground,
                    );
                }
                top += metrics.line_height;
            }
        }
    }
}

/// Drops the first `cells` display cells of `text`. A wide character that
/// straddles the cut is dropped as well.
fn skip_cells(text: &str, cells: usize) -> &str {
    let mut used = 0;
    for (idx, ch) in text.char_indices() {
        if used >= cells {
            return &text[idx..];
        }
        used += display_width(ch.encode_utf8(&mut [0; 4]), 1);
    }
    ""
}
