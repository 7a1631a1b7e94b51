//! The editor widget: a canvas that paints a [`CodeEditor`].
//!
//! Drawing is cached per tab. The app clears a tab's cache whenever its
//! editor reports anything but an idle repaint, so an unchanged editor is
//! never redrawn.

use iced::alignment;
use iced::event::Status;
use iced::mouse;
use iced::widget::canvas::{self, Cache, Frame, Geometry, Path, Stroke};
use iced::{Font, Pixels, Point, Rectangle, Renderer, Size, Theme};

use lyra_core::{Align, CodeEditor, Painter, Rect, Rgb};

use crate::app::Message;
use crate::theme::to_iced;

/// Lines scrolled per wheel notch.
const WHEEL_LINES: f32 = 3.0;

/// [`Painter`] over an iced canvas frame.
pub struct FramePainter<'a> {
    frame: &'a mut Frame,
    font_size: f32,
}

impl<'a> FramePainter<'a> {
    pub fn new(frame: &'a mut Frame, font_size: f32) -> Self {
        Self { frame, font_size }
    }
}

fn point(x: i32, y: i32) -> Point {
    Point::new(x as f32, y as f32)
}

fn size(rect: Rect) -> Size {
    Size::new(rect.width.max(0) as f32, rect.height.max(0) as f32)
}

impl Painter for FramePainter<'_> {
    fn fill_rect(&mut self, rect: Rect, color: Rgb) {
        self.frame
            .fill_rectangle(point(rect.x, rect.y), size(rect), to_iced(color));
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgb, width: i32) {
        // Inset by half the stroke so it stays inside `rect`.
        let half = width as f32 / 2.0;
        let origin = Point::new(rect.x as f32 + half, rect.y as f32 + half);
        let inner = Size::new(
            (rect.width as f32 - width as f32).max(0.0),
            (rect.height as f32 - width as f32).max(0.0),
        );
        self.frame.stroke(
            &Path::rectangle(origin, inner),
            Stroke::default()
                .with_color(to_iced(color))
                .with_width(width as f32),
        );
    }

    fn draw_text(&mut self, rect: Rect, text: &str, align: Align, color: Rgb) {
        let (x, horizontal_alignment) = match align {
            Align::Left => (rect.left(), alignment::Horizontal::Left),
            Align::Right => (rect.right(), alignment::Horizontal::Right),
        };
        self.frame.fill_text(canvas::Text {
            content: text.to_string(),
            position: Point::new(x as f32, rect.y as f32 + rect.height as f32 / 2.0),
            color: to_iced(color),
            size: Pixels(self.font_size),
            font: Font::MONOSPACE,
            horizontal_alignment,
            vertical_alignment: alignment::Vertical::Center,
            ..canvas::Text::default()
        });
    }
}

/// Canvas program rendering one editor.
pub struct EditorCanvas<'a> {
    pub editor: &'a CodeEditor,
    pub cache: &'a Cache,
    pub font_size: f32,
}

/// Size the canvas last reported.
#[derive(Debug, Default)]
pub struct CanvasState {
    last_size: Option<Size>,
}

impl EditorCanvas<'_> {
    fn mouse_message(
        &self,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<Message> {
        let canvas::Event::Mouse(event) = event else {
            return None;
        };
        let position = cursor.position_in(bounds)?;

        match event {
            mouse::Event::ButtonPressed(mouse::Button::Left) => {
                Some(Message::EditorClicked(position))
            }
            mouse::Event::WheelScrolled { delta } => {
                let line_height = self.editor.surface().metrics().line_height as f32;
                let dy = match delta {
                    mouse::ScrollDelta::Lines { y, .. } => -y * WHEEL_LINES * line_height,
                    mouse::ScrollDelta::Pixels { y, .. } => -y,
                };
                Some(Message::EditorScrolled(dy))
            }
            _ => None,
        }
    }
}

impl canvas::Program<Message> for EditorCanvas<'_> {
    type State = CanvasState;

    fn update(
        &self,
        state: &mut CanvasState,
        event: canvas::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> (Status, Option<Message>) {
        if let Some(message) = self.mouse_message(event, bounds, cursor) {
            return (Status::Captured, Some(message));
        }

        // A pending size change goes out with the next event that carries
        // nothing else.
        if state.last_size != Some(bounds.size()) {
            state.last_size = Some(bounds.size());
            return (Status::Ignored, Some(Message::EditorResized(bounds.size())));
        }
        (Status::Ignored, None)
    }

    fn draw(
        &self,
        _state: &CanvasState,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let geometry = self.cache.draw(renderer, bounds.size(), |frame| {
            let clip = Rect::new(0, 0, bounds.width.ceil() as i32, bounds.height.ceil() as i32);
            let mut painter = FramePainter::new(frame, self.font_size);
            self.editor.paint(clip, &mut painter);
        });
        vec![geometry]
    }

    fn mouse_interaction(
        &self,
        _state: &CanvasState,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        let gutter = self.editor.gutter().width() as f32;
        match cursor.position_in(bounds) {
            Some(p) if p.x >= gutter => mouse::Interaction::Text,
            _ => mouse::Interaction::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iced::widget::canvas::Program;
    use lyra_core::Config;

    fn canvas_event(event: mouse::Event) -> canvas::Event {
        canvas::Event::Mouse(event)
    }

    #[test]
    fn test_click_during_resize_is_kept() {
        let editor = CodeEditor::new(&Config::default());
        let cache = Cache::new();
        let program = EditorCanvas {
            editor: &editor,
            cache: &cache,
            font_size: 14.0,
        };
        let mut state = CanvasState::default();
        let bounds = Rectangle::new(Point::ORIGIN, Size::new(400.0, 300.0));
        let cursor = mouse::Cursor::Available(Point::new(50.0, 10.0));

        let (status, message) = program.update(
            &mut state,
            canvas_event(mouse::Event::ButtonPressed(mouse::Button::Left)),
            bounds,
            cursor,
        );
        assert_eq!(status, Status::Captured);
        assert!(matches!(message, Some(Message::EditorClicked(p)) if p == Point::new(50.0, 10.0)));

        // the size goes out with the next quiet event
        let (_, message) =
            program.update(&mut state, canvas_event(mouse::Event::CursorEntered), bounds, cursor);
        assert!(matches!(message, Some(Message::EditorResized(size)) if size == bounds.size()));

        let (_, message) =
            program.update(&mut state, canvas_event(mouse::Event::CursorEntered), bounds, cursor);
        assert!(message.is_none());
    }
}
