use iced::keyboard::{self, key::Named, Key};
use iced::Task;
use std::path::PathBuf;

use lyra_core::tabs::write_atomic;
use lyra_core::{CoreError, Motion, TabId, WrapMode};

use super::{App, Message};
use crate::theme::{MAX_FONT_SIZE, MIN_FONT_SIZE};

impl App {
    pub fn update(&mut self, message: Message) -> Task<Message> {
        let task = self.handle(message);
        self.sync_editors();
        task
    }

    fn handle(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::NewFile => {
                self.new_tab();
                self.status_message = "New file created".to_string();
            }

            Message::OpenFile => {
                return Task::perform(
                    async {
                        let handle = rfd::AsyncFileDialog::new()
                            .add_filter("All Files", &["*"])
                            .add_filter("Rust", &["rs"])
                            .add_filter("C/C++", &["c", "h", "cpp", "hpp", "cc"])
                            .add_filter("Text", &["txt", "md"])
                            .pick_file()
                            .await;

                        match handle {
                            Some(file) => {
                                let path = file.path().to_path_buf();
                                match tokio::fs::read_to_string(&path).await {
                                    Ok(content) => Ok((path, content)),
                                    Err(e) => Err(format!("Failed to read file: {}", e)),
                                }
                            }
                            None => Err("Cancelled".to_string()),
                        }
                    },
                    Message::FileOpened,
                );
            }

            Message::Save => {
                let Some(tab) = self.tabs.active() else {
                    self.status_message = CoreError::NoActiveTab.to_string();
                    return Task::none();
                };
                let id = tab.id();
                match tab.path().map(|p| p.to_path_buf()) {
                    Some(path) => {
                        let snapshot = (tab.editor().text(), tab.editor().surface().revision());
                        return save_task(id, path, snapshot);
                    }
                    None => return self.handle(Message::SaveAs),
                }
            }

            Message::SaveAs => {
                let Some(tab) = self.tabs.active() else {
                    self.status_message = CoreError::NoActiveTab.to_string();
                    return Task::none();
                };
                let id = tab.id();
                let snapshot = (tab.editor().text(), tab.editor().surface().revision());
                let default_name = tab.title().to_string();
                return Task::perform(
                    async move {
                        let handle = rfd::AsyncFileDialog::new()
                            .set_file_name(&default_name)
                            .save_file()
                            .await;

                        match handle {
                            Some(file) => write_file(id, file.path().to_path_buf(), snapshot).await,
                            None => Err("Cancelled".to_string()),
                        }
                    },
                    Message::FileSaved,
                );
            }

            Message::CloseTab(id) => self.close_tab(id),

            Message::CloseCurrentTab => {
                if let Some(id) = self.tabs.active_id() {
                    self.close_tab(id);
                }
            }

            Message::Undo => {
                if let Some(tab) = self.tabs.active_mut() {
                    if !tab.editor_mut().surface_mut().undo() {
                        self.status_message = "Nothing to undo".to_string();
                    }
                }
            }

            Message::Redo => {
                if let Some(tab) = self.tabs.active_mut() {
                    if !tab.editor_mut().surface_mut().redo() {
                        self.status_message = "Nothing to redo".to_string();
                    }
                }
            }

            Message::TabSelected(id) => {
                if let Err(e) = self.tabs.activate(id) {
                    tracing::warn!("{}", e);
                }
            }

            Message::EditorClicked(position) => {
                if let Some(tab) = self.tabs.active_mut() {
                    tab.editor_mut()
                        .surface_mut()
                        .click(position.x.round() as i32, position.y.round() as i32);
                }
            }

            Message::EditorScrolled(dy) => {
                if let Some(tab) = self.tabs.active_mut() {
                    tab.editor_mut().surface_mut().scroll_by(dy.round() as i32);
                }
            }

            Message::EditorResized(size) => {
                self.editor_size = size;
            }

            Message::WindowResized(size) => {
                self.editor_size = iced::Size::new(
                    size.width,
                    (size.height - crate::theme::TAB_BAR_HEIGHT - crate::theme::STATUS_BAR_HEIGHT)
                        .max(0.0),
                );
            }

            Message::ZoomIn => self.set_font_size(self.font_size + 1.0),
            Message::ZoomOut => self.set_font_size(self.font_size - 1.0),
            Message::ZoomReset => self.set_font_size(self.tabs.config().ui.font_size),

            Message::ToggleWrap => {
                if let Some(tab) = self.tabs.active_mut() {
                    let surface = tab.editor_mut().surface_mut();
                    let wrap = match surface.wrap() {
                        WrapMode::NoWrap => WrapMode::Viewport,
                        WrapMode::Viewport => WrapMode::NoWrap,
                    };
                    surface.set_wrap(wrap);
                    self.status_message = match wrap {
                        WrapMode::NoWrap => "Word wrap off",
                        WrapMode::Viewport => "Word wrap on",
                    }
                    .to_string();
                }
            }

            Message::KeyPressed(key, modifiers) => {
                return self.handle_key_pressed(key, modifiers);
            }

            Message::FileOpened(result) => match result {
                Ok((path, content)) => {
                    let id = self.tabs.open_loaded(path.clone(), &content);
                    self.track(id);
                    self.status_message = format!("Opened: {}", path.display());
                }
                Err(e) if e == "Cancelled" => {}
                Err(e) => {
                    tracing::warn!("{}", e);
                    self.status_message = e;
                }
            },

            Message::FileSaved(result) => match result {
                Ok((id, path, revision)) => {
                    match self.tabs.mark_saved(id, Some(path.clone()), revision) {
                        Ok(true) => self.status_message = format!("Saved: {}", path.display()),
                        Ok(false) => {
                            self.status_message =
                                format!("Saved: {} (edited since)", path.display())
                        }
                        // Closed while the write was in flight
                        Err(CoreError::TabNotFound(_)) => {}
                        Err(e) => self.status_message = e.to_string(),
                    }
                }
                Err(e) if e == "Cancelled" => {}
                Err(e) => {
                    tracing::warn!("{}", e);
                    self.status_message = e;
                }
            },
        }
        Task::none()
    }

    pub fn handle_key_pressed(&mut self, key: Key, modifiers: keyboard::Modifiers) -> Task<Message> {
        // AltGr arrives as Ctrl+Alt on Windows; its characters are text.
        let alt_gr = modifiers.control() && modifiers.alt();

        if modifiers.control() && !alt_gr {
            if let Key::Character(c) = &key {
                let c = c.to_lowercase();
                if modifiers.shift() {
                    match c.as_str() {
                        "s" => return self.handle(Message::SaveAs),
                        "z" => return self.handle(Message::Redo),
                        _ => {}
                    }
                } else {
                    match c.as_str() {
                        "n" => return self.handle(Message::NewFile),
                        "o" => return self.handle(Message::OpenFile),
                        "s" => return self.handle(Message::Save),
                        "w" => return self.handle(Message::CloseCurrentTab),
                        "z" => return self.handle(Message::Undo),
                        "y" => return self.handle(Message::Redo),
                        "=" | "+" => return self.handle(Message::ZoomIn),
                        "-" => return self.handle(Message::ZoomOut),
                        "0" => return self.handle(Message::ZoomReset),
                        _ => {}
                    }
                }
            }

            match key {
                Key::Named(Named::Home) => self.move_caret(Motion::DocumentStart),
                Key::Named(Named::End) => self.move_caret(Motion::DocumentEnd),
                _ => {}
            }
            return Task::none();
        }

        if modifiers.alt() && !alt_gr {
            if matches!(&key, Key::Character(c) if c.eq_ignore_ascii_case("z")) {
                return self.handle(Message::ToggleWrap);
            }
            return Task::none();
        }

        let Some(tab) = self.tabs.active_mut() else {
            return Task::none();
        };
        let surface = tab.editor_mut().surface_mut();
        match key {
            Key::Character(c) => {
                surface.insert_str(c.as_str());
            }
            Key::Named(named) => match named {
                Named::Enter => {
                    surface.insert_newline();
                }
                Named::Backspace => {
                    surface.delete_backward();
                }
                Named::Delete => {
                    surface.delete_forward();
                }
                Named::Tab => {
                    surface.insert_str("\t");
                }
                Named::Space => {
                    surface.insert_str(" ");
                }
                Named::ArrowLeft => {
                    surface.move_caret(Motion::Left);
                }
                Named::ArrowRight => {
                    surface.move_caret(Motion::Right);
                }
                Named::ArrowUp => {
                    surface.move_caret(Motion::Up);
                }
                Named::ArrowDown => {
                    surface.move_caret(Motion::Down);
                }
                Named::Home => {
                    surface.move_caret(Motion::LineStart);
                }
                Named::End => {
                    surface.move_caret(Motion::LineEnd);
                }
                Named::PageUp => {
                    surface.move_caret(Motion::PageUp);
                }
                Named::PageDown => {
                    surface.move_caret(Motion::PageDown);
                }
                _ => {}
            },
            Key::Unidentified => {}
        }
        Task::none()
    }

    fn move_caret(&mut self, motion: Motion) {
        if let Some(tab) = self.tabs.active_mut() {
            tab.editor_mut().surface_mut().move_caret(motion);
        }
    }

    fn close_tab(&mut self, id: TabId) {
        match self.tabs.close(id) {
            Ok(tab) => {
                self.caches.remove(&id);
                self.status_message = format!("Closed {}", tab.title());
                if self.tabs.is_empty() {
                    self.new_tab();
                }
            }
            Err(e) => tracing::warn!("{}", e),
        }
    }

    fn set_font_size(&mut self, size: f32) {
        self.font_size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self.status_message = format!("Font size {}", self.font_size);
    }
}

/// Text of a tab and the revision it was taken at.
type Snapshot = (String, u64);

fn save_task(id: TabId, path: PathBuf, snapshot: Snapshot) -> Task<Message> {
    Task::perform(write_file(id, path, snapshot), Message::FileSaved)
}

async fn write_file(
    id: TabId,
    path: PathBuf,
    (content, revision): Snapshot,
) -> Result<(TabId, PathBuf, u64), String> {
    let target = path.clone();
    match tokio::task::spawn_blocking(move || write_atomic(&target, &content)).await {
        Ok(Ok(())) => Ok((id, path, revision)),
        Ok(Err(e)) => Err(format!("Failed to save: {}", e)),
        Err(e) => Err(format!("Failed to save: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Flags;
    use lyra_buffer::Position;

    fn app() -> App {
        App::new(Flags::default()).0
    }

    fn press(app: &mut App, key: Key, modifiers: keyboard::Modifiers) {
        let _ = app.update(Message::KeyPressed(key, modifiers));
    }

    fn type_str(app: &mut App, text: &str) {
        for ch in text.chars() {
            press(app, Key::Character(ch.to_string().into()), keyboard::Modifiers::empty());
        }
    }

    fn active_text(app: &App) -> String {
        app.tabs.active().map(|t| t.editor().text()).unwrap_or_default()
    }

    #[test]
    fn test_starts_with_untitled_tab() {
        let app = app();
        assert_eq!(app.tabs.len(), 1);
        assert_eq!(app.caches.len(), 1);
        assert_eq!(app.title(), "Untitled - Lyra");
    }

    #[test]
    fn test_typing_and_enter() {
        let mut app = app();
        type_str(&mut app, "ab");
        press(&mut app, Key::Named(Named::Enter), keyboard::Modifiers::empty());
        type_str(&mut app, "c");
        assert_eq!(active_text(&app), "ab\nc");
        assert_eq!(app.title(), "Untitled * - Lyra");

        press(&mut app, Key::Named(Named::ArrowUp), keyboard::Modifiers::empty());
        let caret = app.tabs.active().map(|t| t.editor().surface().caret());
        assert_eq!(caret, Some(Position::new(0, 1)));
    }

    #[test]
    fn test_undo_shortcut() {
        let mut app = app();
        type_str(&mut app, "hello");
        press(&mut app, Key::Character("z".into()), keyboard::Modifiers::CTRL);
        assert_eq!(active_text(&app), "");
        press(&mut app, Key::Character("y".into()), keyboard::Modifiers::CTRL);
        assert_eq!(active_text(&app), "hello");
    }

    #[test]
    fn test_new_and_close_tabs() {
        let mut app = app();
        press(&mut app, Key::Character("n".into()), keyboard::Modifiers::CTRL);
        assert_eq!(app.tabs.len(), 2);
        assert_eq!(app.caches.len(), 2);

        press(&mut app, Key::Character("w".into()), keyboard::Modifiers::CTRL);
        press(&mut app, Key::Character("w".into()), keyboard::Modifiers::CTRL);
        // closing the last tab leaves a fresh one
        assert_eq!(app.tabs.len(), 1);
        assert_eq!(app.caches.len(), 1);
    }

    #[test]
    fn test_alt_z_toggles_wrap() {
        let mut app = app();
        press(&mut app, Key::Character("z".into()), keyboard::Modifiers::ALT);
        let wrap = app.tabs.active().map(|t| t.editor().surface().wrap());
        assert_eq!(wrap, Some(WrapMode::Viewport));
    }

    #[test]
    fn test_zoom_reflows_and_is_clamped() {
        let mut app = app();
        let gutter_before = app.tabs.active().map(|t| t.editor().gutter().width());
        press(&mut app, Key::Character("=".into()), keyboard::Modifiers::CTRL);
        press(&mut app, Key::Character("+".into()), keyboard::Modifiers::CTRL);
        assert_eq!(app.font_size, 16.0);
        let gutter_after = app.tabs.active().map(|t| t.editor().gutter().width());
        assert_ne!(gutter_before, gutter_after);

        for _ in 0..100 {
            let _ = app.update(Message::ZoomOut);
        }
        assert_eq!(app.font_size, MIN_FONT_SIZE);
    }

    #[test]
    fn test_file_opened_adds_tab_once() {
        let mut app = app();
        let path = PathBuf::from("/nonexistent/lyra/main.rs");
        let _ = app.update(Message::FileOpened(Ok((path.clone(), "fn main() {}".to_string()))));
        let _ = app.update(Message::FileOpened(Ok((path, "ignored".to_string()))));
        assert_eq!(app.tabs.len(), 2);
        assert_eq!(active_text(&app), "fn main() {}");
        assert_eq!(app.tabs.active().map(|t| t.language().to_string()), Some("rust".to_string()));
    }

    #[test]
    fn test_file_saved_for_closed_tab_is_ignored() {
        let mut app = app();
        let stray = TabId::new();
        let _ = app.update(Message::FileSaved(Ok((stray, PathBuf::from("x.txt"), 0))));
        assert!(app.status_message.starts_with("Ready"));
    }

    #[test]
    fn test_typing_during_save_keeps_tab_dirty() {
        let mut app = app();
        let path = PathBuf::from("/nonexistent/lyra/notes.txt");
        let _ = app.update(Message::FileOpened(Ok((path.clone(), "draft".to_string()))));
        type_str(&mut app, "!");

        let _ = app.update(Message::Save);
        let tab = app.tabs.active().unwrap();
        let (id, written) = (tab.id(), tab.editor().surface().revision());

        type_str(&mut app, "x");
        let _ = app.update(Message::FileSaved(Ok((id, path.clone(), written))));
        let tab = app.tabs.active().unwrap();
        assert!(tab.is_modified());
        assert!(tab.display_title().ends_with('\u{25cf}'));
        assert_eq!(app.title(), "notes.txt * - Lyra");

        let current = tab.editor().surface().revision();
        let _ = app.update(Message::FileSaved(Ok((id, path, current))));
        assert!(!app.tabs.active().unwrap().is_modified());
    }

    #[test]
    fn test_ctrl_alt_types_alt_gr_characters() {
        let mut app = app();
        let alt_gr = keyboard::Modifiers::CTRL | keyboard::Modifiers::ALT;
        press(&mut app, Key::Character("@".into()), alt_gr);
        press(&mut app, Key::Character("{".into()), alt_gr);
        assert_eq!(active_text(&app), "@{");
        assert_eq!(app.tabs.len(), 1);
    }

    #[test]
    fn test_editor_resize_reaches_surface() {
        let mut app = app();
        let _ = app.update(Message::EditorResized(iced::Size::new(640.0, 480.0)));
        let size = app.tabs.active().map(|t| t.editor().surface().size());
        assert_eq!(size, Some((640, 480)));
    }
}
