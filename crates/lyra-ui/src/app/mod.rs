use iced::widget::canvas;
use iced::{keyboard, window, Size, Subscription, Task};
use std::collections::HashMap;
use std::path::PathBuf;

use lyra_core::{Config, FontMetrics, TabId, Tabs};

use crate::theme::{STATUS_BAR_HEIGHT, TAB_BAR_HEIGHT};

pub mod messages;
pub mod update;
pub mod view;

pub use messages::*;

/// Launch options.
#[derive(Debug, Clone, Default)]
pub struct Flags {
    /// File to open at startup
    pub file: Option<PathBuf>,
    pub config: Config,
}

pub struct App {
    pub tabs: Tabs,
    /// Canvas drawing cache for each open tab
    pub caches: HashMap<TabId, canvas::Cache>,
    pub font_size: f32,
    /// Size of the editor canvas in logical pixels
    pub editor_size: Size,
    pub status_message: String,
}

impl App {
    pub fn new(flags: Flags) -> (Self, Task<Message>) {
        let Flags { file, config } = flags;
        let editor_size = Size::new(
            config.ui.window_width,
            (config.ui.window_height - TAB_BAR_HEIGHT - STATUS_BAR_HEIGHT).max(0.0),
        );

        let mut app = Self {
            font_size: config.ui.font_size,
            tabs: Tabs::new(config),
            caches: HashMap::new(),
            editor_size,
            status_message: "Ready | Ctrl+O: Open | Ctrl+S: Save | Ctrl+N: New".to_string(),
        };

        match file {
            Some(path) => match app.tabs.open(&path) {
                Ok(id) => app.track(id),
                Err(e) => {
                    app.status_message = format!("Could not open {}: {}", path.display(), e);
                    app.new_tab();
                }
            },
            None => app.new_tab(),
        }
        app.sync_editors();

        (app, Task::none())
    }

    pub fn title(&self) -> String {
        match self.tabs.active() {
            Some(tab) => {
                let modified = if tab.is_modified() { " *" } else { "" };
                format!("{}{} - Lyra", tab.title(), modified)
            }
            None => "Lyra".to_string(),
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            keyboard::on_key_press(|key, modifiers| Some(Message::KeyPressed(key, modifiers))),
            window::resize_events().map(|(_id, size)| Message::WindowResized(size)),
        ])
    }

    /// Font metrics for the current zoom level.
    pub fn metrics(&self) -> FontMetrics {
        FontMetrics::monospace(self.font_size, self.tabs.config().ui.line_height)
    }

    fn new_tab(&mut self) {
        let id = self.tabs.new_untitled();
        self.track(id);
    }

    fn track(&mut self, id: TabId) {
        self.caches.entry(id).or_insert_with(canvas::Cache::new);
    }

    /// Pushes size and font into every editor, synchronises them, and drops
    /// the drawing cache of every editor that needs repainting.
    pub fn sync_editors(&mut self) {
        let width = self.editor_size.width.floor() as i32;
        let height = self.editor_size.height.floor() as i32;
        let metrics = self.metrics();

        for tab in self.tabs.iter_mut() {
            let editor = tab.editor_mut();
            editor.surface_mut().set_font_metrics(metrics);
            editor.surface_mut().resize(width, height);
            let outcome = editor.sync();
            if !outcome.repaint.is_idle() {
                if let Some(cache) = self.caches.get(&tab.id()) {
                    cache.clear();
                }
            }
        }
    }
}

pub fn run(flags: Flags) -> iced::Result {
    let window_size = Size::new(flags.config.ui.window_width, flags.config.ui.window_height);
    iced::application(App::title, App::update, App::view)
        .subscription(App::subscription)
        .window_size(window_size)
        .theme(|_| iced::Theme::Dark)
        .antialiasing(true)
        .run_with(move || App::new(flags))
}
