use iced::{keyboard, Point, Size};
use std::path::PathBuf;

use lyra_core::TabId;

#[derive(Debug, Clone)]
pub enum Message {
    // File operations
    NewFile,
    OpenFile,
    Save,
    SaveAs,
    CloseTab(TabId),
    CloseCurrentTab,

    // Edit operations
    Undo,
    Redo,

    // Navigation
    TabSelected(TabId),

    // Editor canvas
    EditorClicked(Point),
    EditorScrolled(f32),
    EditorResized(Size),
    WindowResized(Size),

    // View
    ZoomIn,
    ZoomOut,
    ZoomReset,
    ToggleWrap,

    KeyPressed(keyboard::Key, keyboard::Modifiers),

    // Async results
    FileOpened(Result<(PathBuf, String), String>),
    /// Saved tab, its path and the edit revision that was written
    FileSaved(Result<(TabId, PathBuf, u64), String>),
}
