//! # Lyra Core
//!
//! The editing widget and the state around it.
//!
//! ```text
//! ┌──────────────────────── CodeEditor ────────────────────────┐
//! │ ┌──────────┐  events   ┌───────────────────────────────────┐│
//! │ │  Gutter  │ ◄──────── │ TextSurface (buffer, caret, view) ││
//! │ └──────────┘  sync()   └───────────────────────────────────┘│
//! │       └──────── set_left_margin ─────────┘                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The surface publishes what changed; the gutter queues it and decides on
//! the next [`CodeEditor::sync`] whether its width needs recomputing and how
//! much has to be repainted. Painting goes through the [`Painter`] trait so
//! nothing here depends on a GUI toolkit.

pub mod config;
pub mod editor;
pub mod event;
pub mod gutter;
pub mod language;
pub mod paint;
pub mod surface;
pub mod sync;
pub mod tabs;

pub use config::{ColorScheme, Config, ConfigError};
pub use editor::CodeEditor;
pub use event::{EventBus, Invalidation, SubscriptionId, SurfaceEvent};
pub use gutter::{Gutter, GutterRow};
pub use language::LanguageMap;
pub use paint::{Align, Painter, Rect, Rgb};
pub use surface::{FontMetrics, Motion, TextSurface, WrapMode};
pub use sync::{Repaint, SyncOutcome};
pub use tabs::{Tab, TabId, Tabs};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Tab not found: {0}")]
    TabNotFound(TabId),

    #[error("No active tab")]
    NoActiveTab,

    #[error("Tab {0} has no file yet")]
    Untitled(TabId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
