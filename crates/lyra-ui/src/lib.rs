//! # Lyra UI
//!
//! The iced front end: a tab strip, the canvas-backed editor and a status
//! line.
//!
//! The UI follows the Elm architecture:
//! - **Model**: [`App`] owns the open tabs and one canvas cache per tab
//! - **Message**: everything that can happen, including async results
//! - **Update**: applies a message, then synchronises every editor so the
//!   next paint is never stale
//! - **View**: draws the active editor through the core's `Painter` trait

pub mod app;
pub mod editor_canvas;
pub mod theme;

pub use app::{run, App, Flags};
