//! Page-side name selection.
//!
//! Each open page runs one [`PageInstance`]: it keeps its own cached
//! template, turns a selected first name into a greeting, copies it, shows
//! the outcome in the feedback overlay and reports the click to the
//! coordinator.

pub mod clipboard;
pub mod feedback;
mod handler;
mod page;

pub use clipboard::{
    ClipboardBackend, ClipboardError, ClipboardWriter, CommandClipboard, FallbackClipboard,
    MemoryClipboard, SystemClipboard,
};
pub use feedback::{ClipboardStatus, FeedbackOverlay, FeedbackView, DEFAULT_DISMISS_AFTER};
pub use handler::{NameSelection, NameSelectionHandler};
pub use page::{PageController, PageInstance};
