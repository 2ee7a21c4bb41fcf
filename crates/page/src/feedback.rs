//! On-page feedback overlay.
//!
//! Shows the selected name and whether the copy worked, then hides itself
//! after a delay. A new selection supersedes the current display: the
//! pending dismissal is cancelled and a fresh one scheduled. Every display
//! carries a generation number so a late dismissal can never hide a newer
//! one.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_DISMISS_AFTER: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardStatus {
    Copied,
    Failed,
}

impl ClipboardStatus {
    /// Status for the outcome of a clipboard write.
    pub fn from_copied(copied: bool) -> Self {
        if copied {
            ClipboardStatus::Copied
        } else {
            ClipboardStatus::Failed
        }
    }

    /// User-facing text for this status.
    pub fn message(&self) -> &'static str {
        match self {
            ClipboardStatus::Copied => "Personalized message copied to clipboard!",
            ClipboardStatus::Failed => "Failed to copy to clipboard. Please try again.",
        }
    }
}

/// What the overlay currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackView {
    pub visible: bool,
    pub name: String,
    pub status: Option<ClipboardStatus>,
    pub generation: u64,
}

impl FeedbackView {
    /// Text to show, if a status has been set.
    pub fn status_message(&self) -> Option<&'static str> {
        self.status.as_ref().map(ClipboardStatus::message)
    }
}

pub struct FeedbackOverlay {
    state: Arc<watch::Sender<FeedbackView>>,
    dismissal: Mutex<CancellationToken>,
    dismiss_after: Duration,
}

impl Default for FeedbackOverlay {
    fn default() -> Self {
        Self::new(DEFAULT_DISMISS_AFTER)
    }
}

impl FeedbackOverlay {
    /// Hidden overlay that dismisses itself `dismiss_after` a show.
    pub fn new(dismiss_after: Duration) -> Self {
        let (state, _) = watch::channel(FeedbackView::default());
        Self {
            state: Arc::new(state),
            dismissal: Mutex::new(CancellationToken::new()),
            dismiss_after,
        }
    }

    /// Display a selection outcome and restart the dismissal timer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn show(&self, name: &str, status: ClipboardStatus) -> u64 {
        let mut generation = 0;
        self.state.send_modify(|view| {
            view.generation += 1;
            view.visible = true;
            view.name = name.to_string();
            view.status = Some(status);
            generation = view.generation;
        });

        let token = self.supersede();
        let state = Arc::clone(&self.state);
        let delay = self.dismiss_after;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if hide(&state, Some(generation)) {
                        tracing::trace!(generation, "Feedback dismissed");
                    }
                }
            }
        });
        generation
    }

    /// Hide now (the close button).
    pub fn close(&self) {
        self.supersede();
        hide(&self.state, None);
    }

    /// Snapshot of what is on screen now.
    pub fn current(&self) -> FeedbackView {
        self.state.borrow().clone()
    }

    /// Follow every change, for rendering.
    pub fn subscribe(&self) -> watch::Receiver<FeedbackView> {
        self.state.subscribe()
    }

    /// Cancel the pending dismissal and install a fresh token for the next.
    fn supersede(&self) -> CancellationToken {
        let fresh = CancellationToken::new();
        let mut current = self
            .dismissal
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        current.cancel();
        *current = fresh.clone();
        fresh
    }
}

impl Drop for FeedbackOverlay {
    fn drop(&mut self) {
        self.dismissal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }
}

/// Hide the overlay if it is visible and, when given, still showing
/// `generation`. Returns whether anything changed.
fn hide(state: &watch::Sender<FeedbackView>, generation: Option<u64>) -> bool {
    state.send_if_modified(|view| {
        let current = generation.map_or(true, |g| g == view.generation);
        if view.visible && current {
            view.visible = false;
            true
        } else {
            false
        }
    })
}
