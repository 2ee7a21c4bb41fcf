//! Clipboard access for copying greetings.
//!
//! The system clipboard (arboard) is tried first; if it cannot be reached a
//! platform copy command is used instead. Callers only see whether the copy
//! worked.

use async_trait::async_trait;
use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard access failed: {0}")]
    AccessFailed(String),
    #[error("copy command failed: {0}")]
    CommandFailed(String),
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, ClipboardError>;

/// One way of putting text on the clipboard.
pub trait ClipboardBackend: Send + Sync {
    fn write_text(&self, text: &str) -> Result<()>;

    /// Whether a write may block the calling thread.
    fn is_blocking(&self) -> bool {
        true
    }
}

/// What a page needs from the clipboard: did the copy work.
#[async_trait]
pub trait ClipboardWriter: Send + Sync {
    async fn write_text(&self, text: &str) -> bool;
}

/// Platform clipboard via arboard.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    /// Opens the platform clipboard on every write.
    pub fn new() -> Self {
        Self
    }
}

impl ClipboardBackend for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| ClipboardError::AccessFailed(format!("init failed: {}", e)))?;
        clipboard
            .set_text(text)
            .map_err(|e| ClipboardError::AccessFailed(format!("set failed: {}", e)))
    }
}

/// Pipes text into a platform copy command (`pbcopy`, `wl-copy`, `xclip`,
/// `clip`).
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    /// Run `program` with `args`, writing the text to its stdin.
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// The copy command for the current platform.
    pub fn detect() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("pbcopy", Vec::new())
        } else if cfg!(target_os = "windows") {
            Self::new("clip", Vec::new())
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            Self::new("wl-copy", Vec::new())
        } else {
            Self::new(
                "xclip",
                vec!["-selection".to_string(), "clipboard".to_string()],
            )
        }
    }

    /// Name of the copy command.
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl ClipboardBackend for CommandClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                ClipboardError::Unavailable(format!("failed to spawn {}: {}", self.program, e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                drop(stdin);
                // Reap the child so it does not linger.
                let _ = child.kill();
                let _ = child.wait();
                return Err(ClipboardError::CommandFailed(format!(
                    "failed to write to {}: {}",
                    self.program, e
                )));
            }
        }

        let status = child
            .wait()
            .map_err(|e| ClipboardError::CommandFailed(format!("{}: {}", self.program, e)))?;
        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::CommandFailed(format!(
                "{} exited with {}",
                self.program, status
            )))
        }
    }
}

/// In-memory clipboard for tests and headless runs.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    writes: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl MemoryClipboard {
    /// A working clipboard with nothing written yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard that rejects every write.
    pub fn failing() -> Self {
        let clipboard = Self::default();
        clipboard.set_failing(true);
        clipboard
    }

    /// Make later writes fail, or work again.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Most recently written text.
    pub fn last(&self) -> Option<String> {
        self.writes.lock().ok()?.last().cloned()
    }

    /// Everything written so far, oldest first.
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl ClipboardBackend for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClipboardError::AccessFailed("memory clipboard offline".into()));
        }
        self.writes
            .lock()
            .map_err(|e| ClipboardError::AccessFailed(e.to_string()))?
            .push(text.to_string());
        Ok(())
    }

    fn is_blocking(&self) -> bool {
        false
    }
}

pub type ClipboardBackendRef = Arc<dyn ClipboardBackend>;

/// Primary clipboard with an optional fallback.
#[derive(Clone)]
pub struct FallbackClipboard {
    primary: ClipboardBackendRef,
    fallback: Option<ClipboardBackendRef>,
}

impl FallbackClipboard {
    /// Try `primary`, then `fallback` if there is one.
    pub fn new(primary: ClipboardBackendRef, fallback: Option<ClipboardBackendRef>) -> Self {
        Self { primary, fallback }
    }

    /// arboard first, then the platform copy command.
    pub fn system() -> Self {
        Self::new(
            Arc::new(SystemClipboard::new()),
            Some(Arc::new(CommandClipboard::detect())),
        )
    }
}

async fn write_with(backend: &ClipboardBackendRef, text: &str) -> Result<()> {
    if !backend.is_blocking() {
        return backend.write_text(text);
    }
    let backend = Arc::clone(backend);
    let text = text.to_string();
    tokio::task::spawn_blocking(move || backend.write_text(&text))
        .await
        .map_err(|e| ClipboardError::Unavailable(format!("clipboard task failed: {}", e)))?
}

#[async_trait]
impl ClipboardWriter for FallbackClipboard {
    async fn write_text(&self, text: &str) -> bool {
        let primary_err = match write_with(&self.primary, text).await {
            Ok(()) => return true,
            Err(e) => e,
        };

        let Some(fallback) = &self.fallback else {
            tracing::warn!(error = %primary_err, "Failed to copy to clipboard");
            return false;
        };
        tracing::debug!(error = %primary_err, "Clipboard unavailable, trying fallback");

        match write_with(fallback, text).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    primary_error = %primary_err,
                    fallback_error = %e,
                    "Failed to copy to clipboard"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_primary_used_when_working() {
        let primary = Arc::new(MemoryClipboard::new());
        let fallback = Arc::new(MemoryClipboard::new());
        let clipboard = FallbackClipboard::new(primary.clone(), Some(fallback.clone()));

        assert!(clipboard.write_text("Dear Maria").await);
        assert_eq!(primary.last().as_deref(), Some("Dear Maria"));
        assert!(fallback.writes().is_empty());
    }

    #[tokio::test]
    async fn test_fallback_after_primary_failure() {
        let primary = Arc::new(MemoryClipboard::failing());
        let fallback = Arc::new(MemoryClipboard::new());
        let clipboard = FallbackClipboard::new(primary, Some(fallback.clone()));

        assert!(clipboard.write_text("Sam, hi").await);
        assert_eq!(fallback.last().as_deref(), Some("Sam, hi"));
    }

    #[tokio::test]
    async fn test_both_failing_reports_false() {
        let clipboard = FallbackClipboard::new(
            Arc::new(MemoryClipboard::failing()),
            Some(Arc::new(MemoryClipboard::failing())),
        );
        assert!(!clipboard.write_text("x").await);
    }

    #[tokio::test]
    async fn test_missing_command_is_unavailable() {
        let command = CommandClipboard::new("salute-no-such-copy-command", Vec::new());
        let clipboard = FallbackClipboard::new(Arc::new(command), None);
        assert!(!clipboard.write_text("x").await);
    }

    #[test]
    fn test_missing_command_error_kind() {
        let command = CommandClipboard::new("salute-no-such-copy-command", Vec::new());
        assert!(matches!(
            command.write_text("x"),
            Err(ClipboardError::Unavailable(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_that_closes_stdin_fails_cleanly() {
        // `true` exits without reading; a large write hits a closed pipe.
        let command = CommandClipboard::new("true", Vec::new());
        let text = "x".repeat(1 << 20);
        assert!(matches!(
            command.write_text(&text),
            Err(ClipboardError::CommandFailed(_))
        ));
    }

    #[test]
    fn test_detect_picks_a_program() {
        assert!(!CommandClipboard::detect().program().is_empty());
    }
}
