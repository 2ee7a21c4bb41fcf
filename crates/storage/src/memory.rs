use crate::{Result, StorageError, TemplateBackend};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory slot, used as a page's local cache.
///
/// Can be switched offline to behave like a backend whose context went
/// away: every call then fails with [`StorageError::Unavailable`].
#[derive(Debug)]
pub struct MemoryBackend {
    value: Mutex<Option<String>>,
    available: AtomicBool,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            value: Mutex::new(None),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryBackend {
    /// An empty, reachable slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// A reachable slot already holding `value`.
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
            available: AtomicBool::new(true),
        }
    }

    /// Take the slot offline or bring it back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Whether calls currently succeed.
    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Current value regardless of availability.
    pub fn peek(&self) -> Option<String> {
        self.value.lock().ok().and_then(|v| v.clone())
    }

    fn check(&self) -> Result<()> {
        if self.is_available() {
            Ok(())
        } else {
            Err(StorageError::Unavailable("backend offline".into()))
        }
    }
}

#[async_trait]
impl TemplateBackend for MemoryBackend {
    async fn load(&self) -> Result<Option<String>> {
        self.check()?;
        let guard = self
            .value
            .lock()
            .map_err(|_| StorageError::Unavailable("memory slot poisoned".into()))?;
        Ok(guard.clone())
    }

    async fn store(&self, value: &str) -> Result<()> {
        self.check()?;
        let mut guard = self
            .value
            .lock()
            .map_err(|_| StorageError::Unavailable("memory slot poisoned".into()))?;
        *guard = Some(value.to_string());
        Ok(())
    }
}
