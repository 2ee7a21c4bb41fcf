//! Template persistence.
//!
//! Two independent key-value slots hold the greeting template:
//! - a durable primary backend shared by every context (SQLite),
//! - a local cache owned by one page, consulted only when the primary is
//!   unreachable.
//!
//! [`TemplateStore`] layers the fallback chain on top of any pair of
//! [`TemplateBackend`]s.

mod database;
mod memory;
mod store;

pub use database::Database;
pub use memory::MemoryBackend;
pub use store::TemplateStore;

use async_trait::async_trait;
use std::sync::Arc;

/// Key under which the template is stored in every backend.
pub const TEMPLATE_KEY: &str = "greeting_template";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// One key-value slot holding the template string.
#[async_trait]
pub trait TemplateBackend: Send + Sync {
    /// Read the stored value. `Ok(None)` means nothing was ever written.
    async fn load(&self) -> Result<Option<String>>;

    /// Overwrite the stored value.
    async fn store(&self, value: &str) -> Result<()>;
}

/// Shared backend reference.
pub type BackendRef = Arc<dyn TemplateBackend>;
