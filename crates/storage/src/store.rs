//! Fallback chain over the primary store and the local cache.

use crate::{BackendRef, Result};
use salute_template::{Direction, Template};

/// Template store over a primary backend and an optional local cache.
#[derive(Clone)]
pub struct TemplateStore {
    primary: BackendRef,
    secondary: Option<BackendRef>,
}

impl TemplateStore {
    /// Store with only the durable backend (the coordinator's view).
    pub fn new(primary: BackendRef) -> Self {
        Self {
            primary,
            secondary: None,
        }
    }

    /// Store with a durable backend and a local cache (a page's view).
    pub fn with_cache(primary: BackendRef, secondary: BackendRef) -> Self {
        Self {
            primary,
            secondary: Some(secondary),
        }
    }

    /// Resolve the template: primary, then local cache, then the built-in
    /// default for `direction`. A primary hit is mirrored into the cache.
    pub async fn get(&self, direction: Direction) -> Template {
        match self.load_fresh().await {
            Some(template) => template,
            None => {
                tracing::debug!(%direction, "No stored template, using built-in default");
                Template::default_for(direction)
            }
        }
    }

    /// Primary, then local cache. `None` when neither holds a value.
    pub async fn load_fresh(&self) -> Option<Template> {
        match self.load_primary().await {
            Ok(Some(template)) => {
                self.mirror(&template).await;
                return Some(template);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Primary template store unreachable, trying local cache");
            }
        }
        self.load_secondary().await
    }

    /// Read the primary only. Empty values count as absent.
    pub async fn load_primary(&self) -> Result<Option<Template>> {
        let value = self.primary.load().await?;
        Ok(value.filter(|v| !v.is_empty()).map(Template::new))
    }

    async fn load_secondary(&self) -> Option<Template> {
        let secondary = self.secondary.as_ref()?;
        match secondary.load().await {
            Ok(value) => value.filter(|v| !v.is_empty()).map(Template::new),
            Err(e) => {
                tracing::warn!(error = %e, "Local template cache unreachable");
                None
            }
        }
    }

    /// Write the primary. Failures are logged and returned; nothing retries.
    pub async fn set(&self, template: &Template) -> Result<()> {
        self.primary.store(template.as_str()).await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to persist template");
            e
        })
    }

    /// Write the local cache, if there is one. Failures are only logged.
    pub async fn mirror(&self, template: &Template) {
        let Some(secondary) = &self.secondary else {
            return;
        };
        if let Err(e) = secondary.store(template.as_str()).await {
            tracing::warn!(error = %e, "Failed to mirror template into local cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryBackend, TemplateBackend};
    use std::sync::Arc;

    fn pair() -> (Arc<MemoryBackend>, Arc<MemoryBackend>, TemplateStore) {
        let primary = Arc::new(MemoryBackend::new());
        let secondary = Arc::new(MemoryBackend::new());
        let store = TemplateStore::with_cache(primary.clone(), secondary.clone());
        (primary, secondary, store)
    }

    #[tokio::test]
    async fn test_set_then_get_round_trip() {
        let (_, _, store) = pair();
        let template = Template::new("Hello <name>!");

        store.set(&template).await.unwrap();

        assert_eq!(store.get(Direction::Ltr).await, template);
    }

    #[tokio::test]
    async fn test_primary_hit_is_mirrored() {
        let (primary, secondary, store) = pair();
        primary.store("Hi <name>").await.unwrap();

        store.get(Direction::Ltr).await;

        assert_eq!(secondary.peek(), Some("Hi <name>".to_string()));
    }

    #[tokio::test]
    async fn test_primary_down_uses_mirrored_cache() {
        let (primary, _, store) = pair();
        let template = Template::new("Cached <name>");
        store.set(&template).await.unwrap();
        store.get(Direction::Ltr).await;

        primary.set_available(false);

        assert_eq!(store.get(Direction::Ltr).await, template);
    }

    #[tokio::test]
    async fn test_everything_empty_gives_direction_default() {
        let (primary, _, store) = pair();
        primary.set_available(false);

        assert_eq!(
            store.get(Direction::Rtl).await,
            Template::default_for(Direction::Rtl)
        );
        assert_eq!(
            store.get(Direction::Ltr).await,
            Template::default_for(Direction::Ltr)
        );
    }

    #[tokio::test]
    async fn test_empty_primary_value_falls_through() {
        let (primary, secondary, store) = pair();
        primary.store("").await.unwrap();
        secondary.store("From cache <n>").await.unwrap();

        assert_eq!(store.get(Direction::Ltr).await.as_str(), "From cache <n>");
    }

    #[tokio::test]
    async fn test_set_failure_is_returned() {
        let (primary, _, store) = pair();
        primary.set_available(false);

        assert!(store.set(&Template::new("x")).await.is_err());
    }

    #[tokio::test]
    async fn test_store_without_cache() {
        let primary = Arc::new(MemoryBackend::new());
        let store = TemplateStore::new(primary.clone());
        primary.set_available(false);

        assert_eq!(store.load_fresh().await, None);
        // Mirroring without a cache is a no-op.
        store.mirror(&Template::new("x")).await;
    }
}
