//! Name selection: the per-page state behind every click.

use crate::clipboard::ClipboardWriter;
use crate::feedback::{ClipboardStatus, FeedbackOverlay};
use salute_coordinator::CoordinatorHandle;
use salute_events::{NameClickedEvent, Origin, PageId, RuntimeMessage};
use salute_storage::TemplateStore;
use salute_template::{Direction, Template};
use std::sync::Arc;

/// Outcome of one selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameSelection {
    pub name: String,
    pub template: Template,
    pub message: String,
    pub copied: bool,
}

pub struct NameSelectionHandler {
    page: PageId,
    direction: Direction,
    store: TemplateStore,
    clipboard: Arc<dyn ClipboardWriter>,
    feedback: Arc<FeedbackOverlay>,
    coordinator: CoordinatorHandle,
    /// Last known template. Starts at the direction's default until
    /// [`initialize`](Self::initialize) resolves the stored one.
    cached: Template,
}

impl NameSelectionHandler {
    /// Handler for one page. Nothing is read until [`initialize`](Self::initialize).
    pub fn new(
        page: PageId,
        direction: Direction,
        store: TemplateStore,
        clipboard: Arc<dyn ClipboardWriter>,
        feedback: Arc<FeedbackOverlay>,
        coordinator: CoordinatorHandle,
    ) -> Self {
        Self {
            page,
            direction,
            store,
            clipboard,
            feedback,
            coordinator,
            cached: Template::default_for(direction),
        }
    }

    pub fn page(&self) -> PageId {
        self.page
    }

    /// Template the next selection falls back to when storage is down.
    pub fn cached_template(&self) -> &Template {
        &self.cached
    }

    /// The page's feedback overlay.
    pub fn feedback(&self) -> &Arc<FeedbackOverlay> {
        &self.feedback
    }

    /// Resolve the cache from storage, then ask the coordinator for the
    /// current template. The answer arrives later as an update push.
    pub async fn initialize(&mut self) {
        self.cached = self.store.get(self.direction).await;
        tracing::debug!(page = %self.page, direction = %self.direction, "Template cache initialized");

        let coordinator = self.coordinator.clone();
        let origin = Origin::Page(self.page);
        // Fire-and-forget: the coordinator may be gone; the page keeps working.
        tokio::spawn(async move {
            match coordinator
                .request(origin, RuntimeMessage::GetTemplate)
                .await
            {
                Ok(ack) => tracing::trace!(%origin, ?ack, "Template request acknowledged"),
                Err(e) => tracing::debug!(%origin, error = %e, "Template request failed"),
            }
        });
    }

    /// Handle one selected name end to end.
    pub async fn select(&mut self, name: &str) -> NameSelection {
        let template = self.resolve().await;
        let message = template.render(name);

        let copied = self.clipboard.write_text(&message).await;
        self.feedback
            .show(name, ClipboardStatus::from_copied(copied));

        let event = NameClickedEvent::new(name, message.clone(), copied);
        // Informational only; a missing coordinator changes nothing here.
        if let Err(e) = self
            .coordinator
            .notify(Origin::Page(self.page), RuntimeMessage::NameClicked(event))
        {
            tracing::debug!(page = %self.page, error = %e, "Could not report name click");
        }

        tracing::debug!(page = %self.page, name, copied, "Name selected");
        NameSelection {
            name: name.to_string(),
            template,
            message,
            copied,
        }
    }

    /// Replace the cached template with one pushed by the coordinator.
    /// An empty push carries no template and is ignored.
    pub async fn apply_update(&mut self, template: Template) {
        if template.is_empty() {
            tracing::debug!(page = %self.page, "Ignoring empty template push");
            return;
        }
        self.store.mirror(&template).await;
        tracing::debug!(page = %self.page, "Template cache updated");
        self.cached = template;
    }

    /// Freshest stored template, else the cached one. The cache follows.
    async fn resolve(&mut self) -> Template {
        if let Some(fresh) = self.store.load_fresh().await {
            self.cached = fresh;
        }
        self.cached.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::{FallbackClipboard, MemoryClipboard};
    use salute_coordinator::{Coordinator, Tabs};
    use salute_events::NullEventBus;
    use salute_storage::{MemoryBackend, TemplateBackend};

    struct Fixture {
        primary: Arc<MemoryBackend>,
        cache: Arc<MemoryBackend>,
        clipboard: Arc<MemoryClipboard>,
        handler: NameSelectionHandler,
    }

    /// Handler wired to a coordinator whose loop is not running.
    fn fixture(direction: Direction) -> (Fixture, Coordinator) {
        let primary = Arc::new(MemoryBackend::new());
        let cache = Arc::new(MemoryBackend::new());
        let clipboard = Arc::new(MemoryClipboard::new());
        let (coordinator, handle) =
            Coordinator::new(primary.clone(), Tabs::default(), Arc::new(NullEventBus), 8);
        let handler = NameSelectionHandler::new(
            PageId(1),
            direction,
            TemplateStore::with_cache(primary.clone(), cache.clone()),
            Arc::new(FallbackClipboard::new(clipboard.clone(), None)),
            Arc::new(FeedbackOverlay::default()),
            handle,
        );
        (
            Fixture {
                primary,
                cache,
                clipboard,
                handler,
            },
            coordinator,
        )
    }

    #[tokio::test]
    async fn test_cache_starts_at_direction_default() {
        let (fx, _coordinator) = fixture(Direction::Rtl);
        assert_eq!(
            fx.handler.cached_template(),
            &Template::default_for(Direction::Rtl)
        );
    }

    #[tokio::test]
    async fn test_select_renders_copies_and_shows_feedback() {
        let (mut fx, _coordinator) = fixture(Direction::Ltr);
        fx.primary.store("Hello <name>!").await.unwrap();

        let selection = fx.handler.select("Maria").await;

        assert_eq!(selection.message, "Hello Maria!");
        assert!(selection.copied);
        assert_eq!(fx.clipboard.last().as_deref(), Some("Hello Maria!"));
        let view = fx.handler.feedback().current();
        assert!(view.visible);
        assert_eq!(view.name, "Maria");
        assert_eq!(view.status, Some(ClipboardStatus::Copied));
    }

    #[tokio::test]
    async fn test_clipboard_failure_is_reported_in_feedback() {
        let (mut fx, _coordinator) = fixture(Direction::Ltr);
        fx.clipboard.set_failing(true);

        let selection = fx.handler.select("Sam").await;

        assert!(!selection.copied);
        assert_eq!(
            fx.handler.feedback().current().status,
            Some(ClipboardStatus::Failed)
        );
    }

    #[tokio::test]
    async fn test_select_uses_cache_when_storage_is_down() {
        let (mut fx, _coordinator) = fixture(Direction::Ltr);
        fx.handler.apply_update(Template::new("Pushed <name>")).await;
        fx.primary.set_available(false);
        fx.cache.set_available(false);

        let selection = fx.handler.select("Noa").await;
        assert_eq!(selection.message, "Pushed Noa");
    }

    #[tokio::test]
    async fn test_apply_update_mirrors_into_cache() {
        let (mut fx, _coordinator) = fixture(Direction::Ltr);

        fx.handler.apply_update(Template::new("New <name>")).await;

        assert_eq!(fx.handler.cached_template().as_str(), "New <name>");
        assert_eq!(fx.cache.peek().as_deref(), Some("New <name>"));
        // The shared store is the coordinator's to write.
        assert_eq!(fx.primary.peek(), None);
    }

    #[tokio::test]
    async fn test_empty_update_keeps_cache() {
        let (mut fx, _coordinator) = fixture(Direction::Ltr);
        fx.handler.apply_update(Template::new("Dear <name>, hi")).await;

        fx.handler.apply_update(Template::new("")).await;

        assert_eq!(fx.handler.cached_template().as_str(), "Dear <name>, hi");
        assert_eq!(fx.cache.peek().as_deref(), Some("Dear <name>, hi"));
        fx.primary.set_available(false);
        assert_eq!(fx.handler.select("Sam").await.message, "Dear Sam, hi");
    }

    #[tokio::test]
    async fn test_select_survives_missing_coordinator() {
        let (mut fx, coordinator) = fixture(Direction::Ltr);
        drop(coordinator);

        let selection = fx.handler.select("Maria").await;
        assert!(selection.copied);
    }

    #[tokio::test]
    async fn test_initialize_reads_storage() {
        let (mut fx, _coordinator) = fixture(Direction::Ltr);
        fx.cache.store("Cached <n>").await.unwrap();
        fx.primary.set_available(false);

        fx.handler.initialize().await;
        assert_eq!(fx.handler.cached_template().as_str(), "Cached <n>");
    }
}
