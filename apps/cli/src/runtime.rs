//! Wires the contexts together: one coordinator, any number of pages and
//! the settings surface, all sharing the primary template store.

use crate::config::Config;
use crate::settings::SettingsSurface;
use anyhow::{Context, Result};
use salute_coordinator::{Coordinator, CoordinatorHandle, Tabs};
use salute_events::{BroadcastEventBus, PageId};
use salute_page::{
    ClipboardWriter, FeedbackOverlay, NameSelectionHandler, PageController, PageInstance,
};
use salute_storage::{BackendRef, Database, MemoryBackend, TemplateStore};
use salute_template::Direction;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

pub struct Runtime {
    config: Config,
    primary: BackendRef,
    tabs: Tabs,
    events: Arc<BroadcastEventBus>,
    coordinator: CoordinatorHandle,
    coordinator_task: JoinHandle<()>,
}

/// A running page and the handles to drive and observe it.
pub struct OpenPage {
    pub id: PageId,
    pub controller: PageController,
    pub feedback: Arc<FeedbackOverlay>,
    pub cache: Arc<MemoryBackend>,
    pub task: JoinHandle<NameSelectionHandler>,
}

impl Runtime {
    /// Open the database named by the config and start the coordinator.
    pub async fn start(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("Failed to create data dir {}", config.data_dir.display())
        })?;
        let path = config.database_path();
        let db = Database::open(&path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Opened template database");
        Ok(Self::with_backend(Arc::new(db), config).await)
    }

    /// Start the coordinator over any primary backend.
    pub async fn with_backend(primary: BackendRef, config: Config) -> Self {
        let tabs = Tabs::new(config.port_capacity);
        let events = Arc::new(BroadcastEventBus::default());
        let (coordinator, handle) = Coordinator::new(
            primary.clone(),
            tabs.clone(),
            events.clone(),
            config.port_capacity,
        );
        coordinator.on_installed().await;
        let coordinator_task = coordinator.spawn();

        Self {
            coordinator: handle.with_response_timeout(config.response_timeout()),
            config,
            primary,
            tabs,
            events,
            coordinator_task,
        }
    }

    /// Settings the runtime was started with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registry of the open pages.
    pub fn tabs(&self) -> &Tabs {
        &self.tabs
    }

    /// A settings surface over the shared store.
    pub fn settings(&self) -> SettingsSurface {
        SettingsSurface::new(
            TemplateStore::new(self.primary.clone()),
            self.coordinator.clone(),
            self.events.clone(),
        )
    }

    /// Open a page and start its event loop.
    pub fn open_page(&self, direction: Direction, clipboard: Arc<dyn ClipboardWriter>) -> OpenPage {
        let (id, inbox) = self.tabs.open();
        let cache = Arc::new(MemoryBackend::new());
        let feedback = Arc::new(FeedbackOverlay::new(self.config.feedback_dismiss()));
        let handler = NameSelectionHandler::new(
            id,
            direction,
            TemplateStore::with_cache(self.primary.clone(), cache.clone()),
            clipboard,
            feedback.clone(),
            self.coordinator.clone(),
        );
        let (instance, controller) = PageInstance::new(handler, inbox, self.config.port_capacity);
        tracing::debug!(page = %id, %direction, "Starting page");

        OpenPage {
            id,
            controller,
            feedback,
            cache,
            task: tokio::spawn(instance.run()),
        }
    }

    /// Close every page and stop the coordinator.
    ///
    /// The coordinator stops once every handle is gone; handles still held
    /// elsewhere only delay this up to [`SHUTDOWN_GRACE`].
    pub async fn shutdown(self) {
        for page in self.tabs.ids() {
            self.tabs.close(page);
        }
        drop(self.coordinator);
        match tokio::time::timeout(SHUTDOWN_GRACE, self.coordinator_task).await {
            Ok(Ok(())) => tracing::debug!("Coordinator stopped"),
            Ok(Err(e)) => tracing::warn!(error = %e, "Coordinator task ended abnormally"),
            Err(_) => tracing::debug!("Coordinator still referenced, leaving it running"),
        }
    }
}
