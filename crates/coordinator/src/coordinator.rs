//! The single long-lived relay.
//!
//! Owns no template state of its own: every read goes to the primary store.
//! Envelopes are acknowledged one at a time in arrival order, without ever
//! waiting on storage. Reads and writes go to a store worker that runs them
//! in the same order, so a template pushed to a page is never older than
//! one broadcast before it.

use crate::tabs::Tabs;
use salute_bus::{PortReceiver, PortSender, Responder, TransportError, DEFAULT_RESPONSE_TIMEOUT};
use salute_events::{
    event_names, Ack, EventBusRef, NameClickedEvent, Origin, PageId, PageMessage, RuntimeMessage,
};
use salute_storage::{BackendRef, TemplateStore};
use salute_template::{Direction, Template};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Storage work taken off the message loop.
#[derive(Debug)]
enum StoreJob {
    /// Read the primary and push the value to one page.
    Push(PageId),
    /// Persist, then broadcast to every open page.
    Update(Template),
}

pub struct Coordinator {
    store: TemplateStore,
    tabs: Tabs,
    events: EventBusRef,
    inbox: PortReceiver<RuntimeMessage>,
}

impl Coordinator {
    /// Build the coordinator and the handle other contexts use to reach it.
    ///
    /// The coordinator keeps no sender of its own, so its loop ends once
    /// every handle is dropped.
    pub fn new(
        primary: BackendRef,
        tabs: Tabs,
        events: EventBusRef,
        capacity: usize,
    ) -> (Self, CoordinatorHandle) {
        let (port, inbox) = salute_bus::channel(capacity);
        let coordinator = Self {
            store: TemplateStore::new(primary),
            tabs,
            events,
            inbox,
        };
        (coordinator, CoordinatorHandle::new(port))
    }

    /// Seed the primary store with the left-to-right default if it holds
    /// nothing. Returns true when the default was written.
    pub async fn on_installed(&self) -> bool {
        match self.store.load_primary().await {
            Ok(Some(_)) => false,
            Ok(None) => {
                let template = Template::default_for(Direction::Ltr);
                match self.store.set(&template).await {
                    Ok(()) => {
                        tracing::info!("Seeded default greeting template");
                        true
                    }
                    Err(_) => false,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not check stored template on install");
                false
            }
        }
    }

    /// Run the loop on its own task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Handle envelopes until every handle is dropped, then let the store
    /// worker finish what was already accepted.
    pub async fn run(mut self) {
        tracing::debug!("Coordinator started");
        let (jobs, queue) = mpsc::unbounded_channel();
        let worker = tokio::spawn(store_worker(self.store.clone(), self.tabs.clone(), queue));

        while let Some(envelope) = self.inbox.recv().await {
            let (origin, message, responder) = envelope.into_parts();
            tracing::debug!(%origin, action = message.action(), "Coordinator received message");
            let job = match message {
                RuntimeMessage::GetTemplate => Self::handle_get_template(origin, responder),
                RuntimeMessage::TemplateUpdated { template } => {
                    Self::handle_template_updated(Template::new(template), responder)
                }
                RuntimeMessage::NameClicked(event) => {
                    self.handle_name_clicked(event, responder);
                    None
                }
            };
            if let Some(job) = job {
                if jobs.send(job).is_err() {
                    tracing::warn!("Store worker gone, dropping storage work");
                }
            }
        }

        drop(jobs);
        if let Err(e) = worker.await {
            tracing::warn!(error = %e, "Store worker ended abnormally");
        }
        tracing::debug!("Coordinator stopped, all handles dropped");
    }

    /// Acknowledge right away; the stored template follows as a push.
    fn handle_get_template(origin: Origin, responder: Responder) -> Option<StoreJob> {
        responder.respond(Ack::Processing);

        let Some(page) = origin.page() else {
            tracing::debug!(%origin, "Template request without a page to answer");
            return None;
        };
        Some(StoreJob::Push(page))
    }

    /// Acknowledge right away; persisting and broadcasting follow.
    fn handle_template_updated(template: Template, responder: Responder) -> Option<StoreJob> {
        responder.respond(Ack::Received);

        if template.is_empty() {
            tracing::debug!("Ignoring empty template update");
            return None;
        }
        Some(StoreJob::Update(template))
    }

    fn handle_name_clicked(&self, event: NameClickedEvent, responder: Responder) {
        match serde_json::to_value(&event) {
            Ok(payload) => {
                if let Err(e) = self.events.emit(event_names::NAME_CLICKED, payload) {
                    tracing::debug!(error = %e, name = %event.name, "Name click not observed");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize name click"),
        }
        responder.respond(Ack::Received);
    }
}

async fn store_worker(
    store: TemplateStore,
    tabs: Tabs,
    mut queue: mpsc::UnboundedReceiver<StoreJob>,
) {
    while let Some(job) = queue.recv().await {
        match job {
            StoreJob::Push(page) => push_stored(&store, &tabs, page).await,
            StoreJob::Update(template) => {
                // A failed write is logged by the store; pages still get the update.
                let _ = store.set(&template).await;

                let report = tabs.broadcast(&PageMessage::UpdateTemplate {
                    template: template.into_string(),
                });
                tracing::info!(
                    delivered = report.delivered_count(),
                    failed = report.failed_count(),
                    "Broadcast template update"
                );
            }
        }
    }
}

async fn push_stored(store: &TemplateStore, tabs: &Tabs, page: PageId) {
    match store.load_primary().await {
        Ok(Some(template)) => {
            let message = PageMessage::UpdateTemplate {
                template: template.into_string(),
            };
            if let Err(e) = tabs.send_to(page, message) {
                tracing::debug!(%page, error = %e, "Could not deliver template to page");
            }
        }
        // Nothing stored: the page keeps what it resolved itself.
        Ok(None) => tracing::debug!(%page, "No stored template to push"),
        Err(e) => tracing::warn!(%page, error = %e, "Failed to read stored template"),
    }
}

/// How pages and the settings surface reach the coordinator.
#[derive(Clone, Debug)]
pub struct CoordinatorHandle {
    port: PortSender<RuntimeMessage>,
    response_timeout: Duration,
}

impl CoordinatorHandle {
    /// Wrap the coordinator's port with the default response timeout.
    pub fn new(port: PortSender<RuntimeMessage>) -> Self {
        Self {
            port,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }

    /// Wait at most `timeout` for acknowledgments.
    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Send and wait for the acknowledgment.
    pub async fn request(
        &self,
        origin: Origin,
        message: RuntimeMessage,
    ) -> Result<Ack, TransportError> {
        self.port
            .request(origin, message, self.response_timeout)
            .await
    }

    /// Send without waiting for anything.
    pub fn notify(&self, origin: Origin, message: RuntimeMessage) -> Result<(), TransportError> {
        self.port.send(origin, message)
    }
}
