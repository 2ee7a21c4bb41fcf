//! Event loop of one page instance.

use crate::handler::{NameSelection, NameSelectionHandler};
use salute_bus::PortReceiver;
use salute_events::{Ack, PageMessage};
use salute_template::Template;
use tokio::sync::{mpsc, oneshot};

struct SelectRequest {
    name: String,
    reply: Option<oneshot::Sender<NameSelection>>,
}

/// Feeds user selections into a running page.
#[derive(Clone)]
pub struct PageController {
    tx: mpsc::Sender<SelectRequest>,
}

impl PageController {
    /// Select a name and wait for the outcome. `None` if the page is gone.
    pub async fn select(&self, name: impl Into<String>) -> Option<NameSelection> {
        let (reply, rx) = oneshot::channel();
        let request = SelectRequest {
            name: name.into(),
            reply: Some(reply),
        };
        self.tx.send(request).await.ok()?;
        rx.await.ok()
    }

    /// Queue a selection without waiting for it.
    pub fn click(&self, name: impl Into<String>) -> bool {
        self.tx
            .try_send(SelectRequest {
                name: name.into(),
                reply: None,
            })
            .is_ok()
    }
}

/// One page: a handler plus its two inputs, template pushes from the
/// coordinator and user selections.
pub struct PageInstance {
    handler: NameSelectionHandler,
    inbox: PortReceiver<PageMessage>,
    selections: mpsc::Receiver<SelectRequest>,
}

impl PageInstance {
    /// Page loop over `inbox`, plus the controller that feeds it selections.
    pub fn new(
        handler: NameSelectionHandler,
        inbox: PortReceiver<PageMessage>,
        capacity: usize,
    ) -> (Self, PageController) {
        let (tx, selections) = mpsc::channel(capacity.max(1));
        (
            Self {
                handler,
                inbox,
                selections,
            },
            PageController { tx },
        )
    }

    /// Initialize, then handle messages one at a time until the page is
    /// closed or every controller is dropped. Returns the handler so its
    /// final state can be inspected.
    pub async fn run(mut self) -> NameSelectionHandler {
        self.handler.initialize().await;
        let page = self.handler.page();

        loop {
            tokio::select! {
                // Pending template pushes go first so the next selection
                // sees them.
                biased;

                envelope = self.inbox.recv() => {
                    let Some(envelope) = envelope else {
                        tracing::debug!(%page, "Page closed");
                        break;
                    };
                    let (_, message, responder) = envelope.into_parts();
                    match message {
                        PageMessage::UpdateTemplate { template } => {
                            self.handler.apply_update(Template::new(template)).await;
                        }
                    }
                    responder.respond(Ack::Received);
                }
                request = self.selections.recv() => {
                    let Some(request) = request else {
                        tracing::debug!(%page, "No more selections");
                        break;
                    };
                    let selection = self.handler.select(&request.name).await;
                    if let Some(reply) = request.reply {
                        let _ = reply.send(selection);
                    }
                }
            }
        }
        self.handler
    }
}
