//! Message ports between isolated contexts.
//!
//! Every context (coordinator, page, settings) owns the receiving end of a
//! bounded channel. Senders never block: a full or closed port is reported
//! as a [`TransportError`] and it is up to the caller to log and move on.
//!
//! Requests carry a one-shot reply slot and wait at most a response timeout
//! for the acknowledgment. Anything that takes longer must be acknowledged
//! first and delivered later as a separate message.

use salute_events::{Ack, Origin};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Default number of envelopes a port buffers.
pub const DEFAULT_PORT_CAPACITY: usize = 32;

/// How long a requester waits for an acknowledgment.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The receiving context is gone.
    #[error("receiving end closed")]
    Closed,
    /// The receiving context is not keeping up.
    #[error("port full")]
    Full,
    /// No acknowledgment within the response timeout.
    #[error("no response within {0:?}")]
    Timeout(Duration),
    /// The receiver dropped the request without acknowledging it.
    #[error("request dropped without response")]
    NoResponse,
}

pub type Result<T> = std::result::Result<T, TransportError>;

/// Reply slot of a request. Dropping it unanswered yields
/// [`TransportError::NoResponse`] on the requesting side.
#[derive(Debug, Default)]
pub struct Responder {
    tx: Option<oneshot::Sender<Ack>>,
}

impl Responder {
    /// Whether the sender is waiting for an answer.
    pub fn is_expected(&self) -> bool {
        self.tx.is_some()
    }

    /// Send the acknowledgment. A requester that already gave up is fine.
    pub fn respond(mut self, ack: Ack) {
        if let Some(tx) = self.tx.take() {
            if tx.send(ack).is_err() {
                tracing::debug!(?ack, "Requester went away before acknowledgment");
            }
        }
    }
}

/// A message with its origin and optional reply slot.
#[derive(Debug)]
pub struct Envelope<M> {
    pub origin: Origin,
    pub message: M,
    responder: Responder,
}

impl<M> Envelope<M> {
    /// A notification: nobody waits for an answer.
    pub fn new(origin: Origin, message: M) -> Self {
        Self {
            origin,
            message,
            responder: Responder::default(),
        }
    }

    /// Split into origin, message and reply slot.
    pub fn into_parts(self) -> (Origin, M, Responder) {
        (self.origin, self.message, self.responder)
    }
}

/// Sending half of a port.
pub struct PortSender<M> {
    tx: mpsc::Sender<Envelope<M>>,
    failed_deliveries: Arc<AtomicU64>,
}

impl<M> Clone for PortSender<M> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            failed_deliveries: Arc::clone(&self.failed_deliveries),
        }
    }
}

impl<M> std::fmt::Debug for PortSender<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortSender")
            .field("closed", &self.tx.is_closed())
            .field("failed_deliveries", &self.failed_deliveries())
            .finish()
    }
}

impl<M> PortSender<M> {
    /// Fire-and-forget delivery.
    pub fn send(&self, origin: Origin, message: M) -> Result<()> {
        self.deliver(Envelope::new(origin, message))
    }

    /// Deliver and wait for the acknowledgment, at most `timeout`.
    pub async fn request(&self, origin: Origin, message: M, timeout: Duration) -> Result<Ack> {
        let (tx, rx) = oneshot::channel();
        let envelope = Envelope {
            origin,
            message,
            responder: Responder { tx: Some(tx) },
        };
        self.deliver(envelope)?;

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(ack)) => Ok(ack),
            Ok(Err(_)) => Err(TransportError::NoResponse),
            Err(_) => Err(TransportError::Timeout(timeout)),
        }
    }

    fn deliver(&self, envelope: Envelope<M>) -> Result<()> {
        match self.tx.try_send(envelope) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                let failed = self.failed_deliveries.fetch_add(1, Ordering::Relaxed) + 1;
                // Rate-limit logging: a stuck receiver would flood otherwise
                if failed % 10 == 1 {
                    tracing::warn!(failed, "Port full, dropping message");
                }
                Err(TransportError::Full)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.failed_deliveries.fetch_add(1, Ordering::Relaxed);
                Err(TransportError::Closed)
            }
        }
    }

    /// Number of messages that could not be delivered.
    pub fn failed_deliveries(&self) -> u64 {
        self.failed_deliveries.load(Ordering::Relaxed)
    }

    /// Whether the receiving context is gone.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half of a port.
#[derive(Debug)]
pub struct PortReceiver<M> {
    rx: mpsc::Receiver<Envelope<M>>,
}

impl<M> PortReceiver<M> {
    /// Wait for the next envelope. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<Envelope<M>> {
        self.rx.recv().await
    }

    /// Take a queued envelope without waiting.
    pub fn try_recv(&mut self) -> Option<Envelope<M>> {
        self.rx.try_recv().ok()
    }
}

/// Create a port with room for `capacity` envelopes.
pub fn channel<M>(capacity: usize) -> (PortSender<M>, PortReceiver<M>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        PortSender {
            tx,
            failed_deliveries: Arc::new(AtomicU64::new(0)),
        },
        PortReceiver { rx },
    )
}
