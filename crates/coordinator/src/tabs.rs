//! Registry of open pages.
//!
//! This is the platform's view of which pages exist, shared between whoever
//! opens and closes pages and the coordinator that broadcasts to them. A
//! registered page whose receiver is gone (navigated away, no listener)
//! simply fails delivery.

use salute_bus::{PortReceiver, PortSender, TransportError, DEFAULT_PORT_CAPACITY};
use salute_events::{Origin, PageId, PageMessage};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Default)]
struct TabsInner {
    pages: BTreeMap<PageId, PortSender<PageMessage>>,
    next_id: u64,
}

/// Shared registry of open pages and their inbound ports.
#[derive(Clone)]
pub struct Tabs {
    inner: Arc<Mutex<TabsInner>>,
    capacity: usize,
}

impl Default for Tabs {
    fn default() -> Self {
        Self::new(DEFAULT_PORT_CAPACITY)
    }
}

impl Tabs {
    /// Empty registry whose page ports buffer `capacity` messages.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(TabsInner::default())),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TabsInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open a new page and return its id and inbound port.
    pub fn open(&self) -> (PageId, PortReceiver<PageMessage>) {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = PageId(inner.next_id);
        let (tx, rx) = salute_bus::channel(self.capacity);
        inner.pages.insert(id, tx);
        tracing::debug!(page = %id, "Page opened");
        (id, rx)
    }

    /// Close a page. Returns false if it was not open.
    pub fn close(&self, page: PageId) -> bool {
        let removed = self.lock().pages.remove(&page).is_some();
        if removed {
            tracing::debug!(%page, "Page closed");
        }
        removed
    }

    /// Ids of the open pages, oldest first.
    pub fn ids(&self) -> Vec<PageId> {
        self.lock().pages.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().pages.is_empty()
    }

    /// Deliver to one page.
    pub fn send_to(&self, page: PageId, message: PageMessage) -> Result<(), TransportError> {
        let sender = self.lock().pages.get(&page).cloned();
        match sender {
            Some(sender) => sender.send(Origin::Coordinator, message),
            None => Err(TransportError::Closed),
        }
    }

    /// Deliver to every open page. Each failure is recorded and skipped.
    pub fn broadcast(&self, message: &PageMessage) -> BroadcastReport {
        // Snapshot so no lock is held while sending.
        let targets: Vec<(PageId, PortSender<PageMessage>)> = self
            .lock()
            .pages
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect();

        let mut report = BroadcastReport::default();
        for (page, sender) in targets {
            match sender.send(Origin::Coordinator, message.clone()) {
                Ok(()) => report.delivered.push(page),
                Err(e) => {
                    tracing::debug!(%page, error = %e, "Could not update template in page");
                    report.failed.push((page, e));
                }
            }
        }
        report
    }
}

/// Outcome of a broadcast.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: Vec<PageId>,
    pub failed: Vec<(PageId, TransportError)>,
}

impl BroadcastReport {
    /// Pages the message reached.
    pub fn delivered_count(&self) -> usize {
        self.delivered.len()
    }

    /// Pages that could not take the message.
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(text: &str) -> PageMessage {
        PageMessage::UpdateTemplate {
            template: text.to_string(),
        }
    }

    #[test]
    fn test_open_assigns_distinct_ids() {
        let tabs = Tabs::default();
        let (a, _ra) = tabs.open();
        let (b, _rb) = tabs.open();

        assert_ne!(a, b);
        assert_eq!(tabs.ids(), vec![a, b]);
    }

    #[test]
    fn test_close() {
        let tabs = Tabs::default();
        let (a, _ra) = tabs.open();

        assert!(tabs.close(a));
        assert!(!tabs.close(a));
        assert!(tabs.is_empty());
    }

    #[test]
    fn test_broadcast_skips_unreachable_pages() {
        let tabs = Tabs::default();
        let mut receivers = Vec::new();
        for _ in 0..5 {
            receivers.push(tabs.open());
        }
        // Two pages lose their listener.
        let (gone_a, rx) = receivers.remove(1);
        drop(rx);
        let (gone_b, rx) = receivers.remove(2);
        drop(rx);

        let report = tabs.broadcast(&update("Hi <name>"));

        assert_eq!(report.delivered_count(), 3);
        assert_eq!(report.failed_count(), 2);
        let failed: Vec<PageId> = report.failed.iter().map(|(id, _)| *id).collect();
        assert_eq!(failed, vec![gone_a, gone_b]);

        for (_, rx) in receivers.iter_mut() {
            let envelope = rx.try_recv().expect("live page should receive update");
            assert_eq!(envelope.message, update("Hi <name>"));
        }
    }

    #[test]
    fn test_broadcast_with_no_pages() {
        let tabs = Tabs::default();
        let report = tabs.broadcast(&update("x"));
        assert_eq!(report, BroadcastReport::default());
    }

    #[test]
    fn test_send_to_unknown_page() {
        let tabs = Tabs::default();
        assert_eq!(
            tabs.send_to(PageId(42), update("x")),
            Err(TransportError::Closed)
        );
    }
}
