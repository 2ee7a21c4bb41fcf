//! Background relay that keeps every open page's greeting template in sync.
//!
//! The coordinator answers template requests from pages, persists edits from
//! the settings surface and pushes them to all open pages, and forwards
//! name-click notifications to whoever observes them.

mod coordinator;
mod tabs;

pub use coordinator::{Coordinator, CoordinatorHandle};
pub use tabs::{BroadcastReport, Tabs};
