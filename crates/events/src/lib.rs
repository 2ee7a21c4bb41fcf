//! Shared message contracts for cross-context communication.
//!
//! The coordinator, every page instance and the settings surface only talk
//! through these types. Each message kind has a fixed payload shape and is
//! dispatched by exhaustive matching; the serde representation keeps the
//! `action` tag so the messages stay readable in logs.
//!
//! Also provides the `EventBus` trait the coordinator forwards name-click
//! notifications through.

mod bus;

pub use bus::{
    BroadcastEventBus, EmittedEvent, EventBus, EventBusError, EventBusRef, InMemoryEventBus,
    NullEventBus,
};

use serde::{Deserialize, Serialize};

/// Identifier of one open page (one tab).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub u64);

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "page-{}", self.0)
    }
}

/// Who sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Origin {
    Page(PageId),
    Settings,
    Coordinator,
}

impl Origin {
    /// The page, if the message came from one.
    pub fn page(&self) -> Option<PageId> {
        match self {
            Origin::Page(id) => Some(*id),
            Origin::Settings | Origin::Coordinator => None,
        }
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Page(id) => id.fmt(f),
            Origin::Settings => f.write_str("settings"),
            Origin::Coordinator => f.write_str("coordinator"),
        }
    }
}

/// Messages handled by the coordinator.
///
/// Producers: page instances, settings surface
/// Consumers: coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RuntimeMessage {
    /// A page asks for the current template. Answered with
    /// [`Ack::Processing`]; the template follows as a separate push.
    GetTemplate,
    /// The user edited the template in the settings surface.
    TemplateUpdated { template: String },
    /// A page copied a greeting. Informational only.
    NameClicked(NameClickedEvent),
}

impl RuntimeMessage {
    /// Wire name of the message, for logging.
    pub fn action(&self) -> &'static str {
        match self {
            RuntimeMessage::GetTemplate => "getTemplate",
            RuntimeMessage::TemplateUpdated { .. } => "templateUpdated",
            RuntimeMessage::NameClicked(_) => "nameClicked",
        }
    }
}

/// Messages pushed to page instances.
///
/// Producers: coordinator
/// Consumers: page instances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum PageMessage {
    UpdateTemplate { template: String },
}

/// Immediate response to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Ack {
    /// Accepted; the real payload arrives later as its own message.
    Processing,
    /// Handled.
    Received,
}

/// Emitted by a page after a name was selected and the greeting copied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameClickedEvent {
    /// Unique identifier (UUID).
    pub id: String,
    /// Selected first name.
    pub name: String,
    /// Greeting that was copied.
    pub message: String,
    /// Whether the clipboard write succeeded.
    pub copied: bool,
    /// Timestamp in milliseconds since epoch.
    pub timestamp_ms: i64,
}

impl NameClickedEvent {
    /// New event with a fresh id and the current time.
    pub fn new(name: impl Into<String>, message: impl Into<String>, copied: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            message: message.into(),
            copied,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Event names as constants to prevent typos.
pub mod event_names {
    /// A page reported a name selection.
    pub const NAME_CLICKED: &str = "page:name_clicked";
}
