//! The settings surface: view and edit the template, watch name clicks,
//! list the names found on a page.

use salute_bus::TransportError;
use salute_coordinator::CoordinatorHandle;
use salute_events::{Ack, BroadcastEventBus, EmittedEvent, Origin, RuntimeMessage};
use salute_storage::TemplateStore;
use salute_template::{validate, Direction, Template, TemplateWarning};
use std::sync::Arc;
use tokio::sync::broadcast;

pub const NO_NAMES_FOUND: &str = "No names found on this page.";

/// Result of saving an edited template.
#[derive(Debug)]
pub struct EditOutcome {
    pub template: Template,
    /// Shown next to the editor; never blocks saving.
    pub warning: Option<TemplateWarning>,
    pub saved: bool,
    /// The coordinator's answer; `None` when nothing was sent.
    pub relayed: Option<Result<Ack, TransportError>>,
}

pub struct SettingsSurface {
    store: TemplateStore,
    coordinator: CoordinatorHandle,
    events: Arc<BroadcastEventBus>,
}

impl SettingsSurface {
    /// Settings view over the shared store and the coordinator.
    pub fn new(
        store: TemplateStore,
        coordinator: CoordinatorHandle,
        events: Arc<BroadcastEventBus>,
    ) -> Self {
        Self {
            store,
            coordinator,
            events,
        }
    }

    /// Template shown in the editor.
    pub async fn load(&self) -> Template {
        self.store.get(Direction::Ltr).await
    }

    /// Save an edit and tell the coordinator so open pages pick it up.
    /// An empty edit is not a template and changes nothing.
    pub async fn edit(&self, text: &str) -> EditOutcome {
        let template = Template::new(text);
        let warning = validate(text);
        if template.is_empty() {
            tracing::debug!("Ignoring empty template edit");
            return EditOutcome {
                template,
                warning,
                saved: false,
                relayed: None,
            };
        }
        if let Some(warning) = &warning {
            tracing::debug!(%warning, "Template saved without placeholder");
        }

        let saved = self.store.set(&template).await.is_ok();
        let relayed = self
            .coordinator
            .request(
                Origin::Settings,
                RuntimeMessage::TemplateUpdated {
                    template: template.as_str().to_string(),
                },
            )
            .await;
        if let Err(e) = &relayed {
            tracing::warn!(error = %e, "Coordinator did not take the template update");
        }

        EditOutcome {
            template,
            warning,
            saved,
            relayed: Some(relayed),
        }
    }

    /// Name clicks reported by pages from now on.
    pub fn name_log(&self) -> broadcast::Receiver<EmittedEvent> {
        self.events.subscribe()
    }
}

/// First names found in a page's markup, or the empty-page notice.
pub fn extract_names(html: &str) -> Result<Vec<String>, &'static str> {
    let names = salute_extract::extract_first_names(&salute_extract::candidates_from_html(html));
    if names.is_empty() {
        Err(NO_NAMES_FOUND)
    } else {
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_names() {
        let html = r#"<span title="Maria Lopez">Maria Lopez</span><span>Sam</span>"#;
        assert_eq!(extract_names(html), Ok(vec!["Maria".into(), "Sam".into()]));
    }

    #[test]
    fn test_extract_names_empty_page() {
        assert_eq!(extract_names("<p></p>"), Err(NO_NAMES_FOUND));
    }
}
