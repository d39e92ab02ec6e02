#![forbid(unsafe_code)]

//! RAII guard for document listeners.

use clickaway_dom::{Document, EventListener, ListenerOptions};
use tracing::debug;

/// One listener registered on a document for a list of event types.
///
/// Dropping the guard removes the listener for exactly the types it was
/// attached with, whatever the owner's props say by then.
pub(crate) struct ListenerRegistration {
    document: Document,
    event_types: Vec<String>,
    listener: EventListener,
    options: ListenerOptions,
}

impl ListenerRegistration {
    pub(crate) fn attach(
        document: &Document,
        event_types: &[String],
        listener: EventListener,
        options: ListenerOptions,
    ) -> Self {
        for event_type in event_types {
            let added = document.add_event_listener(event_type, &listener, options);
            if !added {
                debug!(%event_type, "duplicate event type, document kept one registration");
            }
        }
        debug!(event_types = ?event_types, ?options, "listeners attached");
        Self {
            document: document.clone(),
            event_types: event_types.to_vec(),
            listener,
            options,
        }
    }

    pub(crate) fn event_types(&self) -> &[String] {
        &self.event_types
    }

    pub(crate) fn options(&self) -> ListenerOptions {
        self.options
    }
}

impl Drop for ListenerRegistration {
    fn drop(&mut self) {
        for event_type in &self.event_types {
            self.document
                .remove_event_listener(event_type, &self.listener, self.options);
        }
        debug!(event_types = ?self.event_types, "listeners detached");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn drop_removes_every_type() {
        let document = Document::new();
        let guard = ListenerRegistration::attach(
            &document,
            &types(&["click", "keydown"]),
            EventListener::new(|_| {}),
            ListenerOptions::default(),
        );
        assert_eq!(document.listener_count("click"), 1);
        assert_eq!(document.listener_count("keydown"), 1);
        assert_eq!(guard.event_types(), ["click", "keydown"]);
        drop(guard);
        assert_eq!(document.total_listener_count(), 0);
    }

    #[test]
    fn duplicate_types_collapse_in_the_document() {
        let document = Document::new();
        let guard = ListenerRegistration::attach(
            &document,
            &types(&["click", "click"]),
            EventListener::new(|_| {}),
            ListenerOptions::default(),
        );
        assert_eq!(document.listener_count("click"), 1);
        drop(guard);
        assert_eq!(document.listener_count("click"), 0);
    }

    #[test]
    fn capture_registration_is_removed_with_its_flag() {
        let document = Document::new();
        let guard = ListenerRegistration::attach(
            &document,
            &types(&["pointerdown"]),
            EventListener::new(|_| {}),
            ListenerOptions::default().capture(true),
        );
        assert!(guard.options().capture);
        drop(guard);
        assert_eq!(document.listener_count("pointerdown"), 0);
    }
}
