#![forbid(unsafe_code)]

//! The document: node factory, listener registry, dispatch and font set.
//!
//! # Dispatch
//!
//! Listeners live on the document only. An event targeted at a node walks
//! from the target to its root, leaving shadow trees through their hosts
//! when the event is composed. If the walk ends at the document, document
//! listeners run:
//!
//! 1. capture listeners, then (for bubbling events, or events targeted at
//!    the document itself) bubble listeners, each group in registration
//!    order;
//! 2. `target()` is retargeted out of every shadow tree;
//! 3. `composed_path()` omits nodes inside closed shadow trees.
//!
//! Events on disconnected nodes reach no listener.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;

use crate::event::Event;
use crate::font::FontFaceSet;
use crate::listener::{EventListener, ListenerOptions, ListenerRegistry};
use crate::node::{Node, NodeKind};

pub(crate) struct DocumentState {
    node: Node,
    document_element: Node,
    body: Node,
    listeners: RefCell<ListenerRegistry>,
    fonts: FontFaceSet,
}

/// Shared handle to a document.
#[derive(Clone)]
pub struct Document {
    state: Rc<DocumentState>,
}

impl Document {
    /// A document containing `<html><body></body></html>`.
    #[must_use]
    pub fn new() -> Self {
        let state = Rc::new_cyclic(|owner: &Weak<DocumentState>| {
            let node = Node::new(NodeKind::Document, owner.clone());
            let document_element = Node::new(
                NodeKind::Element {
                    tag: "html".to_owned(),
                },
                owner.clone(),
            );
            let body = Node::new(
                NodeKind::Element {
                    tag: "body".to_owned(),
                },
                owner.clone(),
            );
            node.link_child(&document_element);
            document_element.link_child(&body);
            DocumentState {
                node,
                document_element,
                body,
                listeners: RefCell::new(ListenerRegistry::default()),
                fonts: FontFaceSet::new(),
            }
        });
        Self { state }
    }

    pub(crate) fn from_state(state: Rc<DocumentState>) -> Self {
        Self { state }
    }

    /// The document node itself.
    #[must_use]
    pub fn node(&self) -> Node {
        self.state.node.clone()
    }

    #[must_use]
    pub fn document_element(&self) -> Node {
        self.state.document_element.clone()
    }

    #[must_use]
    pub fn body(&self) -> Node {
        self.state.body.clone()
    }

    /// A new, detached element owned by this document.
    #[must_use]
    pub fn create_element(&self, tag: impl Into<String>) -> Node {
        Node::new(
            NodeKind::Element { tag: tag.into() },
            Rc::downgrade(&self.state),
        )
    }

    /// First element in tree order with the given id, outside shadow trees.
    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<Node> {
        let mut stack = vec![self.state.node.clone()];
        while let Some(node) = stack.pop() {
            if node.is_element() && node.id().as_deref() == Some(id) {
                return Some(node);
            }
            stack.extend(node.children().into_iter().rev());
        }
        None
    }

    #[must_use]
    pub fn fonts(&self) -> &FontFaceSet {
        &self.state.fonts
    }

    /// Register `listener` for `event_type`. Returns `false` when an
    /// identical registration (same type, listener and capture flag)
    /// already exists.
    pub fn add_event_listener(
        &self,
        event_type: &str,
        listener: &EventListener,
        options: impl Into<ListenerOptions>,
    ) -> bool {
        self.state
            .listeners
            .borrow_mut()
            .add(event_type, listener, options.into())
    }

    /// Remove the registration matching type, listener and capture flag.
    pub fn remove_event_listener(
        &self,
        event_type: &str,
        listener: &EventListener,
        options: impl Into<ListenerOptions>,
    ) -> bool {
        self.state
            .listeners
            .borrow_mut()
            .remove(event_type, listener, options.into().capture)
    }

    /// Number of live registrations for `event_type`.
    #[must_use]
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.state.listeners.borrow().count(event_type)
    }

    /// Number of live registrations for all types.
    #[must_use]
    pub fn total_listener_count(&self) -> usize {
        self.state.listeners.borrow().len()
    }

    /// Registrations ever added. Grows by one per successful
    /// [`add_event_listener`](Self::add_event_listener).
    #[must_use]
    pub fn registrations_added(&self) -> u64 {
        self.state.listeners.borrow().added_total()
    }

    /// Dispatch `event` at the document itself.
    pub fn dispatch_event(&self, event: Event) -> bool {
        let node = self.node();
        self.dispatch_at(&node, event)
    }

    pub(crate) fn dispatch_at(&self, target: &Node, mut event: Event) -> bool {
        let composed = event.composed();
        let mut raw_path = vec![target.clone()];
        let mut current = target.clone();
        while let Some(next) = current.event_parent(composed) {
            raw_path.push(next.clone());
            current = next;
        }
        if !current.ptr_eq(&self.state.node) {
            trace!(
                event_type = event.event_type(),
                "event target not connected to the document"
            );
            return !event.default_prevented();
        }

        let mut retargeted = target.clone();
        while let Some(host) = retargeted.root_node().host() {
            retargeted = host;
        }
        let visible_path = raw_path
            .into_iter()
            .filter(|node| !node.in_closed_shadow_tree())
            .collect();
        event.set_route(retargeted, visible_path);

        let at_document = target.ptr_eq(&self.state.node);
        let registrations = self.state.listeners.borrow().snapshot(event.event_type());
        let capture = registrations.iter().filter(|r| r.options.capture);
        let bubble = registrations
            .iter()
            .filter(|r| !r.options.capture && (at_document || event.bubbles()));
        for registration in capture.chain(bubble) {
            if registration.removed.get() {
                continue;
            }
            if registration.options.once {
                self.state
                    .listeners
                    .borrow_mut()
                    .remove_registration(registration);
            }
            event.set_passive(registration.options.passive);
            registration.listener.call(&event);
            event.set_passive(false);
        }
        !event.default_prevented()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("listeners", &self.state.listeners.borrow().len())
            .field("fonts", &self.state.fonts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventInit;
    use crate::node::ShadowRootMode;
    use std::cell::Cell;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, tag: &'static str) -> EventListener {
        let log = Rc::clone(log);
        EventListener::new(move |_| log.borrow_mut().push(tag.to_owned()))
    }

    #[test]
    fn new_document_has_html_and_body() {
        let document = Document::new();
        let html = document.document_element();
        let body = document.body();
        assert_eq!(html.tag_name(), Some("html"));
        assert_eq!(body.tag_name(), Some("body"));
        assert!(html.parent().is_some_and(|parent| parent.ptr_eq(&document.node())));
        assert!(body.parent().is_some_and(|parent| parent.ptr_eq(&html)));
        assert_eq!(document.node().children().len(), 1);
        assert_eq!(html.children().len(), 1);
        assert!(body.is_connected());
        assert!(body.owner_document().is_some());
    }

    #[test]
    fn capture_listeners_run_before_bubble_listeners() {
        let document = Document::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        document.add_event_listener("click", &recorder(&log, "bubble-1"), false);
        document.add_event_listener("click", &recorder(&log, "capture"), true);
        document.add_event_listener("click", &recorder(&log, "bubble-2"), false);

        document.body().click();
        assert_eq!(*log.borrow(), ["capture", "bubble-1", "bubble-2"]);
    }

    #[test]
    fn non_bubbling_event_reaches_only_capture_listeners() {
        let document = Document::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        document.add_event_listener("focus", &recorder(&log, "bubble"), false);
        document.add_event_listener("focus", &recorder(&log, "capture"), true);

        let init = EventInit {
            composed: true,
            ..EventInit::default()
        };
        document.body().dispatch_event(Event::new("focus", init));
        assert_eq!(*log.borrow(), ["capture"]);

        log.borrow_mut().clear();
        document.dispatch_event(Event::new("focus", init));
        assert_eq!(*log.borrow(), ["capture", "bubble"]);
    }

    #[test]
    fn disconnected_targets_reach_no_listener() {
        let document = Document::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        document.add_event_listener("click", &recorder(&log, "any"), false);
        let loose = document.create_element("div");
        loose.click();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn once_listener_runs_once() {
        let document = Document::new();
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let listener = EventListener::new(move |_| seen.set(seen.get() + 1));
        document.add_event_listener("click", &listener, ListenerOptions::default().once(true));

        document.body().click();
        document.body().click();
        assert_eq!(count.get(), 1);
        assert_eq!(document.listener_count("click"), 0);
    }

    #[test]
    fn listener_removed_mid_dispatch_does_not_run() {
        let document = Document::new();
        let count = Rc::new(Cell::new(0));
        let seen = Rc::clone(&count);
        let victim = EventListener::new(move |_| seen.set(seen.get() + 1));

        let doc = document.clone();
        let victim_handle = victim.clone();
        let remover = EventListener::new(move |_| {
            doc.remove_event_listener("click", &victim_handle, false);
        });
        document.add_event_listener("click", &remover, false);
        document.add_event_listener("click", &victim, false);

        document.body().click();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn target_is_retargeted_out_of_shadow_trees() {
        let document = Document::new();
        let host = document.create_element("x-card");
        document.body().append_child(&host).unwrap();
        let shadow = host.attach_shadow(ShadowRootMode::Open).unwrap();
        let button = document.create_element("button");
        shadow.append_child(&button).unwrap();

        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        let listener = EventListener::new(move |event: &Event| {
            *sink.borrow_mut() = Some((event.target().cloned(), event.composed_path().to_vec()));
        });
        document.add_event_listener("click", &listener, false);

        button.click();
        let (target, path) = seen.borrow_mut().take().unwrap();
        assert_eq!(target, Some(host.clone()));
        assert_eq!(path.first(), Some(&button));
        assert!(path.contains(&shadow));
        assert_eq!(path.last(), Some(&document.node()));
    }

    #[test]
    fn closed_shadow_nodes_are_hidden_from_the_path() {
        let document = Document::new();
        let host = document.create_element("x-card");
        document.body().append_child(&host).unwrap();
        let shadow = host.attach_shadow(ShadowRootMode::Closed).unwrap();
        let button = document.create_element("button");
        shadow.append_child(&button).unwrap();

        let path_len = Rc::new(Cell::new(0));
        let sink = Rc::clone(&path_len);
        let first = Rc::new(RefCell::new(None));
        let first_sink = Rc::clone(&first);
        let listener = EventListener::new(move |event: &Event| {
            sink.set(event.composed_path().len());
            *first_sink.borrow_mut() = event.composed_path().first().cloned();
        });
        document.add_event_listener("click", &listener, false);

        button.click();
        // host, body, html, document
        assert_eq!(path_len.get(), 4);
        assert_eq!(*first.borrow(), Some(host));
    }

    #[test]
    fn uncomposed_events_stay_inside_shadow_trees() {
        let document = Document::new();
        let host = document.create_element("x-card");
        document.body().append_child(&host).unwrap();
        let shadow = host.attach_shadow(ShadowRootMode::Open).unwrap();
        let button = document.create_element("button");
        shadow.append_child(&button).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        document.add_event_listener("slotchange", &recorder(&log, "doc"), false);
        let init = EventInit {
            bubbles: true,
            ..EventInit::default()
        };
        button.dispatch_event(Event::new("slotchange", init));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn passive_listener_cannot_cancel() {
        let document = Document::new();
        let cancel = EventListener::new(|event: &Event| event.prevent_default());
        document.add_event_listener("wheel", &cancel, ListenerOptions::default().passive(true));
        assert!(document.body().dispatch_event(Event::ui("wheel")));

        document.remove_event_listener("wheel", &cancel, false);
        document.add_event_listener("wheel", &cancel, false);
        assert!(!document.body().dispatch_event(Event::ui("wheel")));
    }

    #[test]
    fn registration_counters_track_adds() {
        let document = Document::new();
        let listener = EventListener::new(|_| {});
        assert!(document.add_event_listener("click", &listener, false));
        assert!(!document.add_event_listener("click", &listener, false));
        assert!(document.add_event_listener("keydown", &listener, false));
        assert_eq!(document.registrations_added(), 2);
        assert_eq!(document.total_listener_count(), 2);
        assert!(document.remove_event_listener("click", &listener, false));
        assert_eq!(document.total_listener_count(), 1);
    }

    #[test]
    fn get_element_by_id_finds_light_tree_nodes() {
        let document = Document::new();
        let a = document.create_element("div");
        a.set_id("ele1");
        document.body().append_child(&a).unwrap();
        assert_eq!(document.get_element_by_id("ele1"), Some(a));
        assert!(document.get_element_by_id("ele2").is_none());
        assert_eq!(document.body().parent(), Some(document.document_element()));
    }
}
