#![forbid(unsafe_code)]

//! Single-element outside-click watcher.
//!
//! Tracks one element, supplied through an [`ElementRef`] or assigned later
//! to the watcher's [`ElementHandle`]. Per event, the source is resolved
//! first and the handle is the fallback. The handler is suppressed when no
//! element resolves, when the element contains the target, or when the
//! event's composed path includes the element (targets retargeted out of a
//! shadow tree).
//!
//! # Invariants
//!
//! 1. Exactly one document listener while mounted.
//! 2. The listener is replaced when the event type, the options or the
//!    listener's inputs change. Its inputs are the source identity, the
//!    handler identity and the handle's element at render time.
//! 3. There is no latest-callback cell here: a new handler `Rc` on every
//!    render re-registers on every render.

use std::fmt;
use std::rc::Rc;

use clickaway_dom::{Document, Event, EventListener, ListenerOptions, Node};
use tracing::{debug, trace};

use crate::element_ref::{ElementHandle, ElementRef};
use crate::registration::ListenerRegistration;

/// Handler of the single-element watcher; receives the raw event.
pub type ClickAwayHandler = Rc<dyn Fn(&Event)>;

/// Props of [`SingleOutsideClickWatcher`].
#[derive(Clone)]
pub struct SingleClickProps {
    pub source: ElementRef,
    pub on_click_away: ClickAwayHandler,
    pub event_type: String,
    pub options: ListenerOptions,
}

impl SingleClickProps {
    pub fn new(source: impl Into<ElementRef>, on_click_away: impl Fn(&Event) + 'static) -> Self {
        Self::with_handler(source, Rc::new(on_click_away))
    }

    pub fn with_handler(source: impl Into<ElementRef>, on_click_away: ClickAwayHandler) -> Self {
        Self {
            source: source.into(),
            on_click_away,
            event_type: "click".to_owned(),
            options: ListenerOptions::default(),
        }
    }

    #[must_use]
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    #[must_use]
    pub fn options(mut self, options: impl Into<ListenerOptions>) -> Self {
        self.options = options.into();
        self
    }
}

impl fmt::Debug for SingleClickProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleClickProps")
            .field("source", &self.source)
            .field("event_type", &self.event_type)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// A mounted single-element watcher. Dropping it removes its listener.
pub struct SingleOutsideClickWatcher {
    document: Document,
    handle: ElementHandle,
    source: ElementRef,
    on_click_away: ClickAwayHandler,
    /// Handle contents when the listener was built.
    handle_snapshot: Option<Node>,
    registration: Option<ListenerRegistration>,
}

impl SingleOutsideClickWatcher {
    pub fn mount(document: &Document, props: SingleClickProps) -> Self {
        let handle = ElementHandle::new();
        let registration = Some(register(document, &handle, &props));
        Self {
            document: document.clone(),
            handle_snapshot: handle.get(),
            handle,
            source: props.source,
            on_click_away: props.on_click_away,
            registration,
        }
    }

    /// Apply the props of a new render. Returns whether the listener was
    /// replaced.
    pub fn rerender(&mut self, props: SingleClickProps) -> bool {
        let snapshot = self.handle.get();
        let inputs_changed = !self.source.same_identity(&props.source)
            || !std::ptr::addr_eq(
                Rc::as_ptr(&self.on_click_away),
                Rc::as_ptr(&props.on_click_away),
            )
            || snapshot != self.handle_snapshot;
        let listener_changed = inputs_changed
            || self.event_type() != props.event_type
            || self.options() != Some(props.options);
        if !listener_changed {
            return false;
        }

        debug!(
            event_type = %props.event_type,
            inputs_changed,
            "re-registering single outside-click listener"
        );
        // Old listener out before the new one goes in.
        self.registration = None;
        self.registration = Some(register(&self.document, &self.handle, &props));
        self.handle_snapshot = snapshot;
        self.source = props.source;
        self.on_click_away = props.on_click_away;
        true
    }

    /// The settable handle; clones of it assign the tracked element.
    #[must_use]
    pub fn handle(&self) -> &ElementHandle {
        &self.handle
    }

    /// The element an event dispatched now would be compared against.
    #[must_use]
    pub fn tracked_element(&self) -> Option<Node> {
        self.source.resolve().or_else(|| self.handle.get())
    }

    #[must_use]
    pub fn event_type(&self) -> &str {
        self.registration
            .as_ref()
            .and_then(|registration| registration.event_types().first())
            .map_or("", String::as_str)
    }

    fn options(&self) -> Option<ListenerOptions> {
        self.registration
            .as_ref()
            .map(ListenerRegistration::options)
    }

    pub fn unmount(self) {}
}

impl fmt::Debug for SingleOutsideClickWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleOutsideClickWatcher")
            .field("source", &self.source)
            .field("handle", &self.handle)
            .field("event_type", &self.event_type())
            .finish_non_exhaustive()
    }
}

fn register(
    document: &Document,
    handle: &ElementHandle,
    props: &SingleClickProps,
) -> ListenerRegistration {
    let source = props.source.clone();
    let handle = handle.clone();
    let on_click_away = Rc::clone(&props.on_click_away);
    let listener = EventListener::new(move |event: &Event| {
        let Some(element) = source.resolve().or_else(|| handle.get()) else {
            trace!(event_type = event.event_type(), "no tracked element");
            return;
        };
        let contains_target = event
            .target()
            .is_some_and(|target| element.contains(target));
        if contains_target || event.composed_path().contains(&element) {
            trace!(event_type = event.event_type(), "event inside tracked element");
            return;
        }
        on_click_away(event);
    });
    ListenerRegistration::attach(
        document,
        std::slice::from_ref(&props.event_type),
        listener,
        props.options,
    )
}
