#![forbid(unsafe_code)]

//! Multi-element outside-click watcher.
//!
//! One document listener per event type. When it fires, every tracked
//! reference is resolved; if the event target lies inside none of the
//! resolved elements, the current callback runs.
//!
//! # Invariants
//!
//! 1. The callback runs through a [`Latest`] cell, so swapping it on a
//!    rerender never touches the document registry.
//! 2. Listeners are re-registered only when the event types change (by
//!    value) or the tracked list changes (by identity).
//! 3. Teardown removes the listener for exactly the event types it was
//!    registered with.
//! 4. Absent references never suppress the callback. They are reported,
//!    by index, whenever the tracked list changes.

use std::fmt;
use std::rc::Rc;

use clickaway_dom::{Document, Event, EventListener, ListenerOptions};
use tracing::{debug, trace, warn};

use crate::element_ref::TrackedElements;
use crate::latest::Latest;
use crate::registration::ListenerRegistration;

/// Callback of the multi-element watcher.
pub type OutsideClickCallback = Rc<dyn Fn()>;

/// Event types a watcher listens to, in registration order. Defaults to
/// `["click"]`; an empty list never fires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventTypes(Vec<String>);

impl EventTypes {
    #[must_use]
    pub fn none() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for EventTypes {
    fn default() -> Self {
        Self(vec!["click".to_owned()])
    }
}

impl<const N: usize> From<[&str; N]> for EventTypes {
    fn from(types: [&str; N]) -> Self {
        types.into_iter().collect()
    }
}

impl From<&[&str]> for EventTypes {
    fn from(types: &[&str]) -> Self {
        types.iter().copied().collect()
    }
}

impl From<Vec<String>> for EventTypes {
    fn from(types: Vec<String>) -> Self {
        Self(types)
    }
}

impl<'a> FromIterator<&'a str> for EventTypes {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_owned).collect())
    }
}

/// Props of [`OutsideClickWatcher`].
#[derive(Clone)]
pub struct OutsideClickProps {
    pub targets: TrackedElements,
    pub callback: OutsideClickCallback,
    pub events: EventTypes,
}

impl OutsideClickProps {
    pub fn new(targets: TrackedElements, callback: impl Fn() + 'static) -> Self {
        Self::with_callback(targets, Rc::new(callback))
    }

    #[must_use]
    pub fn with_callback(targets: TrackedElements, callback: OutsideClickCallback) -> Self {
        Self {
            targets,
            callback,
            events: EventTypes::default(),
        }
    }

    #[must_use]
    pub fn events(mut self, events: impl Into<EventTypes>) -> Self {
        self.events = events.into();
        self
    }
}

impl fmt::Debug for OutsideClickProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutsideClickProps")
            .field("targets", &self.targets)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

/// Calls the watcher's current callback. Identity is stable for the life
/// of the watcher; this is not a teardown handle.
#[derive(Clone)]
pub struct OutsideClickInvoker {
    latest: Latest<dyn Fn()>,
}

impl OutsideClickInvoker {
    pub fn invoke(&self) {
        (self.latest.current())();
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.latest.ptr_eq(&other.latest)
    }
}

impl fmt::Debug for OutsideClickInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OutsideClickInvoker(..)")
    }
}

/// A mounted multi-element watcher. Dropping it removes its listeners.
pub struct OutsideClickWatcher {
    document: Document,
    targets: TrackedElements,
    latest: Latest<dyn Fn()>,
    registration: Option<ListenerRegistration>,
    missing: Vec<usize>,
}

impl OutsideClickWatcher {
    pub fn mount(document: &Document, props: OutsideClickProps) -> Self {
        let OutsideClickProps {
            targets,
            callback,
            events,
        } = props;
        let latest = Latest::new(callback);
        let missing = report_missing(&targets);
        let registration = Some(register(document, &targets, &latest, &events));
        Self {
            document: document.clone(),
            targets,
            latest,
            registration,
            missing,
        }
    }

    /// Apply the props of a new render.
    pub fn rerender(&mut self, props: OutsideClickProps) {
        let OutsideClickProps {
            targets,
            callback,
            events,
        } = props;
        self.latest.replace(callback);

        let targets_changed = !self.targets.ptr_eq(&targets);
        if targets_changed {
            self.missing = report_missing(&targets);
            self.targets = targets;
        }
        let events_changed = self.event_types() != events.as_slice();
        if !targets_changed && !events_changed {
            return;
        }

        debug!(targets_changed, events_changed, "re-registering outside-click listeners");
        self.registration = None;
        self.registration = Some(register(
            &self.document,
            &self.targets,
            &self.latest,
            &events,
        ));
    }

    /// Indices of tracked entries found absent at the last tracked-list
    /// change.
    #[must_use]
    pub fn missing_targets(&self) -> &[usize] {
        &self.missing
    }

    #[must_use]
    pub fn invoker(&self) -> OutsideClickInvoker {
        OutsideClickInvoker {
            latest: self.latest.clone(),
        }
    }

    /// Event types the listener is currently registered for.
    #[must_use]
    pub fn event_types(&self) -> &[String] {
        self.registration
            .as_ref()
            .map_or(&[][..], ListenerRegistration::event_types)
    }

    #[must_use]
    pub fn is_listening(&self) -> bool {
        !self.event_types().is_empty()
    }

    pub fn unmount(self) {}
}

impl fmt::Debug for OutsideClickWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutsideClickWatcher")
            .field("targets", &self.targets)
            .field("event_types", &self.event_types())
            .field("missing", &self.missing)
            .finish()
    }
}

fn register(
    document: &Document,
    targets: &TrackedElements,
    latest: &Latest<dyn Fn()>,
    events: &EventTypes,
) -> ListenerRegistration {
    let targets = targets.clone();
    let latest = latest.clone();
    let listener = EventListener::new(move |event: &Event| {
        let inside = event
            .target()
            .is_some_and(|target| targets.any_contains(target));
        trace!(event_type = event.event_type(), inside, "outside-click check");
        if !inside {
            (latest.current())();
        }
    });
    ListenerRegistration::attach(
        document,
        events.as_slice(),
        listener,
        ListenerOptions::default(),
    )
}

fn report_missing(targets: &TrackedElements) -> Vec<usize> {
    let missing = targets.missing_indices();
    if !missing.is_empty() {
        let indices = missing
            .iter()
            .map(usize::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        warn!(%indices, "tracked elements are empty or cannot be found: {indices}");
    }
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element_ref::{ElementHandle, ElementRef};
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let count = Rc::new(Cell::new(0));
        let sink = Rc::clone(&count);
        (count, move || sink.set(sink.get() + 1))
    }

    #[test]
    fn event_types_default_to_click() {
        assert_eq!(EventTypes::default().as_slice(), ["click"]);
        assert_eq!(
            EventTypes::from(["click", "keydown"]).as_slice(),
            ["click", "keydown"]
        );
        assert!(EventTypes::none().is_empty());
    }

    #[test]
    fn fires_only_outside() {
        let document = Document::new();
        let inside = document.create_element("div");
        let child = document.create_element("span");
        let outside = document.create_element("div");
        document.body().append_child(&inside).unwrap();
        document.body().append_child(&outside).unwrap();
        inside.append_child(&child).unwrap();

        let (count, callback) = counter();
        let watcher = OutsideClickWatcher::mount(
            &document,
            OutsideClickProps::new(TrackedElements::new([ElementRef::from(inside.clone())]), callback),
        );
        inside.click();
        child.click();
        assert_eq!(count.get(), 0);
        outside.click();
        assert_eq!(count.get(), 1);
        assert!(watcher.is_listening());
    }

    #[test]
    fn late_assigned_handle_is_picked_up() {
        let document = Document::new();
        let panel = document.create_element("div");
        document.body().append_child(&panel).unwrap();
        let handle = ElementHandle::new();

        let (count, callback) = counter();
        let watcher = OutsideClickWatcher::mount(
            &document,
            OutsideClickProps::new(TrackedElements::new([ElementRef::from(&handle)]), callback),
        );
        assert_eq!(watcher.missing_targets(), [0]);
        panel.click();
        assert_eq!(count.get(), 1);

        handle.set(panel.clone());
        panel.click();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn events_changing_by_value_re_registers() {
        let document = Document::new();
        let targets = TrackedElements::empty();
        let mut watcher = OutsideClickWatcher::mount(
            &document,
            OutsideClickProps::new(targets.clone(), || {}),
        );
        let added = document.registrations_added();

        watcher.rerender(OutsideClickProps::new(targets.clone(), || {}).events(["click"]));
        assert_eq!(document.registrations_added(), added);

        watcher.rerender(OutsideClickProps::new(targets, || {}).events(["keydown"]));
        assert_eq!(document.registrations_added(), added + 1);
        assert_eq!(document.listener_count("click"), 0);
        assert_eq!(document.listener_count("keydown"), 1);
        assert_eq!(watcher.event_types(), ["keydown"]);
    }

    #[test]
    fn invoker_calls_the_latest_callback() {
        let document = Document::new();
        let targets = TrackedElements::empty();
        let (first, callback) = counter();
        let mut watcher =
            OutsideClickWatcher::mount(&document, OutsideClickProps::new(targets.clone(), callback));
        let invoker = watcher.invoker();
        invoker.invoke();
        assert_eq!(first.get(), 1);

        let (second, callback) = counter();
        watcher.rerender(OutsideClickProps::new(targets, callback));
        invoker.invoke();
        assert_eq!(first.get(), 1);
        assert_eq!(second.get(), 1);
        assert!(invoker.ptr_eq(&watcher.invoker()));
    }

    #[test]
    fn unmount_detaches() {
        let document = Document::new();
        let (count, callback) = counter();
        let watcher = OutsideClickWatcher::mount(
            &document,
            OutsideClickProps::new(TrackedElements::empty(), callback).events(["click", "keydown"]),
        );
        assert_eq!(document.total_listener_count(), 2);
        watcher.unmount();
        assert_eq!(document.total_listener_count(), 0);
        document.body().click();
        assert_eq!(count.get(), 0);
    }
}
