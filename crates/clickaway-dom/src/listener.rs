#![forbid(unsafe_code)]

//! Document event listeners and their registry.
//!
//! # Invariants
//!
//! 1. At most one registration exists per (event type, listener identity,
//!    capture flag); adding an exact duplicate is a no-op.
//! 2. Registrations for a type are kept in insertion order.
//! 3. A registration removed while an event is being dispatched does not
//!    run for the remainder of that dispatch.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::event::Event;

/// A listener callback with identity.
///
/// Clones share identity, so the clone handed to
/// [`Document::remove_event_listener`](crate::Document::remove_event_listener)
/// removes the registration made with the original.
#[derive(Clone)]
pub struct EventListener {
    callback: Rc<dyn Fn(&Event)>,
}

impl EventListener {
    pub fn new(callback: impl Fn(&Event) + 'static) -> Self {
        Self {
            callback: Rc::new(callback),
        }
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.callback, &other.callback)
    }

    pub fn call(&self, event: &Event) {
        (self.callback)(event);
    }
}

impl fmt::Debug for EventListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventListener")
            .field("ptr", &Rc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}

/// Options of `addEventListener`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ListenerOptions {
    pub capture: bool,
    pub once: bool,
    pub passive: bool,
}

impl ListenerOptions {
    #[must_use]
    pub fn capture(mut self, capture: bool) -> Self {
        self.capture = capture;
        self
    }

    #[must_use]
    pub fn once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    #[must_use]
    pub fn passive(mut self, passive: bool) -> Self {
        self.passive = passive;
        self
    }
}

/// The boolean form of the options argument sets only `capture`.
impl From<bool> for ListenerOptions {
    fn from(capture: bool) -> Self {
        Self {
            capture,
            ..Self::default()
        }
    }
}

pub(crate) struct Registration {
    pub(crate) event_type: String,
    pub(crate) listener: EventListener,
    pub(crate) options: ListenerOptions,
    pub(crate) removed: Cell<bool>,
}

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    entries: Vec<Rc<Registration>>,
    added_total: u64,
}

impl ListenerRegistry {
    pub(crate) fn add(
        &mut self,
        event_type: &str,
        listener: &EventListener,
        options: ListenerOptions,
    ) -> bool {
        if self.position(event_type, listener, options.capture).is_some() {
            return false;
        }
        self.entries.push(Rc::new(Registration {
            event_type: event_type.to_owned(),
            listener: listener.clone(),
            options,
            removed: Cell::new(false),
        }));
        self.added_total += 1;
        true
    }

    pub(crate) fn remove(&mut self, event_type: &str, listener: &EventListener, capture: bool) -> bool {
        match self.position(event_type, listener, capture) {
            Some(index) => {
                let entry = self.entries.remove(index);
                entry.removed.set(true);
                true
            }
            None => false,
        }
    }

    pub(crate) fn remove_registration(&mut self, registration: &Rc<Registration>) {
        if let Some(index) = self
            .entries
            .iter()
            .position(|entry| Rc::ptr_eq(entry, registration))
        {
            self.entries.remove(index);
        }
        registration.removed.set(true);
    }

    /// Registrations for `event_type` in insertion order.
    pub(crate) fn snapshot(&self, event_type: &str) -> Vec<Rc<Registration>> {
        self.entries
            .iter()
            .filter(|entry| entry.event_type == event_type)
            .cloned()
            .collect()
    }

    pub(crate) fn count(&self, event_type: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.event_type == event_type)
            .count()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn added_total(&self) -> u64 {
        self.added_total
    }

    fn position(&self, event_type: &str, listener: &EventListener, capture: bool) -> Option<usize> {
        self.entries.iter().position(|entry| {
            entry.event_type == event_type
                && entry.options.capture == capture
                && entry.listener.ptr_eq(listener)
        })
    }
}
