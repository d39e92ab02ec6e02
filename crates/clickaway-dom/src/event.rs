#![forbid(unsafe_code)]

//! Events as seen by document listeners.

use std::cell::Cell;

use crate::node::Node;

/// Flags fixed at event construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventInit {
    pub bubbles: bool,
    pub cancelable: bool,
    /// Whether the event escapes shadow trees.
    pub composed: bool,
}

impl EventInit {
    /// Flags of user-interface events such as `click` and `keydown`.
    pub const UI: Self = Self {
        bubbles: true,
        cancelable: true,
        composed: true,
    };
}

/// A dispatched (or about to be dispatched) event.
///
/// `target` and `composed_path` are filled in by dispatch, already
/// retargeted for listeners on the document.
#[derive(Debug, Clone)]
pub struct Event {
    event_type: String,
    init: EventInit,
    target: Option<Node>,
    path: Vec<Node>,
    default_prevented: Cell<bool>,
    in_passive_listener: Cell<bool>,
}

impl Event {
    #[must_use]
    pub fn new(event_type: impl Into<String>, init: EventInit) -> Self {
        Self {
            event_type: event_type.into(),
            init,
            target: None,
            path: Vec::new(),
            default_prevented: Cell::new(false),
            in_passive_listener: Cell::new(false),
        }
    }

    /// A bubbling, cancelable, composed event of the given type.
    #[must_use]
    pub fn ui(event_type: impl Into<String>) -> Self {
        Self::new(event_type, EventInit::UI)
    }

    #[must_use]
    pub fn click() -> Self {
        Self::ui("click")
    }

    #[must_use]
    pub fn keydown() -> Self {
        Self::ui("keydown")
    }

    #[must_use]
    pub fn pointerdown() -> Self {
        Self::ui("pointerdown")
    }

    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    #[must_use]
    pub fn bubbles(&self) -> bool {
        self.init.bubbles
    }

    #[must_use]
    pub fn composed(&self) -> bool {
        self.init.composed
    }

    #[must_use]
    pub fn cancelable(&self) -> bool {
        self.init.cancelable
    }

    /// The target, retargeted out of any shadow tree.
    #[must_use]
    pub fn target(&self) -> Option<&Node> {
        self.target.as_ref()
    }

    /// Nodes the event travels through, target first, with nodes inside
    /// closed shadow trees left out.
    #[must_use]
    pub fn composed_path(&self) -> &[Node] {
        &self.path
    }

    /// Cancel the event. Ignored for non-cancelable events and inside
    /// passive listeners.
    pub fn prevent_default(&self) {
        if self.init.cancelable && !self.in_passive_listener.get() {
            self.default_prevented.set(true);
        }
    }

    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub(crate) fn set_route(&mut self, target: Node, path: Vec<Node>) {
        self.target = Some(target);
        self.path = path;
    }

    pub(crate) fn set_passive(&self, passive: bool) {
        self.in_passive_listener.set(passive);
    }
}
