#![forbid(unsafe_code)]

//! References to tracked elements.
//!
//! A tracked element can be known in several ways: as a node in hand, as a
//! function that finds it on demand, as a settable [`ElementHandle`] filled
//! in later, or not at all. [`ElementRef`] unifies them and is resolved
//! afresh at every dispatch, so late-mounted elements are picked up without
//! re-registering anything.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use clickaway_dom::Node;

/// Settable element slot (the `ref` object of a component).
///
/// Clones share the slot.
#[derive(Clone, Default)]
pub struct ElementHandle {
    slot: Rc<RefCell<Option<Node>>>,
}

impl ElementHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(node: Node) -> Self {
        let handle = Self::new();
        handle.set(node);
        handle
    }

    pub fn set(&self, node: Node) {
        *self.slot.borrow_mut() = Some(node);
    }

    pub fn clear(&self) {
        *self.slot.borrow_mut() = None;
    }

    #[must_use]
    pub fn get(&self) -> Option<Node> {
        self.slot.borrow().clone()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }
}

impl fmt::Debug for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ElementHandle")
            .field(&*self.slot.borrow())
            .finish()
    }
}

/// Finds an element on demand.
pub type ElementResolver = Rc<dyn Fn() -> Option<Node>>;

/// One way of pointing at an element.
#[derive(Clone)]
pub enum ElementRef {
    Direct(Node),
    Resolver(ElementResolver),
    Handle(ElementHandle),
    Absent,
}

impl ElementRef {
    pub fn resolver(resolve: impl Fn() -> Option<Node> + 'static) -> Self {
        Self::Resolver(Rc::new(resolve))
    }

    /// The element this reference points at right now.
    #[must_use]
    pub fn resolve(&self) -> Option<Node> {
        match self {
            Self::Direct(node) => Some(node.clone()),
            Self::Resolver(resolve) => resolve(),
            Self::Handle(handle) => handle.get(),
            Self::Absent => None,
        }
    }

    /// Whether both refer the same way to the same thing: same node, same
    /// resolver, same handle, or both absent.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Direct(a), Self::Direct(b)) => a == b,
            (Self::Resolver(a), Self::Resolver(b)) => {
                std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
            }
            (Self::Handle(a), Self::Handle(b)) => a.ptr_eq(b),
            (Self::Absent, Self::Absent) => true,
            _ => false,
        }
    }
}

impl Default for ElementRef {
    fn default() -> Self {
        Self::Absent
    }
}

impl From<Node> for ElementRef {
    fn from(node: Node) -> Self {
        Self::Direct(node)
    }
}

impl From<Option<Node>> for ElementRef {
    fn from(node: Option<Node>) -> Self {
        node.map_or(Self::Absent, Self::Direct)
    }
}

impl From<ElementHandle> for ElementRef {
    fn from(handle: ElementHandle) -> Self {
        Self::Handle(handle)
    }
}

impl From<&ElementHandle> for ElementRef {
    fn from(handle: &ElementHandle) -> Self {
        Self::Handle(handle.clone())
    }
}

impl fmt::Debug for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(node) => f.debug_tuple("Direct").field(node).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
            Self::Handle(handle) => f.debug_tuple("Handle").field(handle).finish(),
            Self::Absent => f.write_str("Absent"),
        }
    }
}

/// The list of tracked elements of a multi-element watcher.
///
/// Identity, not content, is what a watcher compares between renders:
/// clones share identity, while two lists built separately never do, even
/// with equal entries.
#[derive(Clone)]
pub struct TrackedElements {
    refs: Rc<[ElementRef]>,
}

impl TrackedElements {
    pub fn new(refs: impl IntoIterator<Item = ElementRef>) -> Self {
        refs.into_iter().collect()
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::from(Vec::new())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementRef> {
        self.refs.iter()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.refs, &other.refs)
    }

    /// Indices of entries that resolve to no element.
    #[must_use]
    pub fn missing_indices(&self) -> Vec<usize> {
        self.refs
            .iter()
            .enumerate()
            .filter(|(_, r)| r.resolve().is_none())
            .map(|(index, _)| index)
            .collect()
    }

    /// Whether `target` lies inside any resolvable entry.
    #[must_use]
    pub fn any_contains(&self, target: &Node) -> bool {
        self.refs
            .iter()
            .filter_map(ElementRef::resolve)
            .any(|element| element.contains(target))
    }
}

impl From<Vec<ElementRef>> for TrackedElements {
    fn from(refs: Vec<ElementRef>) -> Self {
        Self { refs: refs.into() }
    }
}

impl FromIterator<ElementRef> for TrackedElements {
    fn from_iter<I: IntoIterator<Item = ElementRef>>(iter: I) -> Self {
        Self {
            refs: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for TrackedElements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.refs.iter()).finish()
    }
}
