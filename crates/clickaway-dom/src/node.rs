#![forbid(unsafe_code)]

//! Document nodes.
//!
//! A [`Node`] is a shared handle: cloning it yields another handle to the
//! same node, and equality is identity. Parents own their children and hosts
//! own their shadow roots; upward links are weak, so dropping a detached
//! subtree frees it.
//!
//! # Invariants
//!
//! 1. A node has at most one parent, and it appears exactly once in that
//!    parent's child list.
//! 2. No node is a host-including ancestor of itself.
//! 3. A shadow root never has a parent; its upward link is its host.
//! 4. [`Node::contains`] stays inside one tree: it never descends into a
//!    shadow tree and never climbs out of one.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use crate::document::{Document, DocumentState};
use crate::error::HierarchyError;
use crate::event::Event;

/// Encapsulation mode of a shadow root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadowRootMode {
    /// Nodes inside stay visible in composed paths seen from outside.
    Open,
    /// Nodes inside are hidden from listeners outside the shadow tree.
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element { tag: String },
    ShadowRoot { mode: ShadowRootMode },
}

pub(crate) struct NodeInner {
    kind: NodeKind,
    owner: Weak<DocumentState>,
    /// Set only for shadow roots.
    host: Weak<NodeInner>,
    parent: RefCell<Weak<NodeInner>>,
    children: RefCell<Vec<Node>>,
    shadow_root: RefCell<Option<Node>>,
    id: RefCell<Option<String>>,
}

/// Handle to a node in a [`Document`].
#[derive(Clone)]
pub struct Node {
    inner: Rc<NodeInner>,
}

impl Node {
    pub(crate) fn new(kind: NodeKind, owner: Weak<DocumentState>) -> Self {
        Self::with_host(kind, owner, Weak::new())
    }

    fn with_host(kind: NodeKind, owner: Weak<DocumentState>, host: Weak<NodeInner>) -> Self {
        Self {
            inner: Rc::new(NodeInner {
                kind,
                owner,
                host,
                parent: RefCell::new(Weak::new()),
                children: RefCell::new(Vec::new()),
                shadow_root: RefCell::new(None),
                id: RefCell::new(None),
            }),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.inner.kind
    }

    /// Tag name for elements, `None` otherwise.
    #[must_use]
    pub fn tag_name(&self) -> Option<&str> {
        match &self.inner.kind {
            NodeKind::Element { tag } => Some(tag),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_element(&self) -> bool {
        matches!(self.inner.kind, NodeKind::Element { .. })
    }

    #[must_use]
    pub fn is_shadow_root(&self) -> bool {
        matches!(self.inner.kind, NodeKind::ShadowRoot { .. })
    }

    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.inner.id.borrow().clone()
    }

    pub fn set_id(&self, id: impl Into<String>) {
        *self.inner.id.borrow_mut() = Some(id.into());
    }

    #[must_use]
    pub fn parent(&self) -> Option<Node> {
        self.inner.parent.borrow().upgrade().map(|inner| Node { inner })
    }

    #[must_use]
    pub fn children(&self) -> Vec<Node> {
        self.inner.children.borrow().clone()
    }

    /// Host element of a shadow root.
    #[must_use]
    pub fn host(&self) -> Option<Node> {
        self.inner.host.upgrade().map(|inner| Node { inner })
    }

    /// The element's shadow root, if it has an open one.
    #[must_use]
    pub fn shadow_root(&self) -> Option<Node> {
        let root = self.inner.shadow_root.borrow().clone()?;
        match root.inner.kind {
            NodeKind::ShadowRoot {
                mode: ShadowRootMode::Open,
            } => Some(root),
            _ => None,
        }
    }

    #[must_use]
    pub fn owner_document(&self) -> Option<Document> {
        self.inner.owner.upgrade().map(Document::from_state)
    }

    /// Topmost ancestor within this node's own tree (a document, a shadow
    /// root, or the root of a detached subtree).
    #[must_use]
    pub fn root_node(&self) -> Node {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// Whether the node's shadow-including root is its document.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        let mut root = self.root_node();
        while let Some(host) = root.host() {
            root = host.root_node();
        }
        matches!(root.inner.kind, NodeKind::Document)
    }

    /// True if `other` is this node or one of its descendants in the same
    /// tree.
    #[must_use]
    pub fn contains(&self, other: &Node) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node.ptr_eq(self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Append `child` as the last child, detaching it from its previous
    /// parent first.
    pub fn append_child(&self, child: &Node) -> Result<(), HierarchyError> {
        match child.inner.kind {
            NodeKind::Document => return Err(HierarchyError::DocumentInsertion),
            NodeKind::ShadowRoot { .. } => return Err(HierarchyError::ShadowRootInsertion),
            NodeKind::Element { .. } => {}
        }
        if !Weak::ptr_eq(&self.inner.owner, &child.inner.owner) {
            return Err(HierarchyError::WrongDocument);
        }
        if child.is_host_including_ancestor_of(self) {
            return Err(HierarchyError::Cycle);
        }
        child.remove();
        self.link_child(child);
        Ok(())
    }

    /// Append a detached `child` without hierarchy checks.
    pub(crate) fn link_child(&self, child: &Node) {
        *child.inner.parent.borrow_mut() = Rc::downgrade(&self.inner);
        self.inner.children.borrow_mut().push(child.clone());
    }

    pub fn remove_child(&self, child: &Node) -> Result<(), HierarchyError> {
        let position = self
            .inner
            .children
            .borrow()
            .iter()
            .position(|c| c.ptr_eq(child))
            .ok_or(HierarchyError::NotAChild)?;
        self.inner.children.borrow_mut().remove(position);
        *child.inner.parent.borrow_mut() = Weak::new();
        Ok(())
    }

    /// Detach from the current parent, if any.
    pub fn remove(&self) {
        if let Some(parent) = self.parent() {
            // The parent link and the child list always agree.
            let _ = parent.remove_child(self);
        }
    }

    pub fn attach_shadow(&self, mode: ShadowRootMode) -> Result<Node, HierarchyError> {
        if !self.is_element() {
            return Err(HierarchyError::NotAnElement);
        }
        let mut slot = self.inner.shadow_root.borrow_mut();
        if slot.is_some() {
            return Err(HierarchyError::ShadowRootExists);
        }
        let root = Node::with_host(
            NodeKind::ShadowRoot { mode },
            self.inner.owner.clone(),
            Rc::downgrade(&self.inner),
        );
        *slot = Some(root.clone());
        Ok(root)
    }

    /// Dispatch `event` with this node as its target. Returns `false` if a
    /// listener cancelled it.
    pub fn dispatch_event(&self, event: Event) -> bool {
        match self.owner_document() {
            Some(document) => document.dispatch_at(self, event),
            None => true,
        }
    }

    /// Dispatch a composed, bubbling `click` at this node.
    pub fn click(&self) -> bool {
        self.dispatch_event(Event::click())
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Next node on the way to the document: the parent, or the host when
    /// leaving a shadow tree and `composed` allows it.
    pub(crate) fn event_parent(&self, composed: bool) -> Option<Node> {
        match self.parent() {
            Some(parent) => Some(parent),
            None if composed => self.host(),
            None => None,
        }
    }

    /// Whether any shadow root enclosing this node is closed.
    pub(crate) fn in_closed_shadow_tree(&self) -> bool {
        let mut root = self.root_node();
        loop {
            match root.inner.kind {
                NodeKind::ShadowRoot {
                    mode: ShadowRootMode::Closed,
                } => return true,
                NodeKind::ShadowRoot {
                    mode: ShadowRootMode::Open,
                } => match root.host() {
                    Some(host) => root = host.root_node(),
                    None => return false,
                },
                _ => return false,
            }
        }
    }

    fn is_host_including_ancestor_of(&self, node: &Node) -> bool {
        let mut current = Some(node.clone());
        while let Some(n) = current {
            if n.ptr_eq(self) {
                return true;
            }
            current = n.event_parent(true);
        }
        false
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Rc::as_ptr(&self.inner).hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.inner.kind)
            .field("id", &*self.inner.id.borrow())
            .finish()
    }
}
