#![forbid(unsafe_code)]

//! Host-driven DOM model for clickaway.
//!
//! The watchers and the font loader in the `clickaway` crate need a DOM-like
//! host: a document to register listeners on, an event dispatch that computes
//! targets and composed paths, an idle-callback queue and a font registry.
//! This crate provides that host as a deterministic model. Nothing happens on
//! its own: the embedder dispatches events, runs idle periods, advances the
//! simulated clock and polls pending asynchronous work.
//!
//! # Architecture
//!
//! Every handle ([`Node`], [`Document`], [`Window`], [`FontFace`]) is an
//! `Rc` around shared interior state, so clones refer to the same object and
//! equality is identity. The model is single-threaded, like the browser main
//! thread it stands in for.
//!
//! # Example
//!
//! ```
//! use clickaway_dom::{Document, EventListener, ListenerOptions};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let document = Document::new();
//! let panel = document.create_element("div");
//! document.body().append_child(&panel).unwrap();
//!
//! let clicks = Rc::new(Cell::new(0));
//! let seen = Rc::clone(&clicks);
//! let listener = EventListener::new(move |_| seen.set(seen.get() + 1));
//! document.add_event_listener("click", &listener, ListenerOptions::default());
//!
//! panel.click();
//! assert_eq!(clicks.get(), 1);
//! ```

pub mod document;
pub mod error;
pub mod event;
pub mod font;
pub mod idle;
pub mod listener;
pub mod node;
pub mod window;

pub use document::Document;
pub use error::{FetchError, FontLoadError, HierarchyError};
pub use event::{Event, EventInit};
pub use font::{
    FontFace, FontFaceDescriptors, FontFaceLoad, FontFaceLoadStatus, FontFaceSet, FontFetcher,
    FontFormat, FontSource, SrcEntry, StaticFontFetcher, parse_src,
};
pub use idle::{IdleCallbackHandle, IdleDeadline, IdleRequestOptions};
pub use listener::{EventListener, ListenerOptions};
pub use node::{Node, NodeKind, ShadowRootMode};
pub use window::Window;
