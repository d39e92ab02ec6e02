#![forbid(unsafe_code)]

//! Outside-click watchers and idle-time font loading.
//!
//! Three independent components, each mounted against a
//! [`clickaway_dom`] host:
//!
//! - [`OutsideClickWatcher`]: fires a callback when an event lands outside
//!   every tracked element. The callback may be swapped on every render
//!   without re-registering listeners.
//! - [`SingleOutsideClickWatcher`]: the same for one element, which may be
//!   given directly, through a resolver, or assigned later to the returned
//!   [`ElementHandle`]. Shadow-DOM targets are recognised through the
//!   event's composed path.
//! - [`IdleFontLoader`]: registers and loads web fonts during the next idle
//!   period.
//!
//! Watchers follow a mount / rerender / unmount lifecycle: `mount` registers
//! listeners, `rerender` applies new props and re-registers only when the
//! listener's dependencies changed, and dropping the watcher removes exactly
//! the listeners it added.
//!
//! # Example
//!
//! ```
//! use clickaway::{ElementRef, OutsideClickProps, OutsideClickWatcher, TrackedElements};
//! use clickaway_dom::Document;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let document = Document::new();
//! let menu = document.create_element("div");
//! document.body().append_child(&menu).unwrap();
//!
//! let closed = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&closed);
//! let targets = TrackedElements::new([ElementRef::Direct(menu.clone())]);
//! let _watcher = OutsideClickWatcher::mount(
//!     &document,
//!     OutsideClickProps::new(targets, move || counter.set(counter.get() + 1)),
//! );
//!
//! menu.click();
//! assert_eq!(closed.get(), 0);
//! document.body().click();
//! assert_eq!(closed.get(), 1);
//! ```

pub mod element_ref;
pub mod error;
pub mod fonts;
pub mod latest;
pub mod outside_click;
mod registration;
pub mod single_click;

pub use element_ref::{ElementHandle, ElementRef, ElementResolver, TrackedElements};
pub use error::{FontLoaderError, Result};
pub use fonts::{FontBatch, FontDescriptor, FontLoadCompletion, IdleFontLoader};
pub use latest::Latest;
pub use outside_click::{
    EventTypes, OutsideClickCallback, OutsideClickInvoker, OutsideClickProps, OutsideClickWatcher,
};
pub use single_click::{ClickAwayHandler, SingleClickProps, SingleOutsideClickWatcher};

pub mod prelude {
    pub use crate::{
        ElementHandle, ElementRef, EventTypes, FontDescriptor, IdleFontLoader, OutsideClickProps,
        OutsideClickWatcher, SingleClickProps, SingleOutsideClickWatcher, TrackedElements,
    };
    pub use clickaway_dom as dom;
}
