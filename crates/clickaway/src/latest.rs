#![forbid(unsafe_code)]

//! Latest-value cell.
//!
//! A registered listener must keep its identity across renders while still
//! calling whatever callback the newest render supplied. The listener holds
//! a clone of a [`Latest`] and reads it at call time; each render writes
//! the new callback into it.
//!
//! # Invariants
//!
//! 1. Clones share one slot: a `replace` through any clone is seen by all.
//! 2. `current` returns an owned `Rc`, so the slot is never borrowed while
//!    the value runs. A callback may therefore replace itself.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub struct Latest<T: ?Sized> {
    cell: Rc<RefCell<Rc<T>>>,
}

impl<T: ?Sized> Latest<T> {
    pub fn new(value: Rc<T>) -> Self {
        Self {
            cell: Rc::new(RefCell::new(value)),
        }
    }

    /// Store `value`, returning the previous one.
    pub fn replace(&self, value: Rc<T>) -> Rc<T> {
        self.cell.replace(value)
    }

    #[must_use]
    pub fn current(&self) -> Rc<T> {
        Rc::clone(&self.cell.borrow())
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T: ?Sized> Clone for Latest<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Latest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Latest")
            .field("holders", &Rc::strong_count(&self.cell))
            .finish_non_exhaustive()
    }
}
