#![forbid(unsafe_code)]

//! The browsing context: a document plus the host-driven schedulers.
//!
//! A [`Window`] owns three queues the embedder pumps explicitly:
//!
//! - idle callbacks ([`run_idle_period`](Window::run_idle_period),
//!   [`advance_time`](Window::advance_time)),
//! - microtasks, i.e. spawned local futures
//!   ([`run_until_stalled`](Window::run_until_stalled)),
//! - nothing else: event dispatch is synchronous.
//!
//! A microtask checkpoint runs after every idle callback, as in the browser.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::{LocalSpawnExt, SpawnError};
use tracing::{debug, trace};
use web_time::Duration;

use crate::document::Document;
use crate::font::{FontFace, FontFaceDescriptors, FontFetcher, FontSource};
use crate::idle::{self, IdleCallbackHandle, IdleDeadline, IdleQueue, IdleRequestOptions};

struct WindowState {
    document: Document,
    idle: RefCell<IdleQueue>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
    fetcher: RefCell<Option<Rc<dyn FontFetcher>>>,
}

/// Shared handle to a browsing context.
#[derive(Clone)]
pub struct Window {
    state: Rc<WindowState>,
}

impl Window {
    #[must_use]
    pub fn new() -> Self {
        Self::with_document(Document::new())
    }

    #[must_use]
    pub fn with_document(document: Document) -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            state: Rc::new(WindowState {
                document,
                idle: RefCell::new(IdleQueue::default()),
                pool: RefCell::new(pool),
                spawner,
                fetcher: RefCell::new(None),
            }),
        }
    }

    /// Install the fetcher used for `url()` and `local()` font sources.
    #[must_use]
    pub fn with_font_fetcher(self, fetcher: impl FontFetcher + 'static) -> Self {
        self.set_font_fetcher(Rc::new(fetcher));
        self
    }

    pub fn set_font_fetcher(&self, fetcher: Rc<dyn FontFetcher>) {
        *self.state.fetcher.borrow_mut() = Some(fetcher);
    }

    #[must_use]
    pub fn font_fetcher(&self) -> Option<Rc<dyn FontFetcher>> {
        self.state.fetcher.borrow().clone()
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.state.document
    }

    /// `new FontFace(...)` in this window: the face fetches through the
    /// window's font fetcher.
    #[must_use]
    pub fn create_font_face(
        &self,
        family: impl Into<String>,
        source: FontSource,
        descriptors: FontFaceDescriptors,
    ) -> FontFace {
        FontFace::with_fetcher(family, source, descriptors, self.font_fetcher())
    }

    pub fn request_idle_callback(
        &self,
        callback: impl FnOnce(IdleDeadline) + 'static,
        options: IdleRequestOptions,
    ) -> IdleCallbackHandle {
        let handle = self
            .state
            .idle
            .borrow_mut()
            .request(Box::new(callback), options);
        debug!(?handle, timeout = ?options.timeout, "idle callback requested");
        handle
    }

    pub fn cancel_idle_callback(&self, handle: IdleCallbackHandle) -> bool {
        self.state.idle.borrow_mut().cancel(handle)
    }

    #[must_use]
    pub fn pending_idle_callbacks(&self) -> usize {
        self.state.idle.borrow().len()
    }

    /// Simulated time since the window was created.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.state.idle.borrow().now()
    }

    /// Open an idle period of `budget` and run every callback queued before
    /// this call. Returns how many callbacks ran.
    pub fn run_idle_period(&self, budget: Duration) -> usize {
        let handles = self.state.idle.borrow().queued();
        let mut ran = 0;
        for handle in handles {
            if self.run_idle_callback(handle, idle::deadline(budget, false)) {
                ran += 1;
            }
        }
        trace!(ran, "idle period finished");
        ran
    }

    /// Move the simulated clock forward and run callbacks whose timeout
    /// elapsed. Returns how many callbacks ran.
    pub fn advance_time(&self, delta: Duration) -> usize {
        let due = self.state.idle.borrow_mut().advance(delta);
        let mut ran = 0;
        for handle in due {
            if self.run_idle_callback(handle, idle::deadline(Duration::ZERO, true)) {
                ran += 1;
            }
        }
        ran
    }

    /// Queue a microtask.
    pub fn spawn_local(&self, future: impl Future<Output = ()> + 'static) -> Result<(), SpawnError> {
        self.state.spawner.spawn_local(future)
    }

    /// Poll queued microtasks until none can make progress. A nested call
    /// from inside a microtask returns immediately.
    pub fn run_until_stalled(&self) {
        match self.state.pool.try_borrow_mut() {
            Ok(mut pool) => pool.run_until_stalled(),
            Err(_) => trace!("microtask checkpoint already running"),
        }
    }

    fn run_idle_callback(&self, handle: IdleCallbackHandle, deadline: IdleDeadline) -> bool {
        let Some(callback) = self.state.idle.borrow_mut().take(handle) else {
            return false;
        };
        callback(deadline);
        self.run_until_stalled();
        true
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("document", &self.state.document)
            .field("pending_idle", &self.state.idle.borrow().len())
            .field("has_font_fetcher", &self.state.fetcher.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[test]
    fn idle_callbacks_run_in_request_order() {
        let window = Window::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let log = Rc::clone(&log);
            window.request_idle_callback(
                move |_| log.borrow_mut().push(tag),
                IdleRequestOptions::default(),
            );
        }
        assert_eq!(window.run_idle_period(Duration::from_millis(50)), 3);
        assert_eq!(*log.borrow(), ["a", "b", "c"]);
        assert_eq!(window.pending_idle_callbacks(), 0);
    }

    #[test]
    fn callbacks_requested_during_a_period_wait_for_the_next() {
        let window = Window::new();
        let count = Rc::new(Cell::new(0));
        let inner_window = window.clone();
        let inner_count = Rc::clone(&count);
        window.request_idle_callback(
            move |_| {
                let nested = Rc::clone(&inner_count);
                inner_window.request_idle_callback(
                    move |_| nested.set(nested.get() + 1),
                    IdleRequestOptions::default(),
                );
            },
            IdleRequestOptions::default(),
        );
        assert_eq!(window.run_idle_period(Duration::from_millis(16)), 1);
        assert_eq!(count.get(), 0);
        assert_eq!(window.run_idle_period(Duration::from_millis(16)), 1);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn cancelled_callback_never_runs() {
        let window = Window::new();
        let count = Rc::new(Cell::new(0));

        let later = Rc::new(Cell::new(None));
        let canceller_window = window.clone();
        let canceller_target = Rc::clone(&later);
        window.request_idle_callback(
            move |_| {
                if let Some(handle) = canceller_target.get() {
                    assert!(canceller_window.cancel_idle_callback(handle));
                }
            },
            IdleRequestOptions::default(),
        );
        let seen = Rc::clone(&count);
        let handle = window.request_idle_callback(
            move |_| seen.set(seen.get() + 1),
            IdleRequestOptions::default(),
        );
        later.set(Some(handle));

        assert_eq!(window.run_idle_period(Duration::from_millis(16)), 1);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn timeout_runs_callback_with_did_timeout() {
        let window = Window::new();
        let seen = Rc::new(Cell::new(None));
        let sink = Rc::clone(&seen);
        window.request_idle_callback(
            move |deadline| sink.set(Some(deadline.did_timeout())),
            IdleRequestOptions::with_timeout(Duration::from_millis(100)),
        );
        assert_eq!(window.advance_time(Duration::from_millis(99)), 0);
        assert_eq!(window.advance_time(Duration::from_millis(1)), 1);
        assert_eq!(seen.get(), Some(true));
        assert_eq!(window.run_idle_period(Duration::from_millis(16)), 0);
    }

    #[test]
    fn idle_deadline_reports_budget() {
        let window = Window::new();
        let seen = Rc::new(Cell::new(Duration::ZERO));
        let sink = Rc::clone(&seen);
        window.request_idle_callback(
            move |deadline| sink.set(deadline.time_remaining()),
            IdleRequestOptions::default(),
        );
        window.run_idle_period(Duration::from_millis(12));
        assert_eq!(seen.get(), Duration::from_millis(12));
    }

    #[test]
    fn microtasks_run_after_each_idle_callback() {
        let window = Window::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let spawn_window = window.clone();
        let task_log = Rc::clone(&log);
        window.request_idle_callback(
            move |_| {
                let log = Rc::clone(&task_log);
                spawn_window
                    .spawn_local(async move { log.borrow_mut().push("microtask") })
                    .unwrap();
                task_log.borrow_mut().push("idle-1");
            },
            IdleRequestOptions::default(),
        );
        let second_log = Rc::clone(&log);
        window.request_idle_callback(
            move |_| second_log.borrow_mut().push("idle-2"),
            IdleRequestOptions::default(),
        );
        window.run_idle_period(Duration::from_millis(16));
        assert_eq!(*log.borrow(), ["idle-1", "microtask", "idle-2"]);
    }

    #[test]
    fn nested_checkpoint_is_a_no_op() {
        let window = Window::new();
        let inner = window.clone();
        let done = Rc::new(Cell::new(false));
        let flag = Rc::clone(&done);
        window
            .spawn_local(async move {
                inner.run_until_stalled();
                flag.set(true);
            })
            .unwrap();
        window.run_until_stalled();
        assert!(done.get());
    }
}
