#![forbid(unsafe_code)]

//! Idle-callback queue driven by the host.
//!
//! Callbacks run only when the host opens an idle period
//! ([`Window::run_idle_period`](crate::Window::run_idle_period)) or when the
//! simulated clock passes a callback's timeout
//! ([`Window::advance_time`](crate::Window::advance_time)).
//!
//! # Invariants
//!
//! 1. Callbacks run at most once, in request order within a period.
//! 2. A callback requested while a period is running waits for the next
//!    period (or its timeout).
//! 3. A cancelled callback never runs, even if it was already picked for the
//!    current period.

use std::collections::VecDeque;

use web_time::Duration;

/// Options of `requestIdleCallback`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IdleRequestOptions {
    /// Run the callback anyway once this much simulated time has passed.
    pub timeout: Option<Duration>,
}

impl IdleRequestOptions {
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

/// Argument handed to idle callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleDeadline {
    time_remaining: Duration,
    did_timeout: bool,
}

impl IdleDeadline {
    #[must_use]
    pub fn time_remaining(&self) -> Duration {
        self.time_remaining
    }

    /// True when the callback runs because its timeout elapsed.
    #[must_use]
    pub fn did_timeout(&self) -> bool {
        self.did_timeout
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdleCallbackHandle(u64);

type IdleCallback = Box<dyn FnOnce(IdleDeadline)>;

struct PendingIdle {
    handle: IdleCallbackHandle,
    callback: IdleCallback,
    /// Simulated time at which the timeout fires.
    due: Option<Duration>,
}

#[derive(Default)]
pub(crate) struct IdleQueue {
    next_handle: u64,
    now: Duration,
    pending: VecDeque<PendingIdle>,
}

impl IdleQueue {
    pub(crate) fn request(
        &mut self,
        callback: IdleCallback,
        options: IdleRequestOptions,
    ) -> IdleCallbackHandle {
        self.next_handle += 1;
        let handle = IdleCallbackHandle(self.next_handle);
        self.pending.push_back(PendingIdle {
            handle,
            callback,
            due: options.timeout.map(|timeout| self.now + timeout),
        });
        handle
    }

    pub(crate) fn cancel(&mut self, handle: IdleCallbackHandle) -> bool {
        self.take(handle).is_some()
    }

    pub(crate) fn take(&mut self, handle: IdleCallbackHandle) -> Option<IdleCallback> {
        let index = self.pending.iter().position(|p| p.handle == handle)?;
        self.pending.remove(index).map(|p| p.callback)
    }

    /// Handles queued right now, in request order.
    pub(crate) fn queued(&self) -> Vec<IdleCallbackHandle> {
        self.pending.iter().map(|p| p.handle).collect()
    }

    /// Advance the clock and return the handles whose timeout has passed.
    pub(crate) fn advance(&mut self, delta: Duration) -> Vec<IdleCallbackHandle> {
        self.now += delta;
        let now = self.now;
        self.pending
            .iter()
            .filter(|p| p.due.is_some_and(|due| due <= now))
            .map(|p| p.handle)
            .collect()
    }

    pub(crate) fn now(&self) -> Duration {
        self.now
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }
}

pub(crate) fn deadline(time_remaining: Duration, did_timeout: bool) -> IdleDeadline {
    IdleDeadline {
        time_remaining,
        did_timeout,
    }
}
