//! Broadcast cancellation with interruptible timed waits.
//!
//! A [`CancellationSignal`] is a generation counter behind a mutex plus a
//! condition variable.  [`cancel`](CancellationSignal::cancel) bumps the
//! generation and wakes every waiter.  Nothing is latched: a cancel is a
//! point in time, and a wait only observes cancels that happen after the
//! generation it was armed against.
//!
//! Actuation workers and solenoid watchdogs receive a [`CancelToken`] armed
//! *before* their thread is spawned, so a cancel issued between spawn and
//! the worker's first wait still counts.  A fresh worker gets a fresh token
//! and therefore never inherits an earlier cancel.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

pub struct CancellationSignal {
    generation: Mutex<u64>,
    cond: Condvar,
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self {
            generation: Mutex::new(0),
            cond: Condvar::new(),
        }
    }

    /// Wake every current waiter.
    pub fn cancel(&self) {
        let mut generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        *generation = generation.wrapping_add(1);
        self.cond.notify_all();
    }

    /// Block until the next [`cancel`](Self::cancel) or until `timeout`
    /// elapses.  Returns `true` if cancelled.  `None` waits forever.
    pub fn wait(&self, timeout: Option<Duration>) -> bool {
        let armed = self.current();
        self.wait_since(armed, timeout, None)
    }

    /// Capture the current generation into a token that can be moved into
    /// a worker thread.
    pub fn arm(self: &Arc<Self>) -> CancelToken {
        CancelToken {
            signal: Arc::clone(self),
            armed: self.current(),
            deadline: None,
        }
    }

    fn current(&self) -> u64 {
        *self.generation.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_since(&self, armed: u64, timeout: Option<Duration>, deadline: Option<Instant>) -> bool {
        let timeout_at = timeout.and_then(|t| Instant::now().checked_add(t));
        let end = match (timeout_at, deadline) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        let mut generation = self.generation.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if *generation != armed {
                return true;
            }
            match end {
                // No timeout, no deadline (or the timeout overflowed `Instant`).
                None => {
                    generation = self.cond.wait(generation).unwrap_or_else(PoisonError::into_inner);
                }
                Some(end) => {
                    let now = Instant::now();
                    if now >= end {
                        return deadline.is_some_and(|d| now >= d);
                    }
                    generation = self
                        .cond
                        .wait_timeout(generation, end - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0;
                }
            }
        }
    }
}

/// A [`CancellationSignal`] armed at a fixed generation, optionally with a
/// deadline after which every wait reports cancellation.
#[derive(Clone)]
pub struct CancelToken {
    signal: Arc<CancellationSignal>,
    armed: u64,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// Expire the token `after` from now.  Used for timed tones.
    #[must_use]
    pub fn with_deadline(mut self, after: Duration) -> Self {
        self.deadline = Instant::now().checked_add(after);
        self
    }

    /// Sleep up to `timeout` (forever if `None`).  Returns `true` if the
    /// signal was cancelled since arming or the deadline has passed.
    pub fn wait(&self, timeout: Option<Duration>) -> bool {
        self.signal.wait_since(self.armed, timeout, self.deadline)
    }

    /// Whether the deadline (if any) has passed.  Lets a worker tell a
    /// timed-out tone apart from an explicit cancel.
    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}
