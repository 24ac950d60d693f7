//! The single process-wide "closed" signal every duty selects against.
//!
//! `std::sync::Once` can't run async code, so the close routine needs its
//! own guard: an `AtomicBool` compare-exchange decides who runs the teardown
//! body, and a `tokio::sync::Notify` wakes everyone waiting on
//! [`Closed::wait`]. The teacher workspace's `tokio-util` dependency only
//! exists for its codec feature (dropped — see `DESIGN.md`), so rather than
//! pull in the rest of `tokio-util` for `CancellationToken`, this is a
//! minimal purpose-built equivalent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    closed: AtomicBool,
    notify: Notify,
}

/// A cloneable, one-way close signal. Cloning shares the same underlying
/// state; there is no way to "un-close".
#[derive(Debug, Clone, Default)]
pub struct Closed(Arc<Inner>);

impl Closed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if [`Self::trigger`] has already run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.0.closed.load(Ordering::Acquire)
    }

    /// Marks the signal closed and wakes every waiter. Returns `true` if
    /// this call is the one that performed the transition (i.e. the caller
    /// should run the one-shot teardown body); subsequent calls return
    /// `false`.
    pub fn trigger(&self) -> bool {
        let first = self
            .0
            .closed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        self.0.notify.notify_waiters();
        first
    }

    /// Resolves once [`Self::trigger`] has run. Resolves immediately if it
    /// already has.
    pub async fn wait(&self) {
        // `notified()` only starts listening for a wakeup once it's been
        // polled; if the `is_closed()` check ran first, a `trigger()` landing
        // in between would call `notify_waiters()` before anyone is
        // registered to receive it, and that notification is lost (it's not
        // a permit). `enable()` registers this waiter before the check, so a
        // `trigger()` racing with it is observed either by the guard or by
        // the notification, never by neither.
        let notified = self.0.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_closed() {
            return;
        }
        notified.await;
    }
}
