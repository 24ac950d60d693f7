//! Request/response multiplexing (§4.5): monotonic ID allocation and the
//! waiter registry pairing outgoing `Request`s with their eventual
//! `Response`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::error::RequestOutcome;

/// Mutex-protected mapping from request ID to a single-use delivery slot.
/// Held only for O(1) operations; never across I/O or the model callback.
#[derive(Debug, Default)]
pub struct Multiplexer {
    next_id: AtomicI32,
    waiters: Mutex<HashMap<i32, oneshot::Sender<RequestOutcome>>>,
}

impl Multiplexer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next request ID and registers a fresh delivery slot for
    /// it. Returns the ID and the receiving half of the slot.
    pub fn register(&self) -> (i32, oneshot::Receiver<RequestOutcome>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        let previous = self.waiters.lock().unwrap().insert(id, tx);
        debug_assert!(previous.is_none(), "request id {id} reused while still in flight");
        (id, rx)
    }

    /// Delivers `outcome` to the waiter registered under `id`, if any.
    /// Silently discards if no waiter is registered (§4.5: unmatched
    /// `Response`s are dropped, not errors).
    pub fn resolve(&self, id: i32, outcome: RequestOutcome) {
        if let Some(tx) = self.waiters.lock().unwrap().remove(&id) {
            let _ = tx.send(outcome);
        }
    }

    /// Removes a single waiter without resolving it, dropping its sender so
    /// the matching receiver observes cancellation. Used when a `Request`
    /// could not even be enqueued (the outbox closed first) — there's
    /// nothing to await a response for.
    pub fn cancel_one(&self, id: i32) {
        self.waiters.lock().unwrap().remove(&id);
    }

    /// Cancels every outstanding waiter by dropping its sender, which
    /// resolves the matching receiver with `RecvError` (the close routine
    /// maps that to [`crate::error::ConnectionError::Closed`]). Clears the
    /// registry.
    pub fn cancel_all(&self) {
        self.waiters.lock().unwrap().clear();
    }

    /// Number of outstanding waiters. Exposed for tests.
    #[cfg(test)]
    pub fn pending_count(&self) -> usize {
        self.waiters.lock().unwrap().len()
    }
}
