//! Connection lifecycle (§4.6): the single-shot close routine composing
//! the closed signal, waiter cancellation, and the model's one-time
//! `Close` notification.
//!
//! Every duty (reader, writer, ping receiver) and the public `Connection`
//! API share a [`Lifecycle`] handle. Whichever one first observes a
//! terminal condition calls [`Lifecycle::fail`]; everyone else's call is a
//! no-op, matching "close is idempotent: exactly one closure executes".

use std::sync::Arc;

use protocol::DeviceId;

use crate::closed::Closed;
use crate::error::ConnectionError;
use crate::model::Model;
use crate::multiplexer::Multiplexer;

/// Cloneable handle shared by every duty and the public `Connection` API to
/// observe and trigger connection teardown.
#[derive(Clone)]
pub struct Lifecycle {
    device: DeviceId,
    closed: Closed,
    multiplexer: Arc<Multiplexer>,
    model: Arc<dyn Model>,
}

impl Lifecycle {
    #[must_use]
    pub fn new(device: DeviceId, multiplexer: Arc<Multiplexer>, model: Arc<dyn Model>) -> Self {
        Self { device, closed: Closed::new(), multiplexer, model }
    }

    /// `true` once [`Self::fail`] (or [`Self::close`]) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_closed()
    }

    /// Resolves once the connection has closed. Resolves immediately if it
    /// already has.
    pub async fn wait(&self) {
        self.closed.wait().await;
    }

    /// Tears the connection down with `err` as the root cause, unless
    /// already closed. Cancels every outstanding waiter synchronously (it's
    /// an O(1)-per-waiter lock, never held across I/O) and notifies the
    /// model asynchronously, so the caller — a reader/writer/keepalive duty
    /// mid-loop — isn't blocked on the model callback completing.
    pub fn fail(&self, err: ConnectionError) {
        if self.closed.trigger() {
            #[cfg(feature = "tracing")]
            tracing::debug!(device = %self.device, %err, "lifecycle: closing");
            self.multiplexer.cancel_all();
            let model = Arc::clone(&self.model);
            let device = self.device;
            tokio::spawn(async move {
                model.close(device, err).await;
            });
        }
    }

    /// Explicit, non-faulting teardown (a caller-initiated close rather
    /// than a reader/writer/keepalive error), reported to the model as
    /// [`ConnectionError::Closed`].
    pub fn close(&self) {
        self.fail(ConnectionError::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::RecordingModel;

    #[tokio::test]
    async fn fail_notifies_model_exactly_once_under_concurrent_calls() {
        let model = Arc::new(RecordingModel::new());
        let lifecycle = Lifecycle::new(
            protocol::DeviceId([0u8; 32]),
            Arc::new(Multiplexer::new()),
            model.clone(),
        );

        let mut handles = Vec::new();
        for _ in 0..8 {
            let lifecycle = lifecycle.clone();
            handles.push(tokio::spawn(async move {
                lifecycle.fail(ConnectionError::Protocol("boom".to_string()));
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        assert_eq!(model.close_count(), 1);
        assert!(lifecycle.is_closed());
    }

    #[tokio::test]
    async fn fail_cancels_every_waiter() {
        let model = Arc::new(RecordingModel::new());
        let mux = Arc::new(Multiplexer::new());
        let lifecycle = Lifecycle::new(protocol::DeviceId([0u8; 32]), Arc::clone(&mux), model);
        let (_, rx1) = mux.register();
        let (_, rx2) = mux.register();

        lifecycle.fail(ConnectionError::Closed);

        assert!(rx1.await.is_err());
        assert!(rx2.await.is_err());
    }

    #[tokio::test]
    async fn is_closed_observable_before_the_model_callback_resolves() {
        struct BlockingCloseModel {
            gate: tokio::sync::Notify,
        }

        impl Model for BlockingCloseModel {
            fn index(&self, _: DeviceId, _: String, _: Vec<protocol::message::FileInfo>) -> crate::model::BoxFuture<'_, ()> {
                Box::pin(async {})
            }
            fn index_update(&self, _: DeviceId, _: String, _: Vec<protocol::message::FileInfo>) -> crate::model::BoxFuture<'_, ()> {
                Box::pin(async {})
            }
            fn request<'a>(
                &'a self,
                _: DeviceId,
                _: String,
                _: String,
                _: i64,
                _: i32,
                _: Vec<u8>,
                _: bool,
                _: &'a mut [u8],
            ) -> crate::model::BoxFuture<'a, Result<(), protocol::codes::ResponseError>> {
                Box::pin(async { Ok(()) })
            }
            fn cluster_config(&self, _: DeviceId, _: protocol::message::ClusterConfig) -> crate::model::BoxFuture<'_, ()> {
                Box::pin(async {})
            }
            fn close(&self, _: DeviceId, _: ConnectionError) -> crate::model::BoxFuture<'_, ()> {
                Box::pin(self.gate.notified())
            }
            fn download_progress(
                &self,
                _: DeviceId,
                _: String,
                _: Vec<protocol::message::FileDownloadProgressUpdate>,
            ) -> crate::model::BoxFuture<'_, ()> {
                Box::pin(async {})
            }
        }

        let model = Arc::new(BlockingCloseModel { gate: tokio::sync::Notify::new() });
        let lifecycle = Lifecycle::new(
            protocol::DeviceId([0u8; 32]),
            Arc::new(Multiplexer::new()),
            model.clone(),
        );

        lifecycle.fail(ConnectionError::Closed);
        assert!(lifecycle.is_closed());

        model.gate.notify_one();
    }

    #[tokio::test]
    async fn second_fail_keeps_first_error_as_root_cause() {
        let model = Arc::new(RecordingModel::new());
        let lifecycle = Lifecycle::new(
            protocol::DeviceId([0u8; 32]),
            Arc::new(Multiplexer::new()),
            model.clone(),
        );

        lifecycle.fail(ConnectionError::RemoteClose { reason: "bye".to_string() });
        lifecycle.fail(ConnectionError::Timeout);
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        assert_eq!(model.close_count(), 1);
        let events = model.events();
        let crate::test_support::Event::Close { error, .. } = events.last().unwrap() else {
            panic!("expected a Close event");
        };
        assert!(error.contains("bye"));
    }
}
