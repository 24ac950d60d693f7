//! The writer duty (§4.3): a single task draining a bounded outbox,
//! applying the compression policy, and writing frames strictly FIFO.

use bytes::BytesMut;
use protocol::{CompressionPolicy, Message};
use tokio::io::AsyncWrite;
use tokio::sync::{mpsc, oneshot};

use crate::counters::Counters;
use crate::error::ConnectionError;
use crate::io::CountingWriter;
use crate::lifecycle::Lifecycle;

/// One item accepted into the outbox: a message, and an optional one-shot
/// "drained" signal raised after the writer has actually written its bytes.
///
/// The signal carries back the `Vec<u8>` that was serialized as the
/// message's payload (empty for anything but a pool-backed `Response`) so
/// the caller can return it to [`crate::pool::BlockPool`] — §4.4's handoff
/// that avoids returning a buffer to the pool before its bytes have
/// actually left the writer.
pub struct Outgoing {
    pub message: Message,
    pub drain: Option<oneshot::Sender<Vec<u8>>>,
}

impl Outgoing {
    #[must_use]
    pub fn new(message: Message) -> Self {
        Self { message, drain: None }
    }

    #[must_use]
    pub fn with_drain(message: Message, drain: oneshot::Sender<Vec<u8>>) -> Self {
        Self { message, drain: Some(drain) }
    }
}

/// Handle for producers to submit outbound messages. Cloning shares the same
/// channel; backpressure from a full outbox is how "bounded by the writer's
/// progress" (§5) is realized.
#[derive(Clone)]
pub struct Outbox(mpsc::Sender<Outgoing>);

impl Outbox {
    pub async fn send(&self, item: Outgoing) -> Result<(), ConnectionError> {
        self.0.send(item).await.map_err(|_| ConnectionError::Closed)
    }
}

/// Creates a bounded outbox channel; returns the producer handle and the
/// receiving half the writer duty drains.
#[must_use]
pub fn channel(capacity: usize) -> (Outbox, mpsc::Receiver<Outgoing>) {
    let (tx, rx) = mpsc::channel(capacity);
    (Outbox(tx), rx)
}

/// Runs the writer duty until the outbox closes or the connection closes.
///
/// On any serialization or I/O failure, tears the connection down via
/// `lifecycle.fail` (a no-op if something else already has) and returns the
/// error.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub async fn run<W>(
    writer: W,
    mut outbox: mpsc::Receiver<Outgoing>,
    policy: CompressionPolicy,
    counters: Counters,
    lifecycle: Lifecycle,
) -> Result<(), ConnectionError>
where
    W: AsyncWrite + Unpin,
{
    let mut writer = CountingWriter::new(writer, counters);
    let mut scratch = BytesMut::new();
    loop {
        let item = tokio::select! {
            biased;
            () = lifecycle.wait() => return Ok(()),
            item = outbox.recv() => item,
        };

        let Some(item) = item else {
            return Ok(());
        };

        let result = protocol::frame::write_message(&mut writer, &item.message, policy, &mut scratch).await;
        match result {
            Ok(_written) => {
                if let Some(drain) = item.drain {
                    let reclaimed = match item.message {
                        Message::Response { data, .. } => data,
                        _ => Vec::new(),
                    };
                    let _ = drain.send(reclaimed);
                }
            }
            Err(err) => {
                let connection_err: ConnectionError = err.into();
                #[cfg(feature = "tracing")]
                tracing::warn!(err = %connection_err, "writer: frame write failed");
                lifecycle.fail(connection_err.clone());
                return Err(connection_err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multiplexer::Multiplexer;
    use crate::test_support::RecordingModel;
    use std::sync::Arc;

    fn lifecycle() -> Lifecycle {
        Lifecycle::new(
            protocol::DeviceId([0u8; 32]),
            Arc::new(Multiplexer::new()),
            Arc::new(RecordingModel::new()),
        )
    }

    #[tokio::test]
    async fn writes_frames_in_fifo_order() {
        let (outbox, rx) = channel(8);
        let counters = Counters::new();
        let mut sink = Vec::new();

        outbox.send(Outgoing::new(Message::Ping)).await.unwrap();
        outbox
            .send(Outgoing::new(Message::Close { reason: "bye".to_string() }))
            .await
            .unwrap();
        drop(outbox);

        run(&mut sink, rx, CompressionPolicy::Never, counters, lifecycle()).await.unwrap();

        let mut cursor = std::io::Cursor::new(sink);
        let mut scratch = BytesMut::new();
        let first = protocol::frame::read_message(&mut cursor, &mut scratch).await.unwrap();
        let second = protocol::frame::read_message(&mut cursor, &mut scratch).await.unwrap();
        assert_eq!(first, Message::Ping);
        assert_eq!(second, Message::Close { reason: "bye".to_string() });
    }

    #[tokio::test]
    async fn fifo_order_is_preserved_when_a_drain_bearing_response_interleaves_with_plain_messages() {
        let (outbox, rx) = channel(8);
        let counters = Counters::new();
        let mut sink = Vec::new();
        let (drain_tx, drain_rx) = oneshot::channel();

        outbox.send(Outgoing::new(Message::Ping)).await.unwrap();
        let response = Message::Response { id: 1, data: vec![0x01, 0x02], code: 0 };
        outbox.send(Outgoing::with_drain(response, drain_tx)).await.unwrap();
        outbox
            .send(Outgoing::new(Message::Index { folder: "docs".to_string(), files: Vec::new() }))
            .await
            .unwrap();
        drop(outbox);

        run(&mut sink, rx, CompressionPolicy::Never, counters, lifecycle()).await.unwrap();
        assert_eq!(drain_rx.await.unwrap(), vec![0x01, 0x02]);

        let mut cursor = std::io::Cursor::new(sink);
        let mut scratch = BytesMut::new();
        let first = protocol::frame::read_message(&mut cursor, &mut scratch).await.unwrap();
        let second = protocol::frame::read_message(&mut cursor, &mut scratch).await.unwrap();
        let third = protocol::frame::read_message(&mut cursor, &mut scratch).await.unwrap();
        assert_eq!(first, Message::Ping);
        assert_eq!(second, Message::Response { id: 1, data: vec![0x01, 0x02], code: 0 });
        assert_eq!(third, Message::Index { folder: "docs".to_string(), files: Vec::new() });
    }

    #[tokio::test]
    async fn drain_signal_fires_after_write_completes_and_returns_the_buffer() {
        let (outbox, rx) = channel(8);
        let counters = Counters::new();
        let mut sink = Vec::new();
        let (drain_tx, drain_rx) = oneshot::channel();

        let response = Message::Response { id: 7, data: vec![0xde, 0xad, 0xbe, 0xef], code: 0 };
        outbox.send(Outgoing::with_drain(response, drain_tx)).await.unwrap();
        drop(outbox);

        let run_fut = run(&mut sink, rx, CompressionPolicy::Never, counters, lifecycle());
        tokio::pin!(run_fut);
        tokio::select! {
            _ = &mut run_fut => {}
        }
        let reclaimed = drain_rx.await.unwrap();
        assert_eq!(reclaimed, vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(!sink.is_empty());
    }

    #[tokio::test]
    async fn exits_promptly_on_close_signal() {
        let (_outbox, rx) = channel(8);
        let counters = Counters::new();
        let mut sink = Vec::new();
        let lifecycle = lifecycle();
        lifecycle.close();
        run(&mut sink, rx, CompressionPolicy::Never, counters, lifecycle)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn io_failure_triggers_lifecycle_and_returns_transport_error() {
        struct AlwaysFails;
        impl AsyncWrite for AlwaysFails {
            fn poll_write(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
                _buf: &[u8],
            ) -> std::task::Poll<std::io::Result<usize>> {
                std::task::Poll::Ready(Err(std::io::Error::other("disk full")))
            }
            fn poll_flush(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
            ) -> std::task::Poll<std::io::Result<()>> {
                std::task::Poll::Ready(Ok(()))
            }
            fn poll_shutdown(
                self: std::pin::Pin<&mut Self>,
                _cx: &mut std::task::Context<'_>,
            ) -> std::task::Poll<std::io::Result<()>> {
                std::task::Poll::Ready(Ok(()))
            }
        }

        let (outbox, rx) = channel(8);
        let counters = Counters::new();
        outbox.send(Outgoing::new(Message::Ping)).await.unwrap();

        let lifecycle = lifecycle();
        let err = run(AlwaysFails, rx, CompressionPolicy::Never, counters, lifecycle.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::Transport(_)));
        assert!(lifecycle.is_closed());
    }
}
