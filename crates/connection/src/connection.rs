//! The public façade (§6 "Connection API"): wires the reader, writer, and
//! keepalive duties together behind a small peer-facing method set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinSet;

use protocol::message::{ClusterConfig, FileDownloadProgressUpdate, FileInfo};
use protocol::{DeviceId, Message};

use crate::counters::{Counters, Statistics};
use crate::error::{ConnectionError, RequestError};
use crate::keepalive;
use crate::lifecycle::Lifecycle;
use crate::model::Model;
use crate::multiplexer::Multiplexer;
use crate::options::ConnectionOptions;
use crate::pool::BlockPool;
use crate::reader;
use crate::writer::{self, Outbox, Outgoing};

/// A peer connection built from a reader half, a writer half, the peer's
/// identity, a model callback sink, and a compression policy (bundled into
/// [`ConnectionOptions`]).
///
/// Constructed in state `Initial`; no duty runs until [`Connection::start`]
/// is called, exactly once.
pub struct Connection<R, W> {
    device: DeviceId,
    name: String,
    model: Arc<dyn Model>,
    options: ConnectionOptions,
    lifecycle: Lifecycle,
    multiplexer: Arc<Multiplexer>,
    pool: Arc<BlockPool>,
    counters: Counters,
    outbox: Outbox,
    outbox_rx: Mutex<Option<tokio::sync::mpsc::Receiver<Outgoing>>>,
    reader: Mutex<Option<R>>,
    writer: Mutex<Option<W>>,
    started: AtomicBool,
    duties: Mutex<Option<JoinSet<Result<(), ConnectionError>>>>,
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Builds a new, unstarted connection.
    #[must_use]
    pub fn new(
        reader: R,
        writer: W,
        device: DeviceId,
        name: String,
        model: Arc<dyn Model>,
        options: ConnectionOptions,
    ) -> Self {
        let multiplexer = Arc::new(Multiplexer::new());
        let lifecycle = Lifecycle::new(device, Arc::clone(&multiplexer), Arc::clone(&model));
        let (outbox, outbox_rx) = writer::channel(options.outbox_capacity);
        Self {
            device,
            name,
            model,
            options,
            lifecycle,
            multiplexer,
            pool: Arc::new(BlockPool::new()),
            counters: Counters::new(),
            outbox,
            outbox_rx: Mutex::new(Some(outbox_rx)),
            reader: Mutex::new(Some(reader)),
            writer: Mutex::new(Some(writer)),
            started: AtomicBool::new(false),
            duties: Mutex::new(None),
        }
    }

    /// Spawns the four long-lived duties (reader, writer, ping sender, ping
    /// receiver). A no-op on every call after the first.
    pub fn start(&self) {
        if self.started.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return;
        }

        let reader = self.reader.lock().unwrap().take().expect("reader taken before start");
        let writer = self.writer.lock().unwrap().take().expect("writer taken before start");
        let outbox_rx = self.outbox_rx.lock().unwrap().take().expect("start invoked twice");

        let mut duties = JoinSet::new();
        duties.spawn(reader::run(
            reader,
            self.device,
            self.lifecycle.clone(),
            Arc::clone(&self.multiplexer),
            Arc::clone(&self.pool),
            self.outbox.clone(),
            self.counters.clone(),
            Arc::clone(&self.model),
        ));
        duties.spawn(writer::run(
            writer,
            outbox_rx,
            self.options.compression_policy,
            self.counters.clone(),
            self.lifecycle.clone(),
        ));
        duties.spawn(keepalive::run_ping_sender(
            self.outbox.clone(),
            self.counters.clone(),
            self.lifecycle.clone(),
            self.options.ping_send_tick,
        ));
        duties.spawn(keepalive::run_ping_receiver(
            self.counters.clone(),
            self.lifecycle.clone(),
            self.options.ping_receive_tick,
            self.options.receive_timeout,
        ));

        *self.duties.lock().unwrap() = Some(duties);
    }

    /// The peer's identity.
    #[must_use]
    pub fn id(&self) -> DeviceId {
        self.device
    }

    /// The caller-supplied human-readable label for this connection.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `true` once the connection has closed, for any reason.
    #[must_use]
    pub fn closed(&self) -> bool {
        self.lifecycle.is_closed()
    }

    /// A consistent snapshot of byte totals.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        self.counters.snapshot()
    }

    /// Sends a full file listing for `folder`.
    pub async fn index(&self, folder: String, files: Vec<FileInfo>) -> Result<(), ConnectionError> {
        self.outbox.send(Outgoing::new(Message::Index { folder, files })).await
    }

    /// Sends an incremental update to a previously sent index.
    pub async fn index_update(&self, folder: String, files: Vec<FileInfo>) -> Result<(), ConnectionError> {
        self.outbox.send(Outgoing::new(Message::IndexUpdate { folder, files })).await
    }

    /// Announces folder and device membership; conventionally the first
    /// message sent on a freshly started connection.
    pub async fn cluster_config(&self, config: ClusterConfig) -> Result<(), ConnectionError> {
        self.outbox.send(Outgoing::new(Message::ClusterConfig(config))).await
    }

    /// Sends an informational download-progress notice.
    pub async fn download_progress(
        &self,
        folder: String,
        updates: Vec<FileDownloadProgressUpdate>,
    ) -> Result<(), ConnectionError> {
        self.outbox.send(Outgoing::new(Message::DownloadProgress { folder, updates })).await
    }

    /// Requests a block of file content from the peer and awaits the
    /// matching reply.
    ///
    /// Resolves with the block bytes on success, the remote's
    /// [`protocol::codes::ResponseError`] if it declined the request, or a
    /// [`ConnectionError`] (most commonly `Closed`) if the connection ends
    /// before a reply arrives.
    #[allow(clippy::too_many_arguments)]
    pub async fn request(
        &self,
        folder: String,
        name: String,
        offset: i64,
        size: i32,
        hash: Vec<u8>,
        from_temporary: bool,
    ) -> Result<Vec<u8>, RequestError> {
        let (id, mut rx) = self.multiplexer.register();
        let request = Message::Request { id, folder, name, offset, size, hash, from_temporary };

        if let Err(err) = self.outbox.send(Outgoing::new(request)).await {
            self.multiplexer.cancel_one(id);
            return Err(err.into());
        }

        // A close that runs between `register` and here clears the waiter
        // registry before this waiter ever lands in it; without racing
        // `lifecycle.wait()` here too, `rx` would then park forever on a
        // sender nothing will ever resolve.
        tokio::select! {
            biased;
            result = &mut rx => match result {
                Ok(Ok(data)) => Ok(data),
                Ok(Err(response_err)) => Err(response_err.into()),
                Err(_recv_error) => Err(ConnectionError::Closed.into()),
            },
            () = self.lifecycle.wait() => {
                self.multiplexer.cancel_one(id);
                Err(ConnectionError::Closed.into())
            }
        }
    }

    /// Orderly shutdown: tells the peer why, then tears the connection down
    /// locally. A no-op (beyond the best-effort `Close` send) if already
    /// closed.
    pub async fn close(&self, reason: String) {
        let _ = self.outbox.send(Outgoing::new(Message::Close { reason })).await;
        self.lifecycle.close();
    }
}
