//! The reader duty (§4.2): drives the framing codec, enforces the
//! handshake state machine, and dispatches each message type.

use std::sync::Arc;

use bytes::BytesMut;
use protocol::codes::{code_to_error, error_to_code, NO_ERROR};
use protocol::constants::BLOCK_SIZE;
use protocol::filter::filter_files;
use protocol::{DeviceId, Message};
use tokio::io::AsyncRead;

use crate::counters::Counters;
use crate::error::ConnectionError;
use crate::io::CountingReader;
use crate::lifecycle::Lifecycle;
use crate::model::Model;
use crate::multiplexer::Multiplexer;
use crate::pool::BlockPool;
use crate::writer::{Outbox, Outgoing};

/// Handshake state (§4.2). Only ever progresses `Initial -> Ready`. The
/// design notes' "benign re-assignment to `Ready`" after `Index`/
/// `IndexUpdate`/`DownloadProgress` is represented here simply by those
/// match arms never touching `state` — there is no regression to express.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    Ready,
}

/// Runs the reader duty until the connection closes or a protocol/transport
/// error tears it down.
#[allow(clippy::too_many_arguments)]
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all, fields(%device)))]
pub async fn run<R>(
    reader: R,
    device: DeviceId,
    lifecycle: Lifecycle,
    multiplexer: Arc<Multiplexer>,
    pool: Arc<BlockPool>,
    outbox: Outbox,
    counters: Counters,
    model: Arc<dyn Model>,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin,
{
    let mut reader = CountingReader::new(reader, counters);
    let mut scratch = BytesMut::new();
    let mut state = State::Initial;

    loop {
        let frame = tokio::select! {
            biased;
            () = lifecycle.wait() => return Ok(()),
            result = protocol::frame::read_message(&mut reader, &mut scratch) => result,
        };

        let message = match frame {
            Ok(message) => message,
            Err(err) => {
                let err: ConnectionError = err.into();
                #[cfg(feature = "tracing")]
                tracing::warn!(%device, %err, "reader: frame error");
                lifecycle.fail(err.clone());
                return Err(err);
            }
        };

        match (state, message) {
            (State::Initial, Message::ClusterConfig(config)) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(%device, folders = config.folders.len(), "reader: handshake complete");
                state = State::Ready;
                let model = Arc::clone(&model);
                tokio::spawn(async move {
                    model.cluster_config(device, config).await;
                });
            }
            (State::Initial, _unexpected) => {
                let err = ConnectionError::Protocol(
                    "first message on a connection must be ClusterConfig".to_string(),
                );
                #[cfg(feature = "tracing")]
                tracing::warn!(%device, %err, "reader: out-of-phase message");
                lifecycle.fail(err.clone());
                return Err(err);
            }
            (State::Ready, Message::ClusterConfig(_)) => {
                let err = ConnectionError::Protocol(
                    "ClusterConfig received after the handshake already completed".to_string(),
                );
                #[cfg(feature = "tracing")]
                tracing::warn!(%device, %err, "reader: duplicate handshake");
                lifecycle.fail(err.clone());
                return Err(err);
            }
            (State::Ready, Message::Index { folder, files }) => {
                let filtered = filter_files(&files).into_owned();
                model.index(device, folder, filtered).await;
            }
            (State::Ready, Message::IndexUpdate { folder, files }) => {
                let filtered = filter_files(&files).into_owned();
                model.index_update(device, folder, filtered).await;
            }
            (
                State::Ready,
                Message::Request { id, folder, name, offset, size, hash, from_temporary },
            ) => {
                spawn_request_handler(RequestHandlerArgs {
                    device,
                    id,
                    folder,
                    name,
                    offset,
                    size,
                    hash,
                    from_temporary,
                    model: Arc::clone(&model),
                    pool: Arc::clone(&pool),
                    outbox: outbox.clone(),
                });
            }
            (State::Ready, Message::Response { id, data, code }) => {
                let outcome = match code_to_error(code) {
                    Some(err) => Err(err),
                    None => Ok(data),
                };
                multiplexer.resolve(id, outcome);
            }
            (State::Ready, Message::DownloadProgress { folder, updates }) => {
                model.download_progress(device, folder, updates).await;
            }
            (State::Ready, Message::Ping) => {
                // No-op; the counting reader already refreshed last-read
                // activity for us.
            }
            (State::Ready, Message::Close { reason }) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(%device, %reason, "reader: remote closed");
                let err = ConnectionError::RemoteClose { reason };
                lifecycle.fail(err.clone());
                return Err(err);
            }
            (State::Ready, Message::Compressed { .. }) => {
                // `protocol::frame::read_message` already unwraps exactly
                // one layer of `Compressed` and rejects a nested one as
                // `NestedCompression` before this match ever sees it; kept
                // for exhaustiveness only.
                let err = ConnectionError::Protocol("unexpected compressed envelope".to_string());
                #[cfg(feature = "tracing")]
                tracing::warn!(%device, %err, "reader: unreachable Compressed arm");
                lifecycle.fail(err.clone());
                return Err(err);
            }
        }
    }
}

struct RequestHandlerArgs {
    device: DeviceId,
    id: i32,
    folder: String,
    name: String,
    offset: i64,
    size: i32,
    hash: Vec<u8>,
    from_temporary: bool,
    model: Arc<dyn Model>,
    pool: Arc<BlockPool>,
    outbox: Outbox,
}

/// Spawns a concurrent handler for one incoming `Request` (§4.4), so
/// serving one block never blocks message reception.
fn spawn_request_handler(args: RequestHandlerArgs) {
    tokio::spawn(async move {
        let RequestHandlerArgs { device, id, folder, name, offset, size, hash, from_temporary, model, pool, outbox } =
            args;

        #[cfg(feature = "tracing")]
        tracing::debug!(%device, id, %folder, %name, offset, size, "reader: serving request");

        let use_pool = (0..=BLOCK_SIZE as i64).contains(&i64::from(size));
        let fill_len = usize::try_from(size.max(0)).unwrap_or(0);
        let mut buf = if use_pool { pool.acquire() } else { vec![0u8; fill_len] };

        let result = model
            .request(device, folder, name, offset, size, hash, from_temporary, &mut buf[..fill_len])
            .await;

        let (data, code) = match result {
            Ok(()) => {
                buf.truncate(fill_len);
                (buf, NO_ERROR)
            }
            Err(response_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(%device, id, %response_err, "reader: request declined");
                if use_pool {
                    pool.release(buf);
                }
                (Vec::new(), error_to_code(response_err))
            }
        };

        let response = Message::Response { id, data, code };

        if use_pool {
            let (drain_tx, drain_rx) = tokio::sync::oneshot::channel();
            if outbox.send(Outgoing::with_drain(response, drain_tx)).await.is_ok() {
                if let Ok(reclaimed) = drain_rx.await {
                    pool.release(reclaimed);
                }
            }
        } else {
            let _ = outbox.send(Outgoing::new(response)).await;
        }
    });
}
