//! The model callback surface (§6): everything this core calls out to but
//! does not itself implement — the on-disk file store, block hashing, and
//! whatever produces index contents and serves request bodies.
//!
//! Expressed as hand-rolled boxed futures rather than the `async-trait`
//! crate (neither the teacher nor any other pack repo takes that
//! dependency) so the trait stays object-safe: `Connection` is generic over
//! `Arc<dyn Model>`, not over a concrete model type, matching "a model
//! callback sink" in spec.md's lifecycle section.

use std::future::Future;
use std::pin::Pin;

use protocol::codes::ResponseError;
use protocol::message::{ClusterConfig, FileDownloadProgressUpdate, FileInfo};
use protocol::DeviceId;

use crate::error::ConnectionError;

/// A future boxed for storage behind a trait object, matching what
/// `#[async_trait]` itself expands method bodies into.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Callback surface invoked by the reader loop and the close routine.
///
/// Implementations must not block the calling task; heavy work should be
/// spawned internally if needed. `request` is the one exception on the hot
/// path (§4.4): it's handed a pool-backed buffer to fill in place so the
/// core avoids an extra allocation per block served.
pub trait Model: Send + Sync {
    /// A full file listing for `folder` has arrived.
    fn index(&self, device: DeviceId, folder: String, files: Vec<FileInfo>) -> BoxFuture<'_, ()>;

    /// An incremental update to a previously sent index.
    fn index_update(&self, device: DeviceId, folder: String, files: Vec<FileInfo>) -> BoxFuture<'_, ()>;

    /// A block of `name` at `offset`/`size` is wanted; fill `out_buf[..size]`
    /// and return `Ok(())`, or report why it can't be served.
    fn request<'a>(
        &'a self,
        device: DeviceId,
        folder: String,
        name: String,
        offset: i64,
        size: i32,
        hash: Vec<u8>,
        from_temporary: bool,
        out_buf: &'a mut [u8],
    ) -> BoxFuture<'a, Result<(), ResponseError>>;

    /// The handshake `ClusterConfig` has arrived.
    fn cluster_config(&self, device: DeviceId, config: ClusterConfig) -> BoxFuture<'_, ()>;

    /// The connection has torn down; invoked exactly once, with the
    /// triggering error.
    fn close(&self, device: DeviceId, error: ConnectionError) -> BoxFuture<'_, ()>;

    /// Informational progress update for in-progress downloads.
    fn download_progress(
        &self,
        device: DeviceId,
        folder: String,
        updates: Vec<FileDownloadProgressUpdate>,
    ) -> BoxFuture<'_, ()>;
}
