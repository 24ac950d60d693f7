//! Minimal two-peer handshake demo over an in-process duplex pipe.
//!
//! Spins up two `Connection`s sharing a `tokio::io::duplex`, exchanges
//! `ClusterConfig`, then has one side request a block from the other and
//! prints the result. Logging goes through `tracing` when the `tracing`
//! feature is enabled; otherwise everything still runs, just silently.

use std::sync::Arc;

use connection::{BoxFuture, Connection, ConnectionError, ConnectionOptions, Model};
use protocol::codes::ResponseError;
use protocol::message::{ClusterConfig, FileDownloadProgressUpdate, FileInfo};
use protocol::DeviceId;

/// A [`Model`] that just logs every callback and serves `request` from an
/// in-memory map of `name -> bytes`.
struct DemoModel {
    label: &'static str,
    files: std::collections::HashMap<String, Vec<u8>>,
}

impl DemoModel {
    fn new(label: &'static str, files: std::collections::HashMap<String, Vec<u8>>) -> Self {
        Self { label, files }
    }
}

impl Model for DemoModel {
    fn index(&self, device: DeviceId, folder: String, files: Vec<FileInfo>) -> BoxFuture<'_, ()> {
        #[cfg(feature = "tracing")]
        tracing::info!(label = self.label, %device, %folder, count = files.len(), "index");
        #[cfg(not(feature = "tracing"))]
        let _ = (device, folder, files);
        Box::pin(async {})
    }

    fn index_update(&self, device: DeviceId, folder: String, files: Vec<FileInfo>) -> BoxFuture<'_, ()> {
        #[cfg(feature = "tracing")]
        tracing::info!(label = self.label, %device, %folder, count = files.len(), "index_update");
        #[cfg(not(feature = "tracing"))]
        let _ = (device, folder, files);
        Box::pin(async {})
    }

    fn request<'a>(
        &'a self,
        device: DeviceId,
        folder: String,
        name: String,
        offset: i64,
        size: i32,
        _hash: Vec<u8>,
        _from_temporary: bool,
        out_buf: &'a mut [u8],
    ) -> BoxFuture<'a, Result<(), ResponseError>> {
        #[cfg(feature = "tracing")]
        tracing::info!(label = self.label, %device, %folder, %name, offset, size, "request");
        #[cfg(not(feature = "tracing"))]
        let _ = (device, folder, offset, size);
        Box::pin(async move {
            let Some(data) = self.files.get(&name) else {
                return Err(ResponseError::NoSuchFile);
            };
            let n = data.len().min(out_buf.len());
            out_buf[..n].copy_from_slice(&data[..n]);
            Ok(())
        })
    }

    fn cluster_config(&self, device: DeviceId, config: ClusterConfig) -> BoxFuture<'_, ()> {
        #[cfg(feature = "tracing")]
        tracing::info!(label = self.label, %device, folders = config.folders.len(), "cluster_config");
        #[cfg(not(feature = "tracing"))]
        let _ = (device, config);
        Box::pin(async {})
    }

    fn close(&self, device: DeviceId, error: ConnectionError) -> BoxFuture<'_, ()> {
        #[cfg(feature = "tracing")]
        tracing::info!(label = self.label, %device, %error, "close");
        #[cfg(not(feature = "tracing"))]
        let _ = (device, error);
        Box::pin(async {})
    }

    fn download_progress(
        &self,
        device: DeviceId,
        folder: String,
        updates: Vec<FileDownloadProgressUpdate>,
    ) -> BoxFuture<'_, ()> {
        #[cfg(feature = "tracing")]
        tracing::info!(label = self.label, %device, %folder, count = updates.len(), "download_progress");
        #[cfg(not(feature = "tracing"))]
        let _ = (device, folder, updates);
        Box::pin(async {})
    }
}

#[tokio::main]
async fn main() {
    #[cfg(feature = "tracing")]
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (alice_io, bob_io) = tokio::io::duplex(64 * 1024);
    let (alice_read, alice_write) = tokio::io::split(alice_io);
    let (bob_read, bob_write) = tokio::io::split(bob_io);

    let mut bob_files = std::collections::HashMap::new();
    bob_files.insert("readme.txt".to_string(), b"hello from bob".to_vec());

    let alice = Connection::new(
        alice_read,
        alice_write,
        DeviceId([0xa1; 32]),
        "alice".to_string(),
        Arc::new(DemoModel::new("alice", std::collections::HashMap::new())),
        ConnectionOptions::default(),
    );
    let bob = Connection::new(
        bob_read,
        bob_write,
        DeviceId([0xb0; 32]),
        "bob".to_string(),
        Arc::new(DemoModel::new("bob", bob_files)),
        ConnectionOptions::default(),
    );

    alice.start();
    bob.start();

    alice.cluster_config(ClusterConfig { folders: Vec::new() }).await.unwrap();
    bob.cluster_config(ClusterConfig { folders: Vec::new() }).await.unwrap();
    tokio::task::yield_now().await;

    let data = alice
        .request("docs".to_string(), "readme.txt".to_string(), 0, 14, Vec::new(), false)
        .await
        .expect("bob serves the block");
    println!("alice received: {}", String::from_utf8_lossy(&data));

    alice.close("demo finished".to_string()).await;
    bob.close("demo finished".to_string()).await;
}
