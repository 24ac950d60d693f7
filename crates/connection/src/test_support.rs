//! A [`Model`] test double shared by this crate's unit tests and the
//! integration tests under `tests/`. Gated behind `cfg(test)` or the
//! `test-util` feature (enabled via the self-referential dev-dependency in
//! `Cargo.toml`) so it never ships in a normal build.

use std::sync::{Arc, Mutex};

use protocol::codes::ResponseError;
use protocol::message::{ClusterConfig, FileDownloadProgressUpdate, FileInfo};
use protocol::DeviceId;

use crate::error::ConnectionError;
use crate::model::{BoxFuture, Model};

/// One recorded invocation of a [`Model`] callback.
#[derive(Debug, Clone)]
pub enum Event {
    Index { device: DeviceId, folder: String, files: Vec<FileInfo> },
    IndexUpdate { device: DeviceId, folder: String, files: Vec<FileInfo> },
    ClusterConfig { device: DeviceId, config: ClusterConfig },
    DownloadProgress {
        device: DeviceId,
        folder: String,
        updates: Vec<FileDownloadProgressUpdate>,
    },
    Close { device: DeviceId, error: String },
}

/// How a [`RecordingModel`] answers an incoming `request` callback.
pub type RequestScript = Arc<dyn Fn(&str, i64, i32) -> Result<Vec<u8>, ResponseError> + Send + Sync>;

/// A [`Model`] test double that records every callback invocation and
/// serves `request` from a caller-supplied closure (defaulting to "return
/// empty data, no error").
pub struct RecordingModel {
    events: Mutex<Vec<Event>>,
    respond: RequestScript,
}

impl RecordingModel {
    #[must_use]
    pub fn new() -> Self {
        Self { events: Mutex::new(Vec::new()), respond: Arc::new(|_, _, _| Ok(Vec::new())) }
    }

    #[must_use]
    pub fn with_response(respond: RequestScript) -> Self {
        Self { events: Mutex::new(Vec::new()), respond }
    }

    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    #[must_use]
    pub fn close_count(&self) -> usize {
        self.events.lock().unwrap().iter().filter(|e| matches!(e, Event::Close { .. })).count()
    }
}

impl Default for RecordingModel {
    fn default() -> Self {
        Self::new()
    }
}

impl Model for RecordingModel {
    fn index(&self, device: DeviceId, folder: String, files: Vec<FileInfo>) -> BoxFuture<'_, ()> {
        self.events.lock().unwrap().push(Event::Index { device, folder, files });
        Box::pin(async {})
    }

    fn index_update(&self, device: DeviceId, folder: String, files: Vec<FileInfo>) -> BoxFuture<'_, ()> {
        self.events.lock().unwrap().push(Event::IndexUpdate { device, folder, files });
        Box::pin(async {})
    }

    fn request<'a>(
        &'a self,
        _device: DeviceId,
        folder: String,
        name: String,
        offset: i64,
        size: i32,
        _hash: Vec<u8>,
        _from_temporary: bool,
        out_buf: &'a mut [u8],
    ) -> BoxFuture<'a, Result<(), ResponseError>> {
        let respond = Arc::clone(&self.respond);
        Box::pin(async move {
            let data = respond(&name, offset, size)?;
            let n = data.len().min(out_buf.len());
            out_buf[..n].copy_from_slice(&data[..n]);
            let _ = folder;
            Ok(())
        })
    }

    fn cluster_config(&self, device: DeviceId, config: ClusterConfig) -> BoxFuture<'_, ()> {
        self.events.lock().unwrap().push(Event::ClusterConfig { device, config });
        Box::pin(async {})
    }

    fn close(&self, device: DeviceId, error: ConnectionError) -> BoxFuture<'_, ()> {
        self.events.lock().unwrap().push(Event::Close { device, error: error.to_string() });
        Box::pin(async {})
    }

    fn download_progress(
        &self,
        device: DeviceId,
        folder: String,
        updates: Vec<FileDownloadProgressUpdate>,
    ) -> BoxFuture<'_, ()> {
        self.events.lock().unwrap().push(Event::DownloadProgress { device, folder, updates });
        Box::pin(async {})
    }
}
