//! End-to-end scenarios over a loopback `tokio::io::duplex`, exercising the
//! public `Connection` façade the way an embedding application would.

use std::sync::Arc;
use std::time::Duration;

use connection::test_support::{Event, RecordingModel};
use connection::{Connection, ConnectionError, ConnectionOptions, Model, RequestError};
use protocol::message::{ClusterConfig, FileInfo, FileType};
use protocol::CompressionPolicy;

fn options(capacity: usize) -> ConnectionOptions {
    ConnectionOptions {
        compression_policy: CompressionPolicy::Never,
        outbox_capacity: capacity,
        ping_send_tick: Duration::from_millis(50),
        ping_receive_tick: Duration::from_millis(50),
        receive_timeout: Duration::from_millis(150),
    }
}

fn file(name: &str) -> FileInfo {
    FileInfo {
        name: name.to_string(),
        file_type: FileType::File,
        size: 0,
        modified_s: 0,
        permissions: 0,
        deleted: false,
        version: Vec::new(),
        sequence: 0,
        block_size: 0,
        blocks: Vec::new(),
    }
}

/// Scenario 1: handshake, then idle past the ping-send tick (a Ping is
/// emitted), then idle well past the receive timeout (the local side closes
/// with `Timeout`).
#[tokio::test(start_paused = true)]
async fn handshake_then_ping_idle_then_receive_timeout() {
    let (local_io, remote_io) = tokio::io::duplex(4096);
    let (local_read, local_write) = tokio::io::split(local_io);
    let model = Arc::new(RecordingModel::new());
    let local = Connection::new(
        local_read,
        local_write,
        protocol::DeviceId([0x01; 32]),
        "local".to_string(),
        model.clone() as Arc<dyn Model>,
        options(16),
    );
    local.start();

    let (mut remote_read, mut remote_write) = tokio::io::split(remote_io);
    use tokio::io::AsyncWriteExt;
    let mut scratch = bytes::BytesMut::new();
    protocol::frame::write_message(
        &mut remote_write,
        &protocol::Message::ClusterConfig(ClusterConfig { folders: Vec::new() }),
        CompressionPolicy::Never,
        &mut scratch,
    )
    .await
    .unwrap();
    remote_write.flush().await.unwrap();

    tokio::time::advance(Duration::from_millis(60)).await;
    tokio::task::yield_now().await;

    let mut read_scratch = bytes::BytesMut::new();
    let ping = tokio::time::timeout(
        Duration::from_secs(1),
        protocol::frame::read_message(&mut remote_read, &mut read_scratch),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(ping, protocol::Message::Ping);

    tokio::time::advance(Duration::from_millis(200)).await;
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;

    assert!(local.closed());
    assert!(model.events().iter().any(|e| matches!(e, Event::Close { error, .. } if error.contains("timeout"))));
}

/// Scenario 2 and 3: request/response pairing with literal ids, and a
/// hundred concurrent in-flight requests each resolving to their own bytes.
#[tokio::test]
async fn request_response_pairing_and_concurrent_in_flight() {
    let (local_io, remote_io) = tokio::io::duplex(1 << 20);
    let (local_read, local_write) = tokio::io::split(local_io);
    let (remote_read, remote_write) = tokio::io::split(remote_io);

    let remote_model = Arc::new(RecordingModel::with_response(Arc::new(|name, _offset, _size| {
        Ok(name.as_bytes().to_vec())
    })));
    let local_model = Arc::new(RecordingModel::new());

    let local = Connection::new(
        local_read,
        local_write,
        protocol::DeviceId([0x02; 32]),
        "local".to_string(),
        local_model as Arc<dyn Model>,
        options(256),
    );
    let remote = Connection::new(
        remote_read,
        remote_write,
        protocol::DeviceId([0x03; 32]),
        "remote".to_string(),
        remote_model as Arc<dyn Model>,
        options(256),
    );
    local.start();
    remote.start();

    local.cluster_config(ClusterConfig { folders: Vec::new() }).await.unwrap();
    remote.cluster_config(ClusterConfig { folders: Vec::new() }).await.unwrap();
    tokio::task::yield_now().await;

    let first = local
        .request("f".to_string(), "0".to_string(), 0, 1, vec![0x01], false)
        .await
        .unwrap();
    assert_eq!(first, b"0");

    let local = Arc::new(local);
    let mut handles = Vec::new();
    for i in 0..100 {
        let local = Arc::clone(&local);
        let size = i.to_string().len() as i32;
        handles.push(tokio::spawn(async move {
            local.request("f".to_string(), i.to_string(), 0, size, vec![], false).await
        }));
    }

    for (i, handle) in handles.into_iter().enumerate() {
        let data = handle.await.unwrap().unwrap();
        assert_eq!(data, i.to_string().into_bytes());
    }
}

/// Scenario 4: the file-name filter drops the literal rejected names.
#[tokio::test]
async fn filter_drops_exactly_the_literal_rejected_names() {
    let (local_io, remote_io) = tokio::io::duplex(4096);
    let (local_read, local_write) = tokio::io::split(local_io);
    let model = Arc::new(RecordingModel::new());
    let local = Connection::new(
        local_read,
        local_write,
        protocol::DeviceId([0x04; 32]),
        "local".to_string(),
        model.clone() as Arc<dyn Model>,
        options(16),
    );
    local.start();

    let (_remote_read, mut remote_write) = tokio::io::split(remote_io);
    let mut scratch = bytes::BytesMut::new();
    protocol::frame::write_message(
        &mut remote_write,
        &protocol::Message::ClusterConfig(ClusterConfig { folders: Vec::new() }),
        CompressionPolicy::Never,
        &mut scratch,
    )
    .await
    .unwrap();
    let files = vec![file(""), file("a"), file("."), file("b/c"), file("/")];
    protocol::frame::write_message(
        &mut remote_write,
        &protocol::Message::Index { folder: "docs".to_string(), files },
        CompressionPolicy::Never,
        &mut scratch,
    )
    .await
    .unwrap();

    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            if model.events().iter().any(|e| matches!(e, Event::Index { .. })) {
                break;
            }
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    let events = model.events();
    let Event::Index { files, .. } = events.iter().find(|e| matches!(e, Event::Index { .. })).unwrap() else {
        unreachable!()
    };
    let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b/c"]);
}

/// Scenario 6: a local Request racing a remote Close. The Request resolves
/// `Closed`; the model's `Close` callback fires exactly once, mentioning the
/// close reason.
#[tokio::test]
async fn close_race_between_local_request_and_remote_close() {
    let (local_io, remote_io) = tokio::io::duplex(4096);
    let (local_read, local_write) = tokio::io::split(local_io);
    let model = Arc::new(RecordingModel::new());
    let local = Connection::new(
        local_read,
        local_write,
        protocol::DeviceId([0x05; 32]),
        "local".to_string(),
        model.clone() as Arc<dyn Model>,
        options(16),
    );
    local.start();

    let (_remote_read, mut remote_write) = tokio::io::split(remote_io);
    let mut scratch = bytes::BytesMut::new();
    protocol::frame::write_message(
        &mut remote_write,
        &protocol::Message::ClusterConfig(ClusterConfig { folders: Vec::new() }),
        CompressionPolicy::Never,
        &mut scratch,
    )
    .await
    .unwrap();
    tokio::task::yield_now().await;

    let request = local.request("f".to_string(), "a".to_string(), 0, 4, vec![], false);

    protocol::frame::write_message(
        &mut remote_write,
        &protocol::Message::Close { reason: "bye".to_string() },
        CompressionPolicy::Never,
        &mut scratch,
    )
    .await
    .unwrap();

    let outcome = tokio::time::timeout(Duration::from_secs(1), request).await.unwrap();
    assert!(matches!(outcome, Err(RequestError::Connection(ConnectionError::Closed))));

    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
    assert_eq!(model.close_count(), 1);
    assert!(model.events().iter().any(|e| matches!(e, Event::Close { error, .. } if error.contains("bye"))));
}
