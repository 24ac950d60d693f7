//! Fixed wire constants shared by the framing codec and the connection core.

/// Size of a single block, in bytes (128 KiB).
pub const BLOCK_SIZE: usize = 128 * 1024;

/// Maximum serialized `Message` length accepted on the wire (512 MiB).
pub const MAX_MESSAGE_LEN: usize = 512 * 1024 * 1024;

/// Minimum raw serialized length, in bytes, before the compression policy
/// considers compressing an outbound message.
pub const COMPRESSION_THRESHOLD: usize = 128;

/// Interval on which the ping-sender duty wakes up and checks write idleness.
pub const PING_SEND_TICK: std::time::Duration = std::time::Duration::from_secs(45);

/// Interval on which the ping-receiver duty wakes up and checks read idleness.
pub const PING_RECEIVE_TICK: std::time::Duration = std::time::Duration::from_secs(150);

/// Read idleness, since the last inbound byte, after which the connection is
/// closed with a timeout error.
pub const RECEIVE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(300);

/// Length, in bytes, of the big-endian frame length prefix.
pub const FRAME_HEADER_LEN: usize = 4;
