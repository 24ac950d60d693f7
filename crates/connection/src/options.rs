//! Caller-supplied, immutable connection configuration.
//!
//! Transport establishment, authentication, and on-disk configuration live
//! outside this crate; what's left is a small set of knobs the core itself
//! owns, collected into one typed value rather than scattered constants.

use std::time::Duration;

use protocol::constants::{PING_RECEIVE_TICK, PING_SEND_TICK, RECEIVE_TIMEOUT};
use protocol::CompressionPolicy;

/// Immutable configuration for a single [`crate::Connection`].
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// Outbound compression policy.
    pub compression_policy: CompressionPolicy,
    /// Capacity of the writer's outbox channel (§4.3's "bounded by the
    /// writer's progress" requirement).
    pub outbox_capacity: usize,
    /// Interval the ping-sender duty wakes up on.
    pub ping_send_tick: Duration,
    /// Interval the ping-receiver duty wakes up on.
    pub ping_receive_tick: Duration,
    /// Read idleness after which the connection is closed with `Timeout`.
    pub receive_timeout: Duration,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            compression_policy: CompressionPolicy::default(),
            outbox_capacity: 256,
            ping_send_tick: PING_SEND_TICK,
            ping_receive_tick: PING_RECEIVE_TICK,
            receive_timeout: RECEIVE_TIMEOUT,
        }
    }
}
