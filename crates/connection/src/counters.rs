//! Byte totals and last-activity timestamps, updated on every I/O (§4.8).
//!
//! Timestamps are monotonic `Instant`-based elapsed milliseconds rather than
//! wall-clock, so a clock step never makes the connection look idle or
//! freshly active; [`Statistics`] reports `SystemTime::now()` separately for
//! the wall-clock field the spec asks for.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime};

/// A point-in-time snapshot of a connection's transfer totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Statistics {
    /// Wall-clock time the snapshot was taken.
    pub at: SystemTime,
    /// Total bytes read from the transport so far.
    pub bytes_read: u64,
    /// Total bytes written to the transport so far.
    pub bytes_written: u64,
}

#[derive(Debug)]
struct Side {
    total: AtomicU64,
    last_activity_ms: AtomicI64,
}

impl Side {
    fn new(epoch: Instant) -> Self {
        Self {
            total: AtomicU64::new(0),
            last_activity_ms: AtomicI64::new(elapsed_ms(epoch, Instant::now())),
        }
    }

    fn record(&self, epoch: Instant, bytes: usize) {
        self.total.fetch_add(bytes as u64, Ordering::Relaxed);
        self.last_activity_ms
            .store(elapsed_ms(epoch, Instant::now()), Ordering::Relaxed);
    }

    fn idle_for(&self, epoch: Instant) -> std::time::Duration {
        let last = self.last_activity_ms.load(Ordering::Relaxed);
        let now = elapsed_ms(epoch, Instant::now());
        std::time::Duration::from_millis((now - last).max(0) as u64)
    }
}

fn elapsed_ms(epoch: Instant, now: Instant) -> i64 {
    now.saturating_duration_since(epoch).as_millis() as i64
}

/// Shared read/write counters and last-activity timestamps for one
/// connection. Cheap to clone (an `Arc` underneath); every clone observes
/// the same counters.
#[derive(Debug, Clone)]
pub struct Counters {
    epoch: Instant,
    read: Arc<Side>,
    write: Arc<Side>,
}

impl Default for Counters {
    fn default() -> Self {
        let epoch = Instant::now();
        Self {
            epoch,
            read: Arc::new(Side::new(epoch)),
            write: Arc::new(Side::new(epoch)),
        }
    }
}

impl Counters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `bytes` read and refreshes the last-read-activity timestamp.
    pub fn record_read(&self, bytes: usize) {
        self.read.record(self.epoch, bytes);
    }

    /// Records `bytes` written and refreshes the last-write-activity timestamp.
    pub fn record_write(&self, bytes: usize) {
        self.write.record(self.epoch, bytes);
    }

    /// Time elapsed since the last inbound byte.
    #[must_use]
    pub fn idle_since_read(&self) -> std::time::Duration {
        self.read.idle_for(self.epoch)
    }

    /// Time elapsed since the last outbound byte.
    #[must_use]
    pub fn idle_since_write(&self) -> std::time::Duration {
        self.write.idle_for(self.epoch)
    }

    /// A consistent snapshot of current totals.
    #[must_use]
    pub fn snapshot(&self) -> Statistics {
        Statistics {
            at: SystemTime::now(),
            bytes_read: self.read.total.load(Ordering::Relaxed),
            bytes_written: self.write.total.load(Ordering::Relaxed),
        }
    }
}
