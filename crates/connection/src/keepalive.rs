//! Ping scheduling and receive-timeout supervisors (§4.7).
//!
//! Both duties watch the same [`Counters`] the counting reader/writer
//! maintain rather than tracking their own state, so "idle" always means
//! "idle on the wire", immune to anything the message dispatcher does in
//! between.

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};

use crate::counters::Counters;
use crate::error::ConnectionError;
use crate::lifecycle::Lifecycle;
use crate::writer::{Outbox, Outgoing};
use protocol::Message;

/// Ticks every `tick`; enqueues a `Ping` unless a write happened more
/// recently than `tick` ago. Effective cadence therefore lies in
/// `(tick, 2 * tick]`.
///
/// Exits on close. A failure to enqueue (the outbox has already closed) is
/// not reported here — the writer duty that owns the outbox already ran
/// `lifecycle.fail` before dropping it.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub async fn run_ping_sender(
    outbox: Outbox,
    counters: Counters,
    lifecycle: Lifecycle,
    tick: Duration,
) -> Result<(), ConnectionError> {
    let mut ticker = time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            () = lifecycle.wait() => return Ok(()),
            _ = ticker.tick() => {
                if counters.idle_since_write() >= tick {
                    #[cfg(feature = "tracing")]
                    tracing::debug!("ping sender: write side idle, enqueuing Ping");
                    let _ = outbox.send(Outgoing::new(Message::Ping)).await;
                }
            }
        }
    }
}

/// Ticks every `tick`; closes the connection with [`ConnectionError::Timeout`]
/// once no byte has been read for longer than `timeout`.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub async fn run_ping_receiver(
    counters: Counters,
    lifecycle: Lifecycle,
    tick: Duration,
    timeout: Duration,
) -> Result<(), ConnectionError> {
    let mut ticker = time::interval(tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            biased;
            () = lifecycle.wait() => return Ok(()),
            _ = ticker.tick() => {
                if counters.idle_since_read() > timeout {
                    let err = ConnectionError::Timeout;
                    #[cfg(feature = "tracing")]
                    tracing::warn!(idle = ?counters.idle_since_read(), "ping receiver: read timeout");
                    lifecycle.fail(err.clone());
                    return Err(err);
                }
            }
        }
    }
}
