//! Counting transport wrappers (§4.8, design note in `SPEC_FULL.md` §2):
//! thin `AsyncRead`/`AsyncWrite` adapters that record bytes moved and
//! refresh the last-activity timestamp on every completed I/O operation,
//! without the framing codec above them needing to know counters exist.

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::counters::Counters;

/// Wraps a transport reader, recording every byte actually read into
/// [`Counters`].
pub struct CountingReader<R> {
    inner: R,
    counters: Counters,
}

impl<R> CountingReader<R> {
    pub fn new(inner: R, counters: Counters) -> Self {
        Self { inner, counters }
    }
}

impl<R> AsyncRead for CountingReader<R>
where
    R: AsyncRead + Unpin,
{
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let before = buf.filled().len();
        let poll = Pin::new(&mut self.inner).poll_read(cx, buf);
        if poll.is_ready() {
            let after = buf.filled().len();
            if after > before {
                self.counters.record_read(after - before);
            }
        }
        poll
    }
}

/// Wraps a transport writer, recording every byte actually written into
/// [`Counters`].
pub struct CountingWriter<W> {
    inner: W,
    counters: Counters,
}

impl<W> CountingWriter<W> {
    pub fn new(inner: W, counters: Counters) -> Self {
        Self { inner, counters }
    }
}

impl<W> AsyncWrite for CountingWriter<W>
where
    W: AsyncWrite + Unpin,
{
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        let poll = Pin::new(&mut self.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(written)) = &poll {
            self.counters.record_write(*written);
        }
        poll
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}
