//! Connection-wide failure modes (§7).
//!
//! Every variant here is terminal: surfacing one from the reader, writer, or
//! ping-receiver duty triggers [`crate::closed::Closed::trigger`] exactly
//! once. [`ResponseError`] is the one per-request exception — it never
//! reaches here, it's packaged into a `Response` instead (§4.4).

use protocol::codes::ResponseError;

/// A connection-terminating failure, or the `Closed` state observed by a
/// caller after teardown.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConnectionError {
    /// The connection has already been torn down; every public operation
    /// returns this once `close()` has run, regardless of the original
    /// root cause.
    #[error("connection closed")]
    Closed,

    /// No inbound traffic for the configured receive timeout.
    #[error("receive timeout")]
    Timeout,

    /// An out-of-phase, unknown, over-length, or malformed message.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The underlying transport returned an I/O error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Compression or decompression failed.
    #[error("codec error: {0}")]
    Codec(String),

    /// The remote peer sent a `Close` message; `reason` is its payload.
    #[error("remote closed: {reason}")]
    RemoteClose {
        /// Reason string carried by the remote `Close` message.
        reason: String,
    },
}

impl From<protocol::ProtocolError> for ConnectionError {
    fn from(err: protocol::ProtocolError) -> Self {
        match err {
            protocol::ProtocolError::Io(io_err) => ConnectionError::Transport(io_err.to_string()),
            #[cfg(feature = "lz4")]
            protocol::ProtocolError::Codec(_) => ConnectionError::Codec(err.to_string()),
            other => ConnectionError::Protocol(other.to_string()),
        }
    }
}

/// Outcome of an outgoing `Request`, as delivered by the matching `Response`.
pub type RequestOutcome = Result<Vec<u8>, ResponseError>;

/// Everything `Connection::request` can fail with: either the remote's
/// per-request error code, or a connection-wide condition (most commonly
/// `Closed`, per §8's "every Request either returns data, a ResponseError,
/// or Closed").
#[derive(Debug, Clone, thiserror::Error)]
pub enum RequestError {
    /// The remote reported a per-request failure; the connection itself is
    /// unaffected.
    #[error(transparent)]
    Response(#[from] ResponseError),
    /// The connection closed before or while a reply was outstanding.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}
