//! Failure modes confined to framing and message-schema decoding.
//!
//! Every variant here is, per §7 of the design, a connection-terminating
//! condition once it reaches the connection core — this crate only reports
//! it; tearing the connection down is the core's job.

/// A failure while encoding, decoding, or otherwise validating a frame.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The frame's declared length exceeds [`crate::constants::MAX_MESSAGE_LEN`].
    #[error("frame length {0} exceeds the {} byte limit", crate::constants::MAX_MESSAGE_LEN)]
    FrameTooLarge(usize),

    /// The serialized payload could not be decoded as a `Message`.
    #[error("malformed message payload: {0}")]
    Malformed(#[from] bincode::Error),

    /// A `Compressed` envelope's payload, once decompressed, was itself a
    /// `Compressed` envelope. The spec leaves this undefined; this crate
    /// treats it as a protocol error (see design notes, open question 2).
    #[error("compressed envelope nested inside another compressed envelope")]
    NestedCompression,

    /// LZ4 decompression of a `Compressed` envelope failed, or its output
    /// length did not match the envelope's declared `uncompressed_length`.
    #[cfg(feature = "lz4")]
    #[error("compression envelope malformed: {0}")]
    Codec(#[from] compress::lz4::Lz4Error),

    /// The transport returned an I/O error while reading or writing a frame.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}
