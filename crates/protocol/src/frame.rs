//! Length-prefixed frame I/O: `[u32 big-endian length][serialized Message]`.
//!
//! These are plain async functions rather than a `tokio_util::codec::Framed`
//! pair (see `SPEC_FULL.md` §4.1) because the writer side needs the
//! [`CompressionPolicy`] alongside the message being written, which doesn't
//! fit the single-`Item`-type `Encoder` trait cleanly. Callers supply a
//! `BytesMut` scratch buffer that is reused across calls and only ever
//! grows, matching the spec's buffer-reuse requirement.

use bytes::{Buf, BufMut, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::constants::{FRAME_HEADER_LEN, MAX_MESSAGE_LEN};
use crate::envelope::CompressionPolicy;
use crate::error::ProtocolError;
use crate::message::Message;
use crate::wire;

/// Reads one frame from `reader`, decoding (and transparently decompressing)
/// it into a [`Message`].
///
/// `scratch` is cleared and reused as the read buffer; its capacity is never
/// shrunk, so repeated calls on the same connection converge to the largest
/// frame seen.
///
/// # Errors
///
/// Returns [`ProtocolError::FrameTooLarge`] if the declared length exceeds
/// [`MAX_MESSAGE_LEN`], [`ProtocolError::Io`] on a transport failure, and
/// [`ProtocolError::Malformed`] / [`ProtocolError::NestedCompression`] /
/// [`ProtocolError::Codec`] on a malformed payload.
pub async fn read_message<R>(reader: &mut R, scratch: &mut BytesMut) -> Result<Message, ProtocolError>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut header = [0u8; FRAME_HEADER_LEN];
    reader.read_exact(&mut header).await?;
    let len = u32::from_be_bytes(header) as usize;
    if len > MAX_MESSAGE_LEN {
        #[cfg(feature = "tracing")]
        tracing::warn!(len, max = MAX_MESSAGE_LEN, "frame: declared length too large");
        return Err(ProtocolError::FrameTooLarge(len));
    }

    scratch.clear();
    scratch.reserve(len);
    // SAFETY-free equivalent: grow the buffer by writing zeroed bytes, then
    // read the payload on top of them.
    scratch.resize(len, 0);
    reader.read_exact(&mut scratch[..]).await?;

    #[cfg(feature = "tracing")]
    tracing::trace!(len, "frame: read");
    decode_payload(&scratch[..])
}

fn decode_payload(bytes: &[u8]) -> Result<Message, ProtocolError> {
    let message = wire::decode(bytes)?;
    match message {
        #[cfg(feature = "lz4")]
        Message::Compressed { data, uncompressed_length } => {
            let inner_bytes = crate::envelope::decompress(&data, uncompressed_length)?;
            let inner = wire::decode(&inner_bytes)?;
            if matches!(inner, Message::Compressed { .. }) {
                return Err(ProtocolError::NestedCompression);
            }
            Ok(inner)
        }
        #[cfg(not(feature = "lz4"))]
        Message::Compressed { .. } => Err(ProtocolError::NestedCompression),
        other => Ok(other),
    }
}

/// Serializes `message`, applies `policy`, and writes the resulting frame to
/// `writer`. Returns the total number of bytes written to the wire
/// (header plus payload), so callers can feed byte counters without
/// re-deriving the length from an already-cleared scratch buffer.
///
/// `scratch` is reused as the serialize buffer across calls, matching the
/// spec's buffer-reuse requirement for the write path.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] if serialization fails, or
/// [`ProtocolError::Io`] on a transport failure.
pub async fn write_message<W>(
    writer: &mut W,
    message: &Message,
    policy: CompressionPolicy,
    scratch: &mut BytesMut,
) -> Result<usize, ProtocolError>
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let raw = wire::encode(message)?;

    #[cfg(feature = "lz4")]
    let outgoing = if policy.should_compress(message, raw.len()) {
        wire::encode(&crate::envelope::compress(&raw))?
    } else {
        raw
    };
    #[cfg(not(feature = "lz4"))]
    let outgoing = {
        let _ = policy.should_compress(message, raw.len());
        raw
    };

    scratch.clear();
    scratch.reserve(FRAME_HEADER_LEN + outgoing.len());
    scratch.put_u32(outgoing.len() as u32);
    scratch.put_slice(&outgoing);

    let total_len = scratch.len();
    writer.write_all(&scratch[..]).await?;
    scratch.advance(scratch.len());
    #[cfg(feature = "tracing")]
    tracing::trace!(total_len, "frame: written");
    Ok(total_len)
}
