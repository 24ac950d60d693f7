//! LZ4 block compression for the wire's `Compressed` envelope.
//!
//! # Wire quirk
//!
//! `lz4_flex::block::compress_prepend_size` writes a 4-byte little-endian
//! uncompressed length ahead of the compressed block — the same convention
//! several other LZ4 libraries default to. The connection wire format does
//! **not** carry that prefix on its own: the envelope already has an explicit
//! `uncompressedLength` field, so carrying the length twice would be wasted
//! bytes. [`compress`] strips the 4 bytes `lz4_flex` produces; [`decompress`]
//! synthesizes them back from the caller-supplied length before handing the
//! buffer to the decompressor.
//!
//! Swapping to a different LZ4 binding only requires touching this module —
//! one that doesn't prepend a length skips the strip/synthesize step
//! entirely.

use lz4_flex::block::DecompressError;

/// Number of bytes `lz4_flex` prepends to its compressed output.
const LENGTH_PREFIX_LEN: usize = 4;

/// Error returned when decompressing a `Compressed` envelope payload fails.
#[derive(Debug, thiserror::Error)]
#[error("lz4 decompression failed: {0}")]
pub struct Lz4Error(#[from] DecompressError);

/// Compresses `data`, returning wire bytes with the length prefix stripped.
///
/// Matches the `Always`/`Metadata` compression policy's expectation that the
/// caller already knows `data.len()` (it becomes `uncompressedLength` in the
/// envelope) and only needs the compressed bytes on the wire.
#[must_use]
pub fn compress(data: &[u8]) -> Vec<u8> {
    let framed = lz4_flex::block::compress_prepend_size(data);
    debug_assert!(framed.len() >= LENGTH_PREFIX_LEN);
    framed[LENGTH_PREFIX_LEN..].to_vec()
}

/// Decompresses wire bytes produced by [`compress`], given the original
/// uncompressed length carried alongside the envelope.
///
/// # Errors
///
/// Returns [`Lz4Error::Decompress`] if `wire_bytes` is not valid LZ4 block
/// data, or if the decompressed length does not match `uncompressed_len`.
pub fn decompress(wire_bytes: &[u8], uncompressed_len: usize) -> Result<Vec<u8>, Lz4Error> {
    let mut framed = Vec::with_capacity(LENGTH_PREFIX_LEN + wire_bytes.len());
    framed.extend_from_slice(&(uncompressed_len as u32).to_le_bytes());
    framed.extend_from_slice(wire_bytes);
    let decoded = lz4_flex::block::decompress_size_prepended(&framed)?;
    Ok(decoded)
}
