//! The `Compressed` envelope and the outbound compression policy.

use crate::constants::COMPRESSION_THRESHOLD;
use crate::message::Message;

/// Caller-configured policy governing which outbound messages get wrapped in
/// a `Compressed` envelope. Inbound decompression is unconditional whenever
/// the envelope is present, regardless of policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionPolicy {
    /// Never compress outbound messages.
    #[default]
    Never,
    /// Compress outbound messages at or above the threshold, except
    /// `Response` (block payloads are typically already dense/incompressible
    /// or dominate bandwidth enough that the CPU cost isn't worth it).
    Metadata,
    /// Compress every outbound message at or above the threshold.
    Always,
}

impl CompressionPolicy {
    /// Decides whether `message`, with `raw_len` serialized bytes, should be
    /// wrapped in a `Compressed` envelope before being written to the wire.
    #[must_use]
    pub fn should_compress(self, message: &Message, raw_len: usize) -> bool {
        if raw_len < COMPRESSION_THRESHOLD {
            return false;
        }
        match self {
            CompressionPolicy::Never => false,
            CompressionPolicy::Metadata => !matches!(message, Message::Response { .. }),
            CompressionPolicy::Always => true,
        }
    }
}

/// Wraps already-serialized `raw` bytes in a `Compressed` envelope.
#[cfg(feature = "lz4")]
#[must_use]
pub fn compress(raw: &[u8]) -> Message {
    Message::Compressed {
        data: compress::lz4::compress(raw),
        uncompressed_length: raw.len() as i32,
    }
}

/// Decompresses a `Compressed` envelope's `data`/`uncompressed_length` pair
/// back into the raw serialized bytes of the wrapped message.
///
/// # Errors
///
/// Returns [`crate::error::ProtocolError::Codec`] if decompression fails or
/// the decompressed length disagrees with `uncompressed_length`.
#[cfg(feature = "lz4")]
pub fn decompress(
    data: &[u8],
    uncompressed_length: i32,
) -> Result<Vec<u8>, crate::error::ProtocolError> {
    let decoded = compress::lz4::decompress(data, uncompressed_length.max(0) as usize)?;
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ClusterConfig, FileInfo, FileType};

    fn index_message(file_count: usize) -> Message {
        Message::Index {
            folder: "docs".to_string(),
            files: (0..file_count)
                .map(|i| FileInfo {
                    name: format!("file-{i}.txt"),
                    file_type: FileType::File,
                    size: 0,
                    modified_s: 0,
                    permissions: 0,
                    deleted: false,
                    version: Vec::new(),
                    sequence: 0,
                    block_size: 0,
                    blocks: Vec::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn never_policy_never_compresses() {
        let msg = index_message(100);
        let raw = crate::wire::encode(&msg).unwrap();
        assert!(!CompressionPolicy::Never.should_compress(&msg, raw.len()));
    }

    #[test]
    fn below_threshold_never_compresses_regardless_of_policy() {
        let msg = Message::Ping;
        let raw = crate::wire::encode(&msg).unwrap();
        assert!(raw.len() < COMPRESSION_THRESHOLD);
        for policy in [
            CompressionPolicy::Never,
            CompressionPolicy::Metadata,
            CompressionPolicy::Always,
        ] {
            assert!(!policy.should_compress(&msg, raw.len()));
        }
    }

    #[test]
    fn metadata_policy_skips_response_but_compresses_others() {
        let response = Message::Response {
            id: 0,
            data: vec![0u8; 200],
            code: 0,
        };
        let response_len = crate::wire::encode(&response).unwrap().len();
        assert!(response_len >= COMPRESSION_THRESHOLD);
        assert!(!CompressionPolicy::Metadata.should_compress(&response, response_len));

        let cc = Message::ClusterConfig(ClusterConfig { folders: Vec::new() });
        let padded = index_message(20);
        let padded_len = crate::wire::encode(&padded).unwrap().len();
        assert!(padded_len >= COMPRESSION_THRESHOLD);
        assert!(CompressionPolicy::Metadata.should_compress(&padded, padded_len));
        let _ = cc;
    }

    #[test]
    fn always_policy_compresses_everything_above_threshold() {
        let response = Message::Response {
            id: 0,
            data: vec![0u8; 200],
            code: 0,
        };
        let len = crate::wire::encode(&response).unwrap().len();
        assert!(CompressionPolicy::Always.should_compress(&response, len));
    }

    #[test]
    fn literal_compression_boundary_at_127_and_128_bytes() {
        let msg = index_message(1);
        assert!(!CompressionPolicy::Always.should_compress(&msg, 127));
        assert!(CompressionPolicy::Always.should_compress(&msg, 128));
    }

    #[test]
    fn metadata_policy_with_10_000_byte_payloads() {
        let response = Message::Response { id: 0, data: vec![0u8; 10_000], code: 0 };
        assert!(!CompressionPolicy::Metadata.should_compress(&response, 10_000));

        let index = index_message(1);
        assert!(CompressionPolicy::Metadata.should_compress(&index, 10_000));
    }

    #[cfg(feature = "lz4")]
    #[test]
    fn compress_decompress_round_trip() {
        let raw = crate::wire::encode(&index_message(50)).unwrap();
        let wrapped = compress(&raw);
        let Message::Compressed { data, uncompressed_length } = wrapped else {
            panic!("expected Compressed envelope");
        };
        assert_eq!(uncompressed_length as usize, raw.len());
        let restored = decompress(&data, uncompressed_length).unwrap();
        assert_eq!(restored, raw);
    }
}
