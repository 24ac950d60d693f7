//! Deterministic encode/decode for [`Message`], treated as a black-box
//! serializer by the rest of this crate and by the connection core.
//!
//! `bincode`'s default configuration is already deterministic for equal
//! values (fixed-width integers, no map non-determinism since the schema
//! uses no maps) and accepts any output it itself produced, which is the
//! only contract §6 asks of the serializer.

use crate::error::ProtocolError;
use crate::message::Message;

/// Serializes `message` to its canonical wire bytes.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] if `bincode` itself fails to encode
/// the value (this should not happen for well-formed `Message` values; the
/// schema has no types `bincode` cannot represent).
pub fn encode(message: &Message) -> Result<Vec<u8>, ProtocolError> {
    bincode::serialize(message).map_err(ProtocolError::Malformed)
}

/// Decodes wire bytes produced by [`encode`] (or by any encoder that
/// produces equivalent bytes) back into a [`Message`].
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] if `bytes` does not decode to a
/// valid `Message`.
pub fn decode(bytes: &[u8]) -> Result<Message, ProtocolError> {
    bincode::deserialize(bytes).map_err(ProtocolError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ClusterConfig, Message};

    #[test]
    fn round_trips_simple_message() {
        let msg = Message::Ping;
        let bytes = encode(&msg).unwrap();
        assert_eq!(decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn round_trips_cluster_config() {
        let msg = Message::ClusterConfig(ClusterConfig { folders: Vec::new() });
        let bytes = encode(&msg).unwrap();
        assert_eq!(decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn equal_values_encode_identically() {
        let msg = Message::Close { reason: "bye".to_string() };
        assert_eq!(encode(&msg).unwrap(), encode(&msg).unwrap());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode(&[0xff; 4]).is_err());
    }
}
