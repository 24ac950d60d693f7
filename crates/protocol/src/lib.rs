//! Wire framing, message schema, and compression envelope for the peer
//! connection core.
//!
//! This crate owns everything that is purely a function of bytes on the
//! wire: the [`message::Message`] schema, its `bincode` encoding
//! ([`wire`]), the length-prefixed frame format and `Compressed` envelope
//! handling ([`frame`], [`envelope`]), the inbound file-name filter
//! ([`filter`]), and the small fixed vocabularies of flags and error codes
//! ([`flags`], [`codes`]). It knows nothing about sockets, tasks, or
//! connection lifecycle — that belongs to the `connection` crate built on
//! top of it.

pub mod codes;
pub mod constants;
pub mod envelope;
pub mod error;
pub mod filter;
#[cfg(feature = "async")]
pub mod frame;
pub mod flags;
pub mod message;
pub mod wire;

pub use envelope::CompressionPolicy;
pub use error::ProtocolError;
pub use message::{DeviceId, Message};
