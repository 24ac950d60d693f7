#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `compress` wraps the single compression codec the connection core needs:
//! LZ4 block compression for the `Compressed` envelope described by the wire
//! protocol. It exists as its own crate, separate from `protocol`, so the
//! choice of LZ4 library stays swappable without touching message framing.
//!
//! # Design
//!
//! The [`lz4`] module is deliberately narrow: two functions, `compress` and
//! `decompress`, operating on the exact byte layout the wire protocol's
//! `Compressed` envelope expects (data with the underlying library's
//! length-prefix stripped). Higher layers treat this crate as a black-box
//! codec, per the connection core's scope.
//!
//! # Examples
//!
//! ```
//! use compress::lz4;
//!
//! let payload = b"folder index payload, repeated repeated repeated".repeat(4);
//! let wire_bytes = lz4::compress(&payload);
//! let restored = lz4::decompress(&wire_bytes, payload.len()).unwrap();
//! assert_eq!(restored, payload);
//! ```

#[cfg(feature = "lz4")]
pub mod lz4;
