//! The message schema exchanged once the connection is established.
//!
//! Types here are plain data — encoding/decoding is handled by [`crate::wire`]
//! treating `serde` + `bincode` as the deterministic black-box serializer the
//! design explicitly keeps out of scope. Nothing in this module inspects
//! field contents beyond what the reader loop's state machine and file-name
//! filter require (see [`crate::filter`]).

use serde::{Deserialize, Serialize};

/// Opaque identity of a remote peer: a fixed-width binary identifier,
/// supplied and verified by the transport layer this core sits on top of.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceId(pub [u8; 32]);

impl std::fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// A monotonic (device, counter) pair used to order `FileInfo` revisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counter {
    /// Short device identifier contributing this counter value.
    pub id: u64,
    /// Monotonically increasing value from that device.
    pub value: u64,
}

/// A single block's location and content hash within a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Byte offset of the block within the file.
    pub offset: i64,
    /// Block length in bytes (the final block of a file may be shorter than
    /// [`crate::constants::BLOCK_SIZE`]).
    pub size: i32,
    /// Content hash of the block, opaque to this crate.
    pub hash: Vec<u8>,
}

/// The kind of filesystem entry a [`FileInfo`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    /// A regular file.
    File,
    /// A directory.
    Directory,
    /// A symbolic link.
    Symlink,
}

/// An entry in a folder index. Only [`FileInfo::name`] is inspected by this
/// crate (the file-name filter in [`crate::filter`]); everything else is
/// forwarded to the model layer untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    /// Path of the entry relative to the folder root.
    pub name: String,
    /// Kind of entry.
    pub file_type: FileType,
    /// Size in bytes (meaningless for directories).
    pub size: i64,
    /// Modification time, Unix seconds.
    pub modified_s: i64,
    /// POSIX-style permission bits.
    pub permissions: u32,
    /// Tombstone marker: the entry has been deleted.
    pub deleted: bool,
    /// Version vector for conflict detection.
    pub version: Vec<Counter>,
    /// Per-folder monotonic sequence number.
    pub sequence: i64,
    /// Block size used to chunk this file; 0 for directories/symlinks.
    pub block_size: i32,
    /// Block list; empty for directories/symlinks/deleted entries.
    pub blocks: Vec<BlockInfo>,
}

/// A device's share of a single folder, as announced in a `ClusterConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfigDevice {
    /// Identity of the device this entry describes.
    pub id: DeviceId,
    /// Human-readable device name, as advertised by its owner.
    pub name: String,
    /// Sharing flags, a combination of [`crate::flags::share`] bits.
    pub flags: u32,
    /// Highest index sequence number this device has announced for the
    /// folder, used by the model layer to detect missed updates.
    pub max_sequence: i64,
    /// Opaque identifier of the index generation this device is sending.
    pub index_id: u64,
}

/// A single shared folder, as announced in a `ClusterConfig`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfigFolder {
    /// Stable folder identifier, shared verbatim across devices.
    pub id: String,
    /// Human-readable folder label.
    pub label: String,
    /// Folder-level flags, a combination of [`crate::flags::folder`] bits.
    pub flags: u32,
    /// Devices sharing this folder, including the sender.
    pub devices: Vec<ClusterConfigDevice>,
}

/// Folder and device membership announcement; the handshake message that
/// must be the first message seen on every connection (§4.2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Folders the sender knows about and wishes to discuss on this
    /// connection.
    pub folders: Vec<ClusterConfigFolder>,
}

/// The kind of change a [`FileDownloadProgressUpdate`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadProgressUpdateType {
    /// New block indexes have been downloaded and appended to the update.
    Append,
    /// A previously reported in-progress download has been abandoned.
    Forget,
}

/// Informational progress update for a file currently being downloaded by
/// the sender. Opaque to this crate beyond what's needed to forward it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDownloadProgressUpdate {
    /// Name of the file being downloaded.
    pub name: String,
    /// Kind of update.
    pub update_type: DownloadProgressUpdateType,
    /// Version of the file this progress applies to.
    pub version: Vec<Counter>,
    /// Indexes, into the file's block list, that have completed.
    pub block_indexes: Vec<i32>,
}

/// The wire message schema: exactly one payload arm is ever set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    /// Folder and device membership announcement. Must be the first message
    /// on a connection.
    ClusterConfig(ClusterConfig),
    /// Initial file listing for a folder.
    Index {
        /// Folder identifier the listing belongs to.
        folder: String,
        /// Full file listing.
        files: Vec<FileInfo>,
    },
    /// Incremental update to a previously sent `Index`.
    IndexUpdate {
        /// Folder identifier the update belongs to.
        folder: String,
        /// Changed entries only.
        files: Vec<FileInfo>,
    },
    /// A request to read a block of file content.
    Request {
        /// Caller-chosen identifier, paired with the eventual `Response`.
        id: i32,
        /// Folder the file belongs to.
        folder: String,
        /// Path of the file within the folder.
        name: String,
        /// Byte offset of the requested block.
        offset: i64,
        /// Length of the requested block.
        size: i32,
        /// Content hash the requester expects this block to have.
        hash: Vec<u8>,
        /// Whether to read from the folder's temporary file instead of the
        /// final file on disk.
        from_temporary: bool,
    },
    /// Reply to a `Request`.
    Response {
        /// Identifier copied from the originating `Request`.
        id: i32,
        /// Block content; empty when `code` is non-zero.
        data: Vec<u8>,
        /// Wire error code; `0` ([`crate::codes::NO_ERROR`]) means success.
        code: i32,
    },
    /// Informational notice about in-progress downloads.
    DownloadProgress {
        /// Folder the updates belong to.
        folder: String,
        /// One entry per file with an in-progress download.
        updates: Vec<FileDownloadProgressUpdate>,
    },
    /// Liveness probe; carries no payload.
    Ping,
    /// Orderly shutdown request, with a human-readable reason.
    Close {
        /// Reason the sender is closing the connection.
        reason: String,
    },
    /// Envelope whose `data`, once decompressed to `uncompressed_length`
    /// bytes, decodes to exactly one of the other variants. Never nests.
    Compressed {
        /// Compressed bytes, see [`crate::envelope`] for the exact framing.
        data: Vec<u8>,
        /// Length of `data` once decompressed.
        uncompressed_length: i32,
    },
}
