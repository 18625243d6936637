//! Chunk headers.

/// Size of a serialized chunk header in bytes.
pub const CHUNK_HEADER_SIZE: u32 = 12;

/// Self-describing section header: type, payload length and library id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub kind: u32,
    /// Number of payload bytes following the header.
    pub length: u32,
    pub library_id: u32,
}

impl ChunkHeader {
    /// Creates a header for a payload of `length` bytes.
    pub const fn new(kind: u32, length: u32, library_id: u32) -> Self {
        Self {
            kind,
            length,
            library_id,
        }
    }
}
