//! Error type shared by the decoder, builder and codec.

use thiserror::Error;

use crate::stream::Endian;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can abort a build.
///
/// There are two families: I/O failures and malformed or unsupported input.
/// Neither is recoverable for the current run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("geometry {geometry} is stored in a native platform encoding, which is unsupported")]
    UnsupportedGeometry { geometry: usize },

    #[error("geometry {geometry} is not a tri-strip mesh")]
    UnsupportedMeshTopology { geometry: usize },

    #[error("geometry {geometry} vertex {index} has a non-finite position")]
    InvalidVertex { geometry: usize, index: usize },

    #[error("required chunk {chunk:#x} not found")]
    MissingChunk { chunk: u32 },

    #[error("chunk {chunk:#x} declares {declared} bytes but its contents need {expected}")]
    ChunkSizeMismatch {
        chunk: u32,
        declared: u32,
        expected: u32,
    },

    #[error("bad magic in chunk {chunk:#x}: {found:#x}")]
    BadMagic { chunk: u32, found: u32 },

    #[error("{what} index {index} out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: i64,
        len: usize,
    },

    #[error("{what} value {value} does not fit its {bits}-bit field")]
    FieldOverflow {
        what: &'static str,
        value: i64,
        bits: u32,
    },

    #[error("stream byte order is {found:?} but the target platform uses {expected:?}")]
    EndianMismatch { expected: Endian, found: Endian },

    #[error("malformed branch reference {bits:#010x}")]
    BadNodeRef { bits: u32 },

    #[error("scene has {found} usable triangles, at least 2 are needed to build a tree")]
    NotEnoughTriangles { found: usize },

    #[error("partition step called on range [{lo}, {hi}] with fewer than two triangles")]
    InvalidRange { lo: usize, hi: usize },

    #[error("invalid build configuration: {0}")]
    InvalidConfig(&'static str),
}
