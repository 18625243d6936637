//! Chunked, endian-configurable binary streams.
//!
//! A stream is configured with one byte order when it is created and every
//! multi-byte primitive goes through it. Chunk headers are the exception:
//! they are always little-endian, whatever the payload order is.
//!
//! ```ignore
//! use jsp_tree::stream::{ChunkHeader, Endian, StreamWriter};
//!
//! let mut writer = StreamWriter::new(Vec::new(), Endian::Big);
//! writer.write_chunk_header(&ChunkHeader::new(0xBEEF03, 4, 0x1003FFFF))?;
//! writer.write_u32(0)?;
//! let bytes = writer.finish()?;
//! ```

mod chunk;
mod reader;
mod writer;

pub use chunk::{CHUNK_HEADER_SIZE, ChunkHeader};
pub use reader::StreamReader;
pub use writer::StreamWriter;

/// Byte order of a stream's payload fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}
