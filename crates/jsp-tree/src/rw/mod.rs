//! RenderWare clump (`.dff`) decoding.
//!
//! Only what the collision builder needs is kept: frames, geometry vertex
//! positions (first morph target) with their bin-mesh strips, and atomics.
//! Everything else is skipped by chunk length. All clump data is
//! little-endian.

mod clump;
mod geometry;

use std::io::{Read, Seek};
use std::path::Path;

use crate::scene::Scene;
use crate::stream::{ChunkHeader, Endian, StreamReader};
use crate::{Error, Result};

pub use clump::read_clump_body;
pub use geometry::read_geometry;

pub const ID_STRUCT: u32 = 0x01;
pub const ID_EXTENSION: u32 = 0x03;
pub const ID_FRAMELIST: u32 = 0x0E;
pub const ID_GEOMETRY: u32 = 0x0F;
pub const ID_CLUMP: u32 = 0x10;
pub const ID_ATOMIC: u32 = 0x14;
pub const ID_GEOMETRYLIST: u32 = 0x1A;
pub const ID_BINMESH: u32 = 0x50E;

/// Finds the first clump in the stream and decodes it.
#[tracing::instrument(skip_all)]
pub fn read_clump<R: Read + Seek>(reader: &mut StreamReader<R>) -> Result<Scene> {
    let header = require_chunk(reader, ID_CLUMP, None)?;
    let end = payload_end(reader, &header)?;
    let scene = read_clump_body(reader, end)?;

    tracing::debug!(
        frames = scene.frames.len(),
        geometries = scene.geometries.len(),
        surfaces = scene.surfaces.len(),
        "decoded clump"
    );
    Ok(scene)
}

/// Opens `path` and decodes the first clump in it.
pub fn read_clump_file(path: impl AsRef<Path>) -> Result<Scene> {
    let mut reader = StreamReader::open(path, Endian::Little)?;
    read_clump(&mut reader)
}

/// Scans siblings for `kind`, failing with [`Error::MissingChunk`] if the
/// stream (or the enclosing chunk ending at `end`) runs out first.
fn require_chunk<R: Read + Seek>(
    reader: &mut StreamReader<R>,
    kind: u32,
    end: Option<u64>,
) -> Result<ChunkHeader> {
    let found = match end {
        Some(end) => reader.find_chunk_within(kind, end)?,
        None => reader.find_chunk(kind)?,
    };
    found.ok_or(Error::MissingChunk { chunk: kind })
}

/// Absolute stream offset one past the payload of the chunk whose header was just read.
fn payload_end<R: Read + Seek>(reader: &mut StreamReader<R>, header: &ChunkHeader) -> Result<u64> {
    Ok(reader.position()? + u64::from(header.length))
}

fn skip_bytes<R: Read + Seek>(reader: &mut StreamReader<R>, len: u64) -> Result<()> {
    let pos = reader.position()?;
    reader.seek_to(pos + len)
}

/// Reads a count or index field that the format stores as a signed word.
fn read_count<R: Read + Seek>(reader: &mut StreamReader<R>, what: &'static str) -> Result<usize> {
    let value = reader.read_i32()?;
    usize::try_from(value).map_err(|_| Error::IndexOutOfRange {
        what,
        index: i64::from(value),
        len: 0,
    })
}
