//! Writing side of the chunked stream.
//!
//! Every primitive is written with `write_all` semantics, so a sink that
//! accepts fewer bytes than requested fails the write.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use super::{ChunkHeader, Endian};
use crate::Result;

/// Byte sink with a fixed payload byte order.
///
/// Writes are all-or-nothing: a short write surfaces as [`crate::Error::Io`].
#[derive(Debug)]
pub struct StreamWriter<W: Write> {
    inner: W,
    endian: Endian,
}

impl StreamWriter<BufWriter<File>> {
    /// Creates (or truncates) the file at `path` and opens a buffered stream on it.
    pub fn create(path: impl AsRef<Path>, endian: Endian) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), endian))
    }
}

impl<W: Write> StreamWriter<W> {
    /// Wraps `inner`, writing payload fields in `endian` order.
    pub fn new(inner: W, endian: Endian) -> Self {
        Self { inner, endian }
    }

    /// Payload byte order of this stream.
    #[inline]
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Flushes and hands back the sink.
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }

    /// Writes a chunk header. Always little-endian.
    pub fn write_chunk_header(&mut self, header: &ChunkHeader) -> Result<()> {
        self.inner.write_u32::<LittleEndian>(header.kind)?;
        self.inner.write_u32::<LittleEndian>(header.length)?;
        self.inner.write_u32::<LittleEndian>(header.library_id)?;
        Ok(())
    }

    /// Raw bytes, written as-is.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    /// Writes one byte.
    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.inner.write_u8(value)?;
        Ok(())
    }

    /// Writes an `u16` in the stream's byte order.
    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        match self.endian {
            Endian::Little => self.inner.write_u16::<LittleEndian>(value)?,
            Endian::Big => self.inner.write_u16::<BigEndian>(value)?,
        }
        Ok(())
    }

    /// Writes an `u32` in the stream's byte order.
    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        match self.endian {
            Endian::Little => self.inner.write_u32::<LittleEndian>(value)?,
            Endian::Big => self.inner.write_u32::<BigEndian>(value)?,
        }
        Ok(())
    }

    /// Writes an `i32` in the stream's byte order.
    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        match self.endian {
            Endian::Little => self.inner.write_i32::<LittleEndian>(value)?,
            Endian::Big => self.inner.write_i32::<BigEndian>(value)?,
        }
        Ok(())
    }

    /// Writes an `u64` in the stream's byte order.
    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        match self.endian {
            Endian::Little => self.inner.write_u64::<LittleEndian>(value)?,
            Endian::Big => self.inner.write_u64::<BigEndian>(value)?,
        }
        Ok(())
    }

    /// Writes an `f32` in the stream's byte order.
    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        match self.endian {
            Endian::Little => self.inner.write_f32::<LittleEndian>(value)?,
            Endian::Big => self.inner.write_f32::<BigEndian>(value)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_follow_stream_order() {
        let mut le = StreamWriter::new(Vec::new(), Endian::Little);
        le.write_u16(0x0102).unwrap();
        le.write_u32(0x0304_0506).unwrap();
        le.write_u8(0x07).unwrap();
        assert_eq!(le.finish().unwrap(), [0x02, 0x01, 0x06, 0x05, 0x04, 0x03, 0x07]);

        let mut be = StreamWriter::new(Vec::new(), Endian::Big);
        be.write_u16(0x0102).unwrap();
        be.write_u32(0x0304_0506).unwrap();
        be.write_u8(0x07).unwrap();
        assert_eq!(be.finish().unwrap(), [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07]);
    }

    #[test]
    fn chunk_header_ignores_stream_order() {
        let header = ChunkHeader::new(0xBEEF01, 0x20, 0x1003FFFF);

        let mut le = StreamWriter::new(Vec::new(), Endian::Little);
        le.write_chunk_header(&header).unwrap();
        let mut be = StreamWriter::new(Vec::new(), Endian::Big);
        be.write_chunk_header(&header).unwrap();

        let le = le.finish().unwrap();
        assert_eq!(le, be.finish().unwrap());
        assert_eq!(&le[..4], &[0x01, 0xEF, 0xBE, 0x00]);
    }

    #[test]
    fn floats_and_u64_are_swapped_whole() {
        let mut be = StreamWriter::new(Vec::new(), Endian::Big);
        be.write_f32(1.0).unwrap();
        be.write_u64(0x0102_0304_0506_0708).unwrap();
        assert_eq!(
            be.finish().unwrap(),
            [0x3F, 0x80, 0x00, 0x00, 1, 2, 3, 4, 5, 6, 7, 8]
        );
    }

    #[test]
    fn short_write_is_an_io_error() {
        let mut buf = [0u8; 3];
        let mut writer = StreamWriter::new(&mut buf[..], Endian::Little);
        assert!(matches!(writer.write_u32(1), Err(crate::Error::Io(_))));
    }
}
