//! Reading side of the chunked stream.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use super::{ChunkHeader, Endian};
use crate::Result;

/// Byte source with a fixed payload byte order.
#[derive(Debug)]
pub struct StreamReader<R: Read + Seek> {
    inner: R,
    endian: Endian,
}

impl StreamReader<BufReader<File>> {
    /// Opens the file at `path` for buffered reading.
    pub fn open(path: impl AsRef<Path>, endian: Endian) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), endian))
    }
}

impl<R: Read + Seek> StreamReader<R> {
    /// Wraps `inner`, reading payload fields in `endian` order.
    pub fn new(inner: R, endian: Endian) -> Self {
        Self { inner, endian }
    }

    /// Payload byte order of this stream.
    #[inline]
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Current offset from the start of the stream.
    pub fn position(&mut self) -> Result<u64> {
        Ok(self.inner.stream_position()?)
    }

    /// Moves to the absolute offset `pos`.
    pub fn seek_to(&mut self, pos: u64) -> Result<()> {
        self.inner.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    /// Skips `len` bytes forward.
    pub fn skip(&mut self, len: u32) -> Result<()> {
        self.inner.seek(SeekFrom::Current(i64::from(len)))?;
        Ok(())
    }

    /// Reads the next chunk header, or `None` at a clean end of stream.
    pub fn read_chunk_header(&mut self) -> Result<Option<ChunkHeader>> {
        let mut raw = [0u8; 12];
        let mut filled = 0;
        while filled < raw.len() {
            match self.inner.read(&mut raw[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into()),
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        let mut fields = &raw[..];
        Ok(Some(ChunkHeader {
            kind: fields.read_u32::<LittleEndian>()?,
            length: fields.read_u32::<LittleEndian>()?,
            library_id: fields.read_u32::<LittleEndian>()?,
        }))
    }

    /// Scans sibling chunks until one of type `kind` is found, skipping the payloads of the others.
    ///
    /// On success the stream is positioned at the start of the found chunk's payload.
    pub fn find_chunk(&mut self, kind: u32) -> Result<Option<ChunkHeader>> {
        while let Some(header) = self.read_chunk_header()? {
            if header.kind == kind {
                return Ok(Some(header));
            }
            tracing::trace!(
                found = header.kind,
                wanted = kind,
                len = header.length,
                "skipping chunk"
            );
            self.skip(header.length)?;
        }
        Ok(None)
    }

    /// Like [`StreamReader::find_chunk`], but never looks at a header starting at or past `end`.
    pub fn find_chunk_within(&mut self, kind: u32, end: u64) -> Result<Option<ChunkHeader>> {
        while self.position()? < end {
            let Some(header) = self.read_chunk_header()? else {
                return Ok(None);
            };
            if header.kind == kind {
                return Ok(Some(header));
            }
            self.skip(header.length)?;
        }
        Ok(None)
    }

    /// Fills `buf` exactly. Bytes are not reordered.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<()> {
        self.inner.read_exact(buf)?;
        Ok(())
    }

    /// Reads one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.inner.read_u8()?)
    }

    /// Reads an `u16` in the stream's byte order.
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(match self.endian {
            Endian::Little => self.inner.read_u16::<LittleEndian>()?,
            Endian::Big => self.inner.read_u16::<BigEndian>()?,
        })
    }

    /// Reads an `u32` in the stream's byte order.
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(match self.endian {
            Endian::Little => self.inner.read_u32::<LittleEndian>()?,
            Endian::Big => self.inner.read_u32::<BigEndian>()?,
        })
    }

    /// Reads an `i32` in the stream's byte order.
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(match self.endian {
            Endian::Little => self.inner.read_i32::<LittleEndian>()?,
            Endian::Big => self.inner.read_i32::<BigEndian>()?,
        })
    }

    /// Reads an `u64` in the stream's byte order.
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(match self.endian {
            Endian::Little => self.inner.read_u64::<LittleEndian>()?,
            Endian::Big => self.inner.read_u64::<BigEndian>()?,
        })
    }

    /// Reads an `f32` in the stream's byte order.
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(match self.endian {
            Endian::Little => self.inner.read_f32::<LittleEndian>()?,
            Endian::Big => self.inner.read_f32::<BigEndian>()?,
        })
    }
}
