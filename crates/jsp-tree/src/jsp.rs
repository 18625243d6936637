//! The JSP container: collision tree, per-surface metadata and the optional
//! strip vector cache, plus its chunked binary encoding.

use std::io::{Read, Seek, Write};
use std::path::Path;

use bitflags::bitflags;
use nalgebra::Point3;

use crate::bsp::{BranchNode, BuildStats, CollisionTree, NodeRef, TreeBuilder};
use crate::config::{BuildConfig, Platform};
use crate::extract::{Extraction, extract};
use crate::scene::Scene;
use crate::stream::{CHUNK_HEADER_SIZE, ChunkHeader, Endian, StreamReader, StreamWriter};
use crate::triangle::{CollTriangle, TriangleFlags};
use crate::{BoundingBox, Error, Result};

/// Library id stamped on every chunk this crate writes.
pub const LIBRARY_ID: u32 = 0x1003_FFFF;

pub const COLLISION_CHUNK: u32 = 0xBEEF01;
pub const METADATA_CHUNK: u32 = 0xBEEF02;
pub const STRIP_VECTORS_CHUNK: u32 = 0xBEEF03;

/// `"CCOL"` when read as little-endian bytes.
pub const COLLISION_MAGIC: u32 = 0x4C4F_4343;
pub const JSP_TAG: [u8; 4] = *b"JSP\0";
pub const JSP_VERSION: u32 = 3;

const COLLISION_HEADER_SIZE: u32 = 12;
const BRANCH_NODE_SIZE: u32 = 16;
const TRIANGLE_SIZE: u32 = 8;
const METADATA_HEADER_SIZE: u32 = 24;
const SURFACE_INFO_SIZE: u32 = 8;
const STRIP_VECTOR_SIZE: u32 = 12;

bitflags! {
    /// Per-surface render hints stored in the metadata chunk.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SurfaceInfoFlags: u32 {
        const DEFAULT    = 0x1;
        const NO_ZBUFFER = 0x2;
        const NO_CULL    = 0x4;

        const _ = !0;
    }
}

/// Metadata entry for one surface, in reverse surface order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceInfo {
    pub original_material: i32,
    pub flags: SurfaceInfoFlags,
}

impl Default for SurfaceInfo {
    fn default() -> Self {
        Self {
            original_material: -1,
            flags: SurfaceInfoFlags::DEFAULT,
        }
    }
}

/// A built collision asset, ready to be written for a platform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Jsp {
    pub tree: CollisionTree,
    pub surface_infos: Vec<SurfaceInfo>,
    /// Flattened strip positions. Only persisted for platforms that want them.
    pub strip_vectors: Vec<Point3<f32>>,
}

impl Jsp {
    /// Extracts, partitions and assembles a collision asset from `scene`.
    ///
    /// The root box covers every vertex of every geometry, used or not.
    #[tracing::instrument(
        skip_all,
        fields(surfaces = scene.surfaces.len(), geometries = scene.geometries.len())
    )]
    pub fn build(scene: &Scene, config: &BuildConfig) -> Result<(Jsp, BuildStats)> {
        config.validate()?;

        let Extraction {
            surface_infos,
            strip_vectors,
            mut triangles,
        } = extract(scene)?;

        let vertices = scene.geometries.iter().flat_map(|g| g.vertices.iter());
        let bounds = BoundingBox::from_points(vertices);
        let (tree, stats) = TreeBuilder::new(*config).build(&mut triangles, &bounds)?;

        Ok((
            Jsp {
                tree,
                surface_infos,
                strip_vectors,
            },
            stats,
        ))
    }

    /// Payload length of the collision chunk.
    pub fn collision_chunk_len(&self) -> u64 {
        u64::from(COLLISION_HEADER_SIZE)
            + u64::from(BRANCH_NODE_SIZE) * self.tree.branch_nodes().len() as u64
            + u64::from(TRIANGLE_SIZE) * self.tree.triangles().len() as u64
    }

    /// Payload length of the tree metadata chunk.
    pub fn metadata_chunk_len(&self) -> u64 {
        u64::from(METADATA_HEADER_SIZE)
            + u64::from(SURFACE_INFO_SIZE) * self.surface_infos.len() as u64
    }

    /// Payload length of the strip vector chunk.
    pub fn strip_vectors_chunk_len(&self) -> u64 {
        4 + u64::from(STRIP_VECTOR_SIZE) * self.strip_vectors.len() as u64
    }

    /// Total size of the encoded file for `platform`.
    pub fn encoded_len(&self, platform: Platform) -> u64 {
        let mut len = 2 * u64::from(CHUNK_HEADER_SIZE)
            + self.collision_chunk_len()
            + self.metadata_chunk_len();
        if platform.writes_strip_vectors() {
            len += u64::from(CHUNK_HEADER_SIZE) + self.strip_vectors_chunk_len();
        }
        len
    }

    /// Writes the collision chunk, the metadata chunk and, where the platform
    /// uses it, the strip vector chunk.
    ///
    /// Fails with [`Error::EndianMismatch`] if the stream's byte order is not
    /// the platform's.
    #[tracing::instrument(skip_all, fields(%platform))]
    pub fn write<W: Write>(&self, writer: &mut StreamWriter<W>, platform: Platform) -> Result<()> {
        check_endian(platform, writer.endian())?;

        self.write_collision(writer)?;
        self.write_metadata(writer)?;
        if platform.writes_strip_vectors() {
            self.write_strip_vectors(writer)?;
        }

        tracing::debug!(bytes = self.encoded_len(platform), "wrote jsp");
        Ok(())
    }

    /// Creates `path` and writes the asset with the platform's byte order.
    ///
    /// A failed write leaves whatever was already written behind.
    pub fn write_to_path(&self, path: impl AsRef<Path>, platform: Platform) -> Result<()> {
        let mut writer = StreamWriter::create(path, platform.endian())?;
        self.write(&mut writer, platform)?;
        writer.finish()?;
        Ok(())
    }

    /// Encodes into memory.
    pub fn to_bytes(&self, platform: Platform) -> Result<Vec<u8>> {
        let capacity = self.encoded_len(platform) as usize;
        let mut writer = StreamWriter::new(Vec::with_capacity(capacity), platform.endian());
        self.write(&mut writer, platform)?;
        writer.finish()
    }

    fn write_collision<W: Write>(&self, writer: &mut StreamWriter<W>) -> Result<()> {
        let nodes = self.tree.branch_nodes();
        let triangles = self.tree.triangles();

        let len = chunk_len(self.collision_chunk_len())?;
        writer.write_chunk_header(&ChunkHeader::new(COLLISION_CHUNK, len, LIBRARY_ID))?;
        writer.write_u32(COLLISION_MAGIC)?;
        writer.write_u32(nodes.len() as u32)?;
        writer.write_u32(triangles.len() as u32)?;

        for node in nodes {
            writer.write_u32(node.left.bits())?;
            writer.write_u32(node.right.bits())?;
            writer.write_f32(node.left_value)?;
            writer.write_f32(node.right_value)?;
        }

        for tri in triangles {
            writer.write_u16(tri.surface)?;
            writer.write_u16(tri.vertex)?;
            writer.write_u8(tri.flags.bits())?;
            writer.write_u8(tri.platform_data)?;
            writer.write_u16(tri.material)?;
        }
        Ok(())
    }

    fn write_metadata<W: Write>(&self, writer: &mut StreamWriter<W>) -> Result<()> {
        let len = chunk_len(self.metadata_chunk_len())?;
        writer.write_chunk_header(&ChunkHeader::new(METADATA_CHUNK, len, LIBRARY_ID))?;
        writer.write_bytes(&JSP_TAG)?;
        writer.write_u32(JSP_VERSION)?;
        writer.write_u32(self.surface_infos.len() as u32)?;
        // Runtime pointer slots: clump, collision tree, node list.
        for _ in 0..3 {
            writer.write_u32(0)?;
        }

        for info in &self.surface_infos {
            writer.write_i32(info.original_material)?;
            writer.write_i32(info.flags.bits() as i32)?;
        }
        Ok(())
    }

    fn write_strip_vectors<W: Write>(&self, writer: &mut StreamWriter<W>) -> Result<()> {
        let len = chunk_len(self.strip_vectors_chunk_len())?;
        writer.write_chunk_header(&ChunkHeader::new(STRIP_VECTORS_CHUNK, len, LIBRARY_ID))?;
        writer.write_u32(self.strip_vectors.len() as u32)?;
        for v in &self.strip_vectors {
            writer.write_f32(v.x)?;
            writer.write_f32(v.y)?;
            writer.write_f32(v.z)?;
        }
        Ok(())
    }

    /// Reads an asset written for `platform`.
    ///
    /// Sibling chunks of other types are skipped. Declared chunk lengths must
    /// match the counts they carry.
    #[tracing::instrument(skip_all, fields(%platform))]
    pub fn read<R: Read + Seek>(reader: &mut StreamReader<R>, platform: Platform) -> Result<Jsp> {
        check_endian(platform, reader.endian())?;

        let tree = read_collision(reader)?;
        let surface_infos = read_metadata(reader)?;
        let strip_vectors = if platform.writes_strip_vectors() {
            read_strip_vectors(reader)?
        } else {
            Vec::new()
        };

        tracing::debug!(
            branch_nodes = tree.branch_nodes().len(),
            triangles = tree.triangles().len(),
            surfaces = surface_infos.len(),
            strip_vectors = strip_vectors.len(),
            "read jsp"
        );
        Ok(Jsp {
            tree,
            surface_infos,
            strip_vectors,
        })
    }

    /// Opens `path` and reads an asset written for `platform`.
    pub fn read_from_path(path: impl AsRef<Path>, platform: Platform) -> Result<Jsp> {
        let mut reader = StreamReader::open(path, platform.endian())?;
        Self::read(&mut reader, platform)
    }
}

fn chunk_len(len: u64) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::FieldOverflow {
        what: "chunk length",
        value: len as i64,
        bits: 32,
    })
}

fn check_endian(platform: Platform, found: Endian) -> Result<()> {
    let expected = platform.endian();
    if found != expected {
        return Err(Error::EndianMismatch { expected, found });
    }
    Ok(())
}

fn expect_chunk<R: Read + Seek>(reader: &mut StreamReader<R>, kind: u32) -> Result<ChunkHeader> {
    reader.find_chunk(kind)?.ok_or(Error::MissingChunk { chunk: kind })
}

fn check_len(header: &ChunkHeader, expected: u64) -> Result<()> {
    if u64::from(header.length) != expected {
        return Err(Error::ChunkSizeMismatch {
            chunk: header.kind,
            declared: header.length,
            expected: u32::try_from(expected).unwrap_or(u32::MAX),
        });
    }
    Ok(())
}

fn read_collision<R: Read + Seek>(reader: &mut StreamReader<R>) -> Result<CollisionTree> {
    let header = expect_chunk(reader, COLLISION_CHUNK)?;

    let magic = reader.read_u32()?;
    if magic != COLLISION_MAGIC {
        return Err(Error::BadMagic {
            chunk: COLLISION_CHUNK,
            found: magic,
        });
    }
    let num_nodes = reader.read_u32()?;
    let num_triangles = reader.read_u32()?;
    check_len(
        &header,
        u64::from(COLLISION_HEADER_SIZE)
            + u64::from(BRANCH_NODE_SIZE) * u64::from(num_nodes)
            + u64::from(TRIANGLE_SIZE) * u64::from(num_triangles),
    )?;

    let mut nodes = Vec::with_capacity(num_nodes as usize);
    for _ in 0..num_nodes {
        nodes.push(BranchNode {
            left: NodeRef::from_bits(reader.read_u32()?)?,
            right: NodeRef::from_bits(reader.read_u32()?)?,
            left_value: reader.read_f32()?,
            right_value: reader.read_f32()?,
        });
    }

    let mut triangles = Vec::with_capacity(num_triangles as usize);
    for _ in 0..num_triangles {
        triangles.push(CollTriangle {
            surface: reader.read_u16()?,
            vertex: reader.read_u16()?,
            flags: TriangleFlags::from_bits_retain(reader.read_u8()?),
            platform_data: reader.read_u8()?,
            material: reader.read_u16()?,
        });
    }

    Ok(CollisionTree::from_parts(nodes, triangles))
}

fn read_metadata<R: Read + Seek>(reader: &mut StreamReader<R>) -> Result<Vec<SurfaceInfo>> {
    let header = expect_chunk(reader, METADATA_CHUNK)?;

    let mut tag = [0u8; 4];
    reader.read_bytes(&mut tag)?;
    if tag != JSP_TAG {
        return Err(Error::BadMagic {
            chunk: METADATA_CHUNK,
            found: u32::from_le_bytes(tag),
        });
    }
    let version = reader.read_u32()?;
    if version != JSP_VERSION {
        tracing::warn!(version, expected = JSP_VERSION, "unexpected jsp version");
    }
    let count = reader.read_u32()?;
    check_len(
        &header,
        u64::from(METADATA_HEADER_SIZE) + u64::from(SURFACE_INFO_SIZE) * u64::from(count),
    )?;
    reader.skip(12)?;

    let mut infos = Vec::with_capacity(count as usize);
    for _ in 0..count {
        infos.push(SurfaceInfo {
            original_material: reader.read_i32()?,
            flags: SurfaceInfoFlags::from_bits_retain(reader.read_i32()? as u32),
        });
    }
    Ok(infos)
}

fn read_strip_vectors<R: Read + Seek>(reader: &mut StreamReader<R>) -> Result<Vec<Point3<f32>>> {
    let header = expect_chunk(reader, STRIP_VECTORS_CHUNK)?;
    let count = reader.read_u32()?;
    check_len(&header, 4 + u64::from(STRIP_VECTOR_SIZE) * u64::from(count))?;

    let mut vectors = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let x = reader.read_f32()?;
        let y = reader.read_f32()?;
        let z = reader.read_f32()?;
        vectors.push(Point3::new(x, y, z));
    }
    Ok(vectors)
}
