//! Geometry chunk decoding: morph target 0 positions and the bin-mesh strips.

use std::io::{Read, Seek};

use nalgebra::Point3;

use super::{
    ID_BINMESH, ID_EXTENSION, ID_STRUCT, payload_end, read_count, require_chunk, skip_bytes,
};
use crate::scene::{Geometry, GeometryFormat, MeshHeader, MeshRun};
use crate::stream::StreamReader;
use crate::{Error, Result};

const PRELIT_COLOR_SIZE: u64 = 4;
const TEX_COORD_SIZE: u64 = 8;
const TRIANGLE_SIZE: u64 = 8;
const SPHERE_SIZE: u64 = 16;
const VECTOR_SIZE: u64 = 12;

/// Decodes the payload of a geometry chunk ending at `end`.
///
/// `index` is the geometry's position in the list and is only used for
/// error reporting. Native geometry is rejected outright.
pub fn read_geometry<R: Read + Seek>(
    reader: &mut StreamReader<R>,
    index: usize,
    end: u64,
) -> Result<Geometry> {
    let header = require_chunk(reader, ID_STRUCT, Some(end))?;
    let struct_end = payload_end(reader, &header)?;

    let format = GeometryFormat::from_bits_retain(reader.read_u32()?);
    let num_triangles = read_count(reader, "triangle count")? as u64;
    let num_vertices = read_count(reader, "vertex count")?;
    let num_morph_targets = read_count(reader, "morph target count")?;

    if format.contains(GeometryFormat::NATIVE) {
        return Err(Error::UnsupportedGeometry { geometry: index });
    }

    let n = num_vertices as u64;
    if n > 0 {
        if format.contains(GeometryFormat::PRELIT) {
            skip_bytes(reader, n * PRELIT_COLOR_SIZE)?;
        }
        skip_bytes(reader, format.tex_coord_sets() as u64 * n * TEX_COORD_SIZE)?;
        skip_bytes(reader, num_triangles * TRIANGLE_SIZE)?;
    }

    let mut vertices = Vec::new();
    for target in 0..num_morph_targets {
        skip_bytes(reader, SPHERE_SIZE)?;
        let points_present = reader.read_u32()? != 0;
        let normals_present = reader.read_u32()? != 0;

        if points_present {
            if target == 0 {
                for _ in 0..num_vertices {
                    let x = reader.read_f32()?;
                    let y = reader.read_f32()?;
                    let z = reader.read_f32()?;
                    vertices.push(Point3::new(x, y, z));
                }
            } else {
                skip_bytes(reader, n * VECTOR_SIZE)?;
            }
        }
        if normals_present {
            skip_bytes(reader, n * VECTOR_SIZE)?;
        }
    }
    reader.seek_to(struct_end)?;

    let mut mesh = MeshHeader::default();
    if let Some(ext) = reader.find_chunk_within(ID_EXTENSION, end)? {
        let ext_end = payload_end(reader, &ext)?;
        if reader.find_chunk_within(ID_BINMESH, ext_end)?.is_some() {
            mesh = read_bin_mesh(reader)?;
        } else {
            tracing::warn!(geometry = index, "geometry has no bin-mesh plugin");
        }
    }

    tracing::trace!(
        geometry = index,
        vertices = vertices.len(),
        runs = mesh.runs.len(),
        "decoded geometry"
    );
    Ok(Geometry {
        format,
        vertices,
        mesh,
    })
}

fn read_bin_mesh<R: Read + Seek>(reader: &mut StreamReader<R>) -> Result<MeshHeader> {
    let flags = reader.read_u32()?;
    let num_meshes = reader.read_u32()?;
    let _total_indices = reader.read_u32()?;

    let mut runs = Vec::new();
    for _ in 0..num_meshes {
        let num_indices = reader.read_u32()?;
        let material = reader.read_i32()?;

        let mut indices = Vec::new();
        for _ in 0..num_indices {
            let raw = reader.read_u32()?;
            let index = u16::try_from(raw).map_err(|_| Error::FieldOverflow {
                what: "strip index",
                value: i64::from(raw),
                bits: 16,
            })?;
            indices.push(index);
        }
        runs.push(MeshRun { material, indices });
    }

    Ok(MeshHeader { flags, runs })
}
