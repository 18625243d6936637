//! Clump container: frame list, geometry list and atomics.
//!
//! Atomics become [`Surface`]s in file order. Frames are decoded and their
//! parent links checked, but geometry is kept in model space.

use std::io::{Read, Seek};

use nalgebra::{Matrix3, Point3, Vector3};

use super::{
    ID_ATOMIC, ID_FRAMELIST, ID_GEOMETRY, ID_GEOMETRYLIST, ID_STRUCT, payload_end, read_count,
    read_geometry, require_chunk,
};
use crate::scene::{Frame, Geometry, Scene, Surface, SurfaceFlags};
use crate::stream::StreamReader;
use crate::{Error, Result};

/// Decodes the children of a clump chunk whose payload ends at `end`.
///
/// Reads, in order: the clump struct, the frame list, the geometry list and
/// one atomic per declared atomic. Each container is left through its
/// declared length, so unknown trailing children are ignored.
pub fn read_clump_body<R: Read + Seek>(reader: &mut StreamReader<R>, end: u64) -> Result<Scene> {
    let header = require_chunk(reader, ID_STRUCT, Some(end))?;
    let struct_end = payload_end(reader, &header)?;
    let num_atomics = read_count(reader, "atomic count")?;
    // Light and camera counts are not needed.
    reader.seek_to(struct_end)?;

    let frames = read_frame_list(reader, end)?;
    let geometries = read_geometry_list(reader, end)?;

    let mut surfaces = Vec::new();
    for _ in 0..num_atomics {
        surfaces.push(read_atomic(reader, end, frames.len(), geometries.len())?);
    }

    Ok(Scene {
        frames,
        geometries,
        surfaces,
    })
}

fn read_vector<R: Read + Seek>(reader: &mut StreamReader<R>) -> Result<Vector3<f32>> {
    let x = reader.read_f32()?;
    let y = reader.read_f32()?;
    let z = reader.read_f32()?;
    Ok(Vector3::new(x, y, z))
}

fn read_frame_list<R: Read + Seek>(reader: &mut StreamReader<R>, end: u64) -> Result<Vec<Frame>> {
    let list = require_chunk(reader, ID_FRAMELIST, Some(end))?;
    let list_end = payload_end(reader, &list)?;
    require_chunk(reader, ID_STRUCT, Some(list_end))?;

    let num_frames = read_count(reader, "frame count")?;
    let mut frames = Vec::new();
    for _ in 0..num_frames {
        let right = read_vector(reader)?;
        let up = read_vector(reader)?;
        let at = read_vector(reader)?;
        let position = read_vector(reader)?;
        let parent = reader.read_i32()?;
        let _data = reader.read_u32()?;

        let parent = match parent {
            p if p < 0 => None,
            p if (p as usize) < num_frames => Some(p as usize),
            p => {
                return Err(Error::IndexOutOfRange {
                    what: "parent frame",
                    index: i64::from(p),
                    len: num_frames,
                });
            }
        };

        frames.push(Frame {
            rotation: Matrix3::from_columns(&[right, up, at]),
            position: Point3::from(position),
            parent,
        });
    }

    reader.seek_to(list_end)?;
    Ok(frames)
}

fn read_geometry_list<R: Read + Seek>(
    reader: &mut StreamReader<R>,
    end: u64,
) -> Result<Vec<Geometry>> {
    let list = require_chunk(reader, ID_GEOMETRYLIST, Some(end))?;
    let list_end = payload_end(reader, &list)?;
    require_chunk(reader, ID_STRUCT, Some(list_end))?;

    let num_geometries = read_count(reader, "geometry count")?;
    let mut geometries = Vec::new();
    for index in 0..num_geometries {
        let header = require_chunk(reader, ID_GEOMETRY, Some(list_end))?;
        let geometry_end = payload_end(reader, &header)?;
        geometries.push(read_geometry(reader, index, geometry_end)?);
        reader.seek_to(geometry_end)?;
    }

    reader.seek_to(list_end)?;
    Ok(geometries)
}

fn read_atomic<R: Read + Seek>(
    reader: &mut StreamReader<R>,
    end: u64,
    num_frames: usize,
    num_geometries: usize,
) -> Result<Surface> {
    let atomic = require_chunk(reader, ID_ATOMIC, Some(end))?;
    let atomic_end = payload_end(reader, &atomic)?;
    require_chunk(reader, ID_STRUCT, Some(atomic_end))?;

    let frame = reader.read_i32()?;
    let geometry = reader.read_i32()?;
    let flags = SurfaceFlags::from_bits_retain(reader.read_u32()?);

    let frame = check_index("frame", frame, num_frames)?;
    let geometry = check_index("geometry", geometry, num_geometries)?;

    reader.seek_to(atomic_end)?;
    Ok(Surface {
        flags,
        geometry,
        frame: Some(frame),
    })
}

fn check_index(what: &'static str, index: i32, len: usize) -> Result<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < len)
        .ok_or(Error::IndexOutOfRange {
            what,
            index: i64::from(index),
            len,
        })
}
