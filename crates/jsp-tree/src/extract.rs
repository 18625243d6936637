//! Turns a decoded scene into the builder's working set.

use nalgebra::Point3;

use crate::jsp::SurfaceInfo;
use crate::scene::Scene;
use crate::triangle::{CollTriangle, TriangleFlags, WorkingTriangle};
use crate::{Error, Result};

/// Everything extracted from a scene, in reverse surface order.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub surface_infos: Vec<SurfaceInfo>,
    /// Every strip index resolved to its position, surface by surface.
    pub strip_vectors: Vec<Point3<f32>>,
    pub triangles: Vec<WorkingTriangle>,
}

/// Returns `true` if two of the three indices coincide (zero area).
#[inline]
fn is_degenerate(window: &[u16]) -> bool {
    window[0] == window[1] || window[0] == window[2] || window[1] == window[2]
}

/// Extracts surface metadata, the strip vector cache and the triangle working set.
///
/// Surfaces are walked last to first. Each strip is read as a sliding window of
/// three indices; degenerate windows are dropped, odd windows are flagged as
/// reversed. Every triangle starts solid and chained (`HAS_NEXT`); the
/// partitioner clears the chain bit where a leaf run ends.
#[tracing::instrument(skip_all, fields(surfaces = scene.surfaces.len()))]
pub fn extract(scene: &Scene) -> Result<Extraction> {
    scene.validate()?;

    let surface_infos = scene
        .surfaces
        .iter()
        .rev()
        .map(|_| SurfaceInfo::default())
        .collect();

    let total_indices = scene
        .surfaces
        .iter()
        .map(|s| scene.geometry_of(s).mesh.total_indices())
        .sum();
    let mut strip_vectors = Vec::with_capacity(total_indices);
    for surface in scene.surfaces.iter().rev() {
        let geometry = scene.geometry_of(surface);
        for run in &geometry.mesh.runs {
            strip_vectors.extend(run.indices.iter().map(|&i| geometry.vertices[usize::from(i)]));
        }
    }

    let mut triangles = Vec::new();
    let mut degenerate = 0usize;
    let mut strip_offset = 0usize;

    for (surface_index, surface) in scene.surfaces.iter().enumerate().rev() {
        let geometry = scene.geometry_of(surface);
        let mut base_flags = TriangleFlags::HAS_NEXT | TriangleFlags::IS_SOLID;
        base_flags.set(TriangleFlags::IS_VISIBLE, surface.is_visible());

        let mut mesh_vert_offset = 0usize;
        for run in &geometry.mesh.runs {
            let material = u16::try_from(run.material).map_err(|_| Error::FieldOverflow {
                what: "material index",
                value: i64::from(run.material),
                bits: 16,
            })?;

            for (window_index, window) in run.indices.windows(3).enumerate() {
                if is_degenerate(window) {
                    degenerate += 1;
                    continue;
                }

                let vertex = mesh_vert_offset + window_index;
                let vertex = u16::try_from(vertex).map_err(|_| Error::FieldOverflow {
                    what: "strip vertex index",
                    value: vertex as i64,
                    bits: 16,
                })?;

                let mut flags = base_flags;
                flags.set(TriangleFlags::IS_REVERSE, window_index % 2 == 1);

                let first = strip_offset + window_index;
                let corners = [
                    strip_vectors[first],
                    strip_vectors[first + 1],
                    strip_vectors[first + 2],
                ];
                let record = CollTriangle {
                    surface: surface_index as u16,
                    vertex,
                    flags,
                    platform_data: 0,
                    material,
                };
                triangles.push(WorkingTriangle::new(record, first, &corners));
            }

            strip_offset += run.indices.len();
            mesh_vert_offset += run.indices.len();
        }
    }

    tracing::debug!(
        triangles = triangles.len(),
        degenerate,
        strip_vectors = strip_vectors.len(),
        "extracted working set"
    );

    Ok(Extraction {
        surface_infos,
        strip_vectors,
        triangles,
    })
}
