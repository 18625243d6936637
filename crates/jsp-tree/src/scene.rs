//! Decoded input scene consumed by the extractor.
//!
//! A scene is a list of geometries (shared meshes) and an ordered list of
//! surfaces, each referencing one geometry. The `rw` module produces it from
//! a clump file, but it can just as well be assembled by hand.

use bitflags::bitflags;
use nalgebra::{Matrix3, Point3};

use crate::{Error, Result};

bitflags! {
    /// Surface (atomic) flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SurfaceFlags: u32 {
        const COLLISION_TEST = 0x01;
        const RENDER         = 0x04;
    }
}

bitflags! {
    /// Geometry format flags. Bits 16-23 hold the texture coordinate set count.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GeometryFormat: u32 {
        const TRISTRIP   = 0x0000_0001;
        const POSITIONS  = 0x0000_0002;
        const TEXTURED   = 0x0000_0004;
        const PRELIT     = 0x0000_0008;
        const NORMALS    = 0x0000_0010;
        const LIGHT      = 0x0000_0020;
        const MODULATE_MATERIAL_COLOR = 0x0000_0040;
        const TEXTURED2  = 0x0000_0080;
        const NATIVE     = 0x0100_0000;
        const NATIVE_INSTANCE = 0x0200_0000;

        const _ = !0;
    }
}

impl GeometryFormat {
    /// Number of texture coordinate sets stored per vertex.
    pub fn tex_coord_sets(self) -> usize {
        let explicit = (self.bits() >> 16) & 0xFF;
        if explicit != 0 {
            explicit as usize
        } else if self.contains(GeometryFormat::TEXTURED2) {
            2
        } else if self.contains(GeometryFormat::TEXTURED) {
            1
        } else {
            0
        }
    }
}

/// Bin-mesh header flag for strip topology. Any other value is a triangle list.
pub const MESH_TRISTRIP: u32 = 0x1;

/// A placement frame. Decoded for completeness; collision geometry is built in model space.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub rotation: Matrix3<f32>,
    pub position: Point3<f32>,
    pub parent: Option<usize>,
}

/// One material-indexed strip of vertex indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshRun {
    pub material: i32,
    pub indices: Vec<u16>,
}

/// Per-geometry mesh data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MeshHeader {
    pub flags: u32,
    pub runs: Vec<MeshRun>,
}

impl MeshHeader {
    /// Returns `true` if the runs are strips rather than triangle lists.
    pub fn is_tristrip(&self) -> bool {
        self.flags & MESH_TRISTRIP != 0
    }

    /// Number of strip indices across all runs.
    pub fn total_indices(&self) -> usize {
        self.runs.iter().map(|run| run.indices.len()).sum()
    }
}

/// A shared mesh: format, vertex positions (first morph target) and its strips.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub format: GeometryFormat,
    pub vertices: Vec<Point3<f32>>,
    pub mesh: MeshHeader,
}

/// A renderable instance of a geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pub flags: SurfaceFlags,
    pub geometry: usize,
    pub frame: Option<usize>,
}

impl Surface {
    /// Returns `true` if the surface is rendered.
    pub fn is_visible(&self) -> bool {
        self.flags.contains(SurfaceFlags::RENDER)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub frames: Vec<Frame>,
    pub geometries: Vec<Geometry>,
    pub surfaces: Vec<Surface>,
}

impl Scene {
    /// Geometry referenced by `surface`.
    ///
    /// Only valid after [`Scene::validate`] has accepted the scene.
    pub fn geometry_of(&self, surface: &Surface) -> &Geometry {
        &self.geometries[surface.geometry]
    }

    /// Checks everything the extractor relies on.
    ///
    /// Rejects native geometry, non-strip meshes, dangling geometry references,
    /// non-finite vertex positions and strip indices that point past the
    /// vertex array.
    pub fn validate(&self) -> Result<()> {
        for (index, surface) in self.surfaces.iter().enumerate() {
            if surface.geometry >= self.geometries.len() {
                return Err(Error::IndexOutOfRange {
                    what: "geometry",
                    index: surface.geometry as i64,
                    len: self.geometries.len(),
                });
            }
            if u16::try_from(index).is_err() {
                return Err(Error::FieldOverflow {
                    what: "surface index",
                    value: index as i64,
                    bits: 16,
                });
            }
        }

        for (index, geometry) in self.geometries.iter().enumerate() {
            if geometry.format.contains(GeometryFormat::NATIVE) {
                return Err(Error::UnsupportedGeometry { geometry: index });
            }
            if !geometry.mesh.is_tristrip() {
                return Err(Error::UnsupportedMeshTopology { geometry: index });
            }
            // Every vertex feeds the root box, used by a strip or not.
            let finite = |v: &Point3<f32>| v.iter().all(|c| c.is_finite());
            if let Some(vertex) = geometry.vertices.iter().position(|v| !finite(v)) {
                return Err(Error::InvalidVertex {
                    geometry: index,
                    index: vertex,
                });
            }
            for run in &geometry.mesh.runs {
                if let Some(&bad) = run
                    .indices
                    .iter()
                    .find(|&&i| usize::from(i) >= geometry.vertices.len())
                {
                    return Err(Error::IndexOutOfRange {
                        what: "vertex",
                        index: i64::from(bad),
                        len: geometry.vertices.len(),
                    });
                }
                if u16::try_from(run.material).is_err() {
                    return Err(Error::FieldOverflow {
                        what: "material index",
                        value: i64::from(run.material),
                        bits: 16,
                    });
                }
            }
            if u16::try_from(geometry.mesh.total_indices()).is_err() {
                return Err(Error::FieldOverflow {
                    what: "strip index count",
                    value: geometry.mesh.total_indices() as i64,
                    bits: 16,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_geometry(mesh_flags: u32) -> Geometry {
        Geometry {
            format: GeometryFormat::TRISTRIP | GeometryFormat::POSITIONS,
            vertices: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            mesh: MeshHeader {
                flags: mesh_flags,
                runs: vec![MeshRun {
                    material: 0,
                    indices: vec![0, 1, 2],
                }],
            },
        }
    }

    fn make_scene(geometry: Geometry) -> Scene {
        Scene {
            frames: Vec::new(),
            geometries: vec![geometry],
            surfaces: vec![Surface {
                flags: SurfaceFlags::RENDER,
                geometry: 0,
                frame: None,
            }],
        }
    }

    #[test]
    fn accepts_strip_geometry() {
        assert!(make_scene(make_geometry(MESH_TRISTRIP)).validate().is_ok());
    }

    #[test]
    fn rejects_triangle_lists() {
        let err = make_scene(make_geometry(0)).validate().unwrap_err();
        assert!(matches!(err, Error::UnsupportedMeshTopology { geometry: 0 }));
    }

    #[test]
    fn rejects_native_geometry() {
        let mut geometry = make_geometry(MESH_TRISTRIP);
        geometry.format |= GeometryFormat::NATIVE;
        let err = make_scene(geometry).validate().unwrap_err();
        assert!(matches!(err, Error::UnsupportedGeometry { geometry: 0 }));
    }

    #[test]
    fn rejects_dangling_references() {
        let mut scene = make_scene(make_geometry(MESH_TRISTRIP));
        scene.surfaces[0].geometry = 3;
        assert!(matches!(
            scene.validate(),
            Err(Error::IndexOutOfRange { what: "geometry", .. })
        ));

        let mut geometry = make_geometry(MESH_TRISTRIP);
        geometry.mesh.runs[0].indices.push(9);
        assert!(matches!(
            make_scene(geometry).validate(),
            Err(Error::IndexOutOfRange { what: "vertex", index: 9, .. })
        ));
    }

    #[test]
    fn rejects_non_finite_positions() {
        let mut geometry = make_geometry(MESH_TRISTRIP);
        geometry.vertices[1].x = f32::NAN;
        assert!(matches!(
            make_scene(geometry).validate(),
            Err(Error::InvalidVertex { geometry: 0, index: 1 })
        ));

        // Unreferenced vertices still count.
        let mut geometry = make_geometry(MESH_TRISTRIP);
        geometry.vertices.push(Point3::new(0.0, f32::INFINITY, 0.0));
        assert!(matches!(
            make_scene(geometry).validate(),
            Err(Error::InvalidVertex { geometry: 0, index: 3 })
        ));
    }

    #[test]
    fn tex_coord_set_count() {
        assert_eq!(GeometryFormat::empty().tex_coord_sets(), 0);
        assert_eq!(GeometryFormat::TEXTURED.tex_coord_sets(), 1);
        assert_eq!(GeometryFormat::TEXTURED2.tex_coord_sets(), 2);
        assert_eq!(GeometryFormat::from_bits_retain(0x0003_0004).tex_coord_sets(), 3);
    }
}
