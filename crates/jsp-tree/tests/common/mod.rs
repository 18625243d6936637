#![allow(dead_code)]

use jsp_tree::bsp::{BranchVisit, LeafRun, TreeVisitor};
use jsp_tree::scene::{
    Geometry, GeometryFormat, MESH_TRISTRIP, MeshHeader, MeshRun, Scene, Surface, SurfaceFlags,
};
use jsp_tree::{Axis, BuildConfig, CollTriangle, Jsp, WorkingTriangle};
use nalgebra::Point3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn make_geometry(vertices: Vec<Point3<f32>>, runs: Vec<(i32, Vec<u16>)>) -> Geometry {
    Geometry {
        format: GeometryFormat::TRISTRIP | GeometryFormat::POSITIONS,
        vertices,
        mesh: MeshHeader {
            flags: MESH_TRISTRIP,
            runs: runs
                .into_iter()
                .map(|(material, indices)| MeshRun { material, indices })
                .collect(),
        },
    }
}

/// One geometry instanced by one rendered surface.
pub fn single_surface_scene(geometry: Geometry) -> Scene {
    Scene {
        frames: Vec::new(),
        geometries: vec![geometry],
        surfaces: vec![Surface {
            flags: SurfaceFlags::RENDER | SurfaceFlags::COLLISION_TEST,
            geometry: 0,
            frame: None,
        }],
    }
}

/// `count` independent unit-sized triangles centered uniformly in
/// `[0, size)^3`, each as its own three-index strip.
pub fn random_scene(seed: u64, count: usize, size: f32) -> Scene {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut vertices = Vec::with_capacity(count * 3);
    let mut runs = Vec::with_capacity(count);
    for i in 0..count {
        let center = Point3::new(
            rng.gen_range(0.0..size),
            rng.gen_range(0.0..size),
            rng.gen_range(0.0..size),
        );
        for _ in 0..3 {
            vertices.push(Point3::new(
                center.x + rng.gen_range(-0.5..0.5),
                center.y + rng.gen_range(-0.5..0.5),
                center.z + rng.gen_range(-0.5..0.5),
            ));
        }
        let base = (i * 3) as u16;
        runs.push(((i % 4) as i32, vec![base, base + 1, base + 2]));
    }
    single_surface_scene(make_geometry(vertices, runs))
}

/// Resolves a stored triangle back to its three corner positions.
///
/// `vertex` indexes the concatenated strip indices of the surface's geometry.
pub fn corners(scene: &Scene, tri: &CollTriangle) -> [Point3<f32>; 3] {
    let geometry = &scene.geometries[scene.surfaces[usize::from(tri.surface)].geometry];
    let strip: Vec<u16> = geometry
        .mesh
        .runs
        .iter()
        .flat_map(|run| run.indices.iter().copied())
        .collect();
    let v = usize::from(tri.vertex);
    [0, 1, 2].map(|k| geometry.vertices[usize::from(strip[v + k])])
}

/// `(min, max, midpoint)` of a stored triangle along `axis`.
pub fn extent(scene: &Scene, tri: &CollTriangle, axis: Axis) -> (f32, f32, f32) {
    let working = WorkingTriangle::new(*tri, 0, &corners(scene, tri));
    let a = axis.index();
    (working.min[a], working.max[a], working.center(axis))
}

/// Collects every violation of the structural invariants of a built tree.
pub struct InvariantChecker<'a> {
    pub scene: &'a Scene,
    pub triangles: &'a [CollTriangle],
    pub config: BuildConfig,
    pub covered: Vec<usize>,
    pub max_depth: u32,
    pub errors: Vec<String>,
}

impl<'a> InvariantChecker<'a> {
    pub fn new(scene: &'a Scene, jsp: &'a Jsp, config: BuildConfig) -> Self {
        Self {
            scene,
            triangles: jsp.tree.triangles(),
            config,
            covered: vec![0; jsp.tree.triangles().len()],
            max_depth: 0,
            errors: Vec::new(),
        }
    }
}

impl TreeVisitor for InvariantChecker<'_> {
    fn visit_branch(&mut self, branch: BranchVisit<'_>) {
        self.max_depth = self.max_depth.max(branch.depth);
        let node = branch.node;
        let Some(axis) = node.axis() else {
            self.errors.push(format!("branch {} has no axis", branch.index));
            return;
        };
        if node.right.axis() != Some(axis) {
            self.errors.push(format!("branch {} refs disagree on axis", branch.index));
        }

        let mut left_center_max = f32::NEG_INFINITY;
        for i in branch.left.clone() {
            let (_, max, center) = extent(self.scene, &self.triangles[i], axis);
            if max > node.left_value {
                let b = branch.index;
                self.errors.push(format!("branch {b}: left triangle {i} reaches past left_value"));
            }
            left_center_max = left_center_max.max(center);
        }

        let mut right_center_min = f32::INFINITY;
        for i in branch.right.clone() {
            let (min, _, center) = extent(self.scene, &self.triangles[i], axis);
            if min < node.right_value {
                let b = branch.index;
                self.errors
                    .push(format!("branch {b}: right triangle {i} reaches below right_value"));
            }
            right_center_min = right_center_min.min(center);
        }

        // Some split value separates the two sides' midpoints.
        if left_center_max >= right_center_min {
            self.errors.push(format!("branch {}: sides are not separated", branch.index));
        }
    }

    fn visit_leaf(&mut self, run: LeafRun<'_>) {
        for i in run.start..run.start + run.len() {
            self.covered[i] += 1;
        }
        if !run.is_chained() {
            self.errors.push(format!("leaf at {} has a broken chain", run.start));
        }
        if run.len() > self.config.max_leaf_triangles && run.depth + 1 < self.config.max_depth {
            let (start, len, depth) = (run.start, run.len(), run.depth);
            self.errors.push(format!("leaf at {start} holds {len} triangles at depth {depth}"));
        }
    }
}

/// Walks the tree and panics with every violated invariant.
pub fn assert_invariants(scene: &Scene, jsp: &Jsp, config: BuildConfig) {
    let mut checker = InvariantChecker::new(scene, jsp, config);
    jsp.tree.walk(&mut checker).unwrap();

    if let Some(i) = checker.covered.iter().position(|&c| c != 1) {
        checker.errors.push(format!("triangle {i} is covered by {} leaves", checker.covered[i]));
    }
    assert!(checker.errors.is_empty(), "invariants violated:\n{}", checker.errors.join("\n"));
}

/// `(surface, vertex)` keys, sorted.
pub fn identity_keys<'a>(triangles: impl IntoIterator<Item = &'a CollTriangle>) -> Vec<(u16, u16)> {
    let mut keys: Vec<_> = triangles.into_iter().map(|t| (t.surface, t.vertex)).collect();
    keys.sort_unstable();
    keys
}
