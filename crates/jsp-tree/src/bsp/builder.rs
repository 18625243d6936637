//! Recursive in-place partitioning of the working triangle array.

use crate::config::BuildConfig;
use crate::triangle::{TriangleFlags, WorkingTriangle};
use crate::{Axis, BoundingBox, Error, Result};

use super::node::{BranchNode, NodeRef};
use super::selector::{LongestAxisMidpoint, SplitPlane, SplitSelector};
use super::tree::CollisionTree;

/// Figures gathered while building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildStats {
    /// Deepest recursion level reached (the root is at depth 0).
    pub max_depth_reached: u32,
    /// Leaf runs that were cut off by the depth cap while still above the leaf threshold.
    pub forced_leaves: usize,
}

/// Builds a [`CollisionTree`] from a working triangle array.
///
/// # Example
///
/// ```ignore
/// let builder = TreeBuilder::new(BuildConfig::default());
/// let (tree, stats) = builder.build(&mut triangles, &bounds)?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct TreeBuilder<S = LongestAxisMidpoint> {
    config: BuildConfig,
    selector: S,
}

impl TreeBuilder<LongestAxisMidpoint> {
    /// Creates a builder that splits the longest side of each box at its midpoint.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            selector: LongestAxisMidpoint,
        }
    }
}

impl<S: SplitSelector> TreeBuilder<S> {
    /// Creates a builder with a custom split strategy.
    pub fn with_selector(config: BuildConfig, selector: S) -> Self {
        Self { config, selector }
    }

    /// Partitions `triangles` in place and returns the finished tree.
    ///
    /// `bounds` is the box the root split is chosen from. On return the array
    /// is grouped into contiguous leaf runs and each run's last triangle has
    /// `HAS_NEXT` cleared. The tree holds a copy of the reordered records.
    #[tracing::instrument(skip_all, fields(triangles = triangles.len()))]
    pub fn build(
        &self,
        triangles: &mut [WorkingTriangle],
        bounds: &BoundingBox,
    ) -> Result<(CollisionTree, BuildStats)> {
        self.config.validate()?;
        if triangles.len() < 2 {
            return Err(Error::NotEnoughTriangles {
                found: triangles.len(),
            });
        }

        let mut partitioner = Partitioner {
            triangles,
            nodes: Vec::new(),
            config: &self.config,
            selector: &self.selector,
            depth: 0,
            stats: BuildStats::default(),
        };
        let hi = partitioner.triangles.len() - 1;
        partitioner.recurse(0, hi, bounds)?;

        let Partitioner {
            triangles,
            nodes,
            stats,
            ..
        } = partitioner;
        let tree = CollisionTree::from_parts(nodes, triangles.iter().map(|t| t.tri).collect());

        tracing::info!(
            branch_nodes = tree.branch_nodes().len(),
            triangles = tree.triangles().len(),
            max_depth = stats.max_depth_reached,
            "built collision tree"
        );
        Ok((tree, stats))
    }

    /// Like [`TreeBuilder::build`], with the root box fitted to the triangles themselves.
    pub fn build_fitted(
        &self,
        triangles: &mut [WorkingTriangle],
    ) -> Result<(CollisionTree, BuildStats)> {
        let mut bounds = BoundingBox::EMPTY;
        for t in triangles.iter() {
            bounds.add_point(&t.min);
            bounds.add_point(&t.max);
        }
        self.build(triangles, &bounds)
    }
}

struct Partitioner<'a, S> {
    triangles: &'a mut [WorkingTriangle],
    nodes: Vec<BranchNode>,
    config: &'a BuildConfig,
    selector: &'a S,
    depth: u32,
    stats: BuildStats,
}

impl<S: SplitSelector> Partitioner<'_, S> {
    /// Splits the inclusive range `[lo, hi]`, appends its branch node and
    /// recurses into sides that are still too large.
    fn recurse(&mut self, lo: usize, hi: usize, bounds: &BoundingBox) -> Result<()> {
        if lo >= hi || hi >= self.triangles.len() {
            return Err(Error::InvalidRange { lo, hi });
        }

        self.stats.max_depth_reached = self.stats.max_depth_reached.max(self.depth);

        let SplitPlane { axis, value } = self.selector.select(bounds, &self.triangles[lo..=hi]);
        tracing::debug!(
            depth = self.depth,
            min = ?bounds.min,
            max = ?bounds.max,
            ?axis,
            split = value,
            "splitting"
        );

        let num_left = partition(&mut self.triangles[lo..=hi], axis, value);
        let num_right = hi + 1 - lo - num_left;
        let mid = lo + num_left;

        let (left_value, right_value) = overlap_planes(&self.triangles[lo..=hi], num_left, axis);
        tracing::debug!(num_left, num_right, left_value, right_value, "partitioned");

        let at_depth_cap = self.depth + 1 >= self.config.max_depth;
        let done_left = num_left <= self.config.max_leaf_triangles || at_depth_cap;
        let done_right = num_right <= self.config.max_leaf_triangles || at_depth_cap;

        let node_index = self.nodes.len();
        self.nodes.push(BranchNode {
            left_value,
            right_value,
            ..BranchNode::default()
        });

        let left = if done_left {
            self.note_leaf(num_left);
            NodeRef::triangles(axis, lo)?
        } else {
            let child = NodeRef::branch(axis, self.nodes.len())?;
            self.descend(lo, mid - 1, &bounds.with_max(axis, left_value))?;
            child
        };

        let right = if done_right {
            self.note_leaf(num_right);
            NodeRef::triangles(axis, mid)?
        } else {
            let child = NodeRef::branch(axis, self.nodes.len())?;
            self.descend(mid, hi, &bounds.with_min(axis, right_value))?;
            child
        };

        let node = &mut self.nodes[node_index];
        node.left = left;
        node.right = right;

        // Terminate both chains.
        if num_left > 0 {
            self.triangles[mid - 1].tri.flags.remove(TriangleFlags::HAS_NEXT);
        }
        if num_right > 0 {
            self.triangles[hi].tri.flags.remove(TriangleFlags::HAS_NEXT);
        }

        Ok(())
    }

    fn descend(&mut self, lo: usize, hi: usize, bounds: &BoundingBox) -> Result<()> {
        self.depth += 1;
        let result = self.recurse(lo, hi, bounds);
        self.depth -= 1;
        result
    }

    fn note_leaf(&mut self, count: usize) {
        if count > self.config.max_leaf_triangles {
            self.stats.forced_leaves += 1;
            tracing::warn!(depth = self.depth, count, "depth cap reached, emitting oversized leaf");
        }
    }
}

/// Hoare partition of `triangles` around `split` along `axis`.
///
/// Triangles whose extent midpoint is below `split` end up in front, the
/// rest behind. Elements are swapped in place. Returns the size of the front
/// (left) region, which may be zero or the whole slice.
pub fn partition(triangles: &mut [WorkingTriangle], axis: Axis, split: f32) -> usize {
    let len = triangles.len() as isize;
    let mut i: isize = -1;
    let mut j: isize = len;

    loop {
        loop {
            i += 1;
            if i >= len || triangles[i as usize].center(axis) >= split {
                break;
            }
        }
        loop {
            j -= 1;
            if j < 0 || triangles[j as usize].center(axis) < split {
                break;
            }
        }

        if i >= j {
            return (j + 1) as usize;
        }
        triangles.swap(i as usize, j as usize);
    }
}

/// Largest maximum of the left region and smallest minimum of the right
/// region along `axis`. An empty region yields `-inf` / `+inf`.
fn overlap_planes(range: &[WorkingTriangle], num_left: usize, axis: Axis) -> (f32, f32) {
    let (left, right) = range.split_at(num_left);
    let a = axis.index();

    let mut left_value = f32::NEG_INFINITY;
    for t in left {
        if t.max[a] > left_value {
            left_value = t.max[a];
        }
    }

    let mut right_value = f32::INFINITY;
    for t in right {
        if t.min[a] < right_value {
            right_value = t.min[a];
        }
    }

    (left_value, right_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangle::CollTriangle;
    use nalgebra::Point3;

    fn make_triangle(id: u16, a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> WorkingTriangle {
        let record = CollTriangle {
            surface: 0,
            vertex: id,
            flags: TriangleFlags::HAS_NEXT | TriangleFlags::IS_SOLID,
            platform_data: 0,
            material: 0,
        };
        let corners = [
            Point3::new(a[0], a[1], a[2]),
            Point3::new(b[0], b[1], b[2]),
            Point3::new(c[0], c[1], c[2]),
        ];
        WorkingTriangle::new(record, 0, &corners)
    }

    /// A small triangle centered at `x` on the X axis.
    fn tri_at(id: u16, x: f32) -> WorkingTriangle {
        make_triangle(id, [x - 0.1, 0.0, 0.0], [x + 0.1, 0.0, 0.0], [x, 0.1, 0.0])
    }

    #[test]
    fn partition_splits_by_center() {
        let mut tris: Vec<_> = [3.0, 0.5, 2.0, 1.0, 0.0]
            .iter()
            .enumerate()
            .map(|(i, &x)| tri_at(i as u16, x))
            .collect();
        let left = partition(&mut tris, Axis::X, 1.5);

        assert_eq!(left, 3);
        assert!(tris[..left].iter().all(|t| t.center(Axis::X) < 1.5));
        assert!(tris[left..].iter().all(|t| t.center(Axis::X) >= 1.5));
    }

    #[test]
    fn partition_handles_one_sided_input() {
        let mut tris: Vec<_> = (0..4).map(|i| tri_at(i, f32::from(i))).collect();
        assert_eq!(partition(&mut tris, Axis::X, 10.0), 4);
        assert_eq!(partition(&mut tris, Axis::X, -10.0), 0);
        // Center exactly on the split goes right.
        assert_eq!(partition(&mut tris, Axis::X, 0.0), 0);
    }

    #[test]
    fn quad_builds_one_branch() {
        // Strip quad (0,0) (0,1) (1,0) (2,1): two wide along X, one deep along Y.
        let mut tris = vec![
            make_triangle(0, [0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
            make_triangle(1, [0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [2.0, 1.0, 0.0]),
        ];
        let bounds = BoundingBox::new(Point3::origin(), Point3::new(2.0, 1.0, 0.0));
        let builder = TreeBuilder::new(BuildConfig::default());
        let (tree, stats) = builder.build(&mut tris, &bounds).unwrap();

        assert_eq!(tree.branch_nodes().len(), 1);
        assert_eq!(stats.max_depth_reached, 0);
        let root = tree.branch_nodes()[0];
        assert_eq!(root.axis(), Some(Axis::X));
        assert_eq!(root.left, NodeRef::triangles(Axis::X, 0).unwrap());
        assert_eq!(root.right, NodeRef::triangles(Axis::X, 1).unwrap());
        assert_eq!(root.left_value, 1.0);
        assert_eq!(root.right_value, 0.0);
        assert_eq!(tree.triangles()[0].vertex, 0);
        assert!(tree.triangles().iter().all(|t| !t.has_next()));
    }

    #[test]
    fn recursive_step_rejects_short_ranges() {
        let mut tris = vec![tri_at(0, 0.0), tri_at(1, 1.0)];
        let config = BuildConfig::default();
        let mut partitioner = Partitioner {
            triangles: &mut tris,
            nodes: Vec::new(),
            config: &config,
            selector: &LongestAxisMidpoint,
            depth: 0,
            stats: BuildStats::default(),
        };
        let bounds = BoundingBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));

        assert!(matches!(
            partitioner.recurse(1, 1, &bounds),
            Err(Error::InvalidRange { lo: 1, hi: 1 })
        ));
        assert!(partitioner.recurse(1, 0, &bounds).is_err());
        assert!(partitioner.nodes.is_empty());
    }

    #[test]
    fn too_few_triangles() {
        let builder = TreeBuilder::new(BuildConfig::default());
        let mut one = vec![tri_at(0, 0.0)];
        assert!(matches!(
            builder.build_fitted(&mut one),
            Err(Error::NotEnoughTriangles { found: 1 })
        ));
    }

    #[test]
    fn non_finite_extents_do_not_panic() {
        let mut tris: Vec<_> = (0..12).map(|i| tri_at(i, f32::from(i))).collect();
        tris[5] = make_triangle(5, [f32::NAN, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);

        let builder = TreeBuilder::new(BuildConfig::default());
        let (tree, _) = builder.build_fitted(&mut tris).unwrap();
        assert_eq!(tree.triangles().len(), 12);
    }

    /// Always cuts the XY plane at z = 0.5.
    struct FloorSplit;

    impl SplitSelector for FloorSplit {
        fn select(&self, _bounds: &BoundingBox, _triangles: &[WorkingTriangle]) -> SplitPlane {
            SplitPlane {
                axis: Axis::Z,
                value: 0.5,
            }
        }
    }

    #[test]
    fn custom_selector_drives_the_split() {
        // Long along X, so the default selector would cut X.
        let mut tris: Vec<_> = (0..4u16)
            .map(|i| {
                let (x, z) = (f32::from(i) * 10.0, f32::from(i % 2));
                make_triangle(i, [x, 0.0, z], [x + 1.0, 0.0, z], [x, 1.0, z])
            })
            .collect();
        let builder = TreeBuilder::with_selector(BuildConfig::default(), FloorSplit);
        let (tree, _) = builder.build_fitted(&mut tris).unwrap();

        let root = tree.branch_nodes()[0];
        assert_eq!(tree.branch_nodes().len(), 1);
        assert_eq!(root.axis(), Some(Axis::Z));
        assert_eq!(root.right.index(), 2);
        assert_eq!((root.left_value, root.right_value), (0.0, 1.0));
        assert!(tree.triangles()[..2].iter().all(|t| t.vertex % 2 == 0));
    }

    #[test]
    fn depth_cap_forces_leaves() {
        let mut tris: Vec<_> = (0..40).map(|i| tri_at(i, f32::from(i))).collect();
        let builder = TreeBuilder::new(BuildConfig {
            max_leaf_triangles: 1,
            max_depth: 2,
        });
        let (tree, stats) = builder.build_fitted(&mut tris).unwrap();

        assert!(stats.max_depth_reached <= 1);
        assert!(stats.forced_leaves > 0);
        assert!(tree.branch_nodes().len() <= 3);
    }
}
