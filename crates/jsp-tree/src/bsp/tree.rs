//! Collision tree container and traversal.

use crate::triangle::CollTriangle;
use crate::{BoundingBox, Error, Result};

use super::node::{BranchNode, NodeKind, NodeRef};
use super::visitor::{BranchVisit, FnVisitor, LeafRun, TreeVisitor};

/// An axis-aligned BSP over a flat triangle array.
///
/// Branch nodes are stored in construction pre-order, so node 0 is the root
/// and every child index is greater than its parent's. Leaves are not stored
/// as nodes: a [`NodeKind::TriangleRun`] reference names the first triangle
/// of a run, and the run continues while [`CollTriangle::has_next`] holds.
///
/// # Traversal
///
/// [`CollisionTree::walk`] recovers the exact extent of every leaf run (the
/// right child's run starts where the leftmost leaf beneath it starts) and
/// reports it to a [`TreeVisitor`]:
///
/// ```ignore
/// let mut visitor = CollectingVisitor::new();
/// tree.walk(&mut visitor)?;
/// for leaf in visitor.leaves() { /* ... */ }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionTree {
    branch_nodes: Vec<BranchNode>,
    triangles: Vec<CollTriangle>,
}

impl CollisionTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembles a tree from a pre-order branch array and its triangle array.
    ///
    /// Nothing is checked here; [`CollisionTree::walk`] rejects malformed trees.
    pub fn from_parts(branch_nodes: Vec<BranchNode>, triangles: Vec<CollTriangle>) -> Self {
        Self {
            branch_nodes,
            triangles,
        }
    }

    /// Returns `true` if the tree has no root branch.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.branch_nodes.is_empty()
    }

    /// Branch nodes in construction pre-order.
    #[inline]
    pub fn branch_nodes(&self) -> &[BranchNode] {
        &self.branch_nodes
    }

    /// Triangle records, grouped into contiguous leaf runs.
    #[inline]
    pub fn triangles(&self) -> &[CollTriangle] {
        &self.triangles
    }

    /// Returns the root node, if any.
    #[inline]
    pub fn root(&self) -> Option<&BranchNode> {
        self.branch_nodes.first()
    }

    /// Depth of the deepest branch node (the root is 0). `None` for an empty tree.
    pub fn max_depth(&self) -> Result<Option<u32>> {
        // The deepest branch has only leaf children, so leaf depths suffice.
        let mut deepest = None;
        self.walk(&mut FnVisitor::new(|run: LeafRun<'_>| {
            deepest = Some(deepest.map_or(run.depth, |d: u32| d.max(run.depth)));
        }))?;
        Ok(deepest)
    }

    /// Visits every branch node and every leaf run, depth first, left before right.
    ///
    /// Fails on malformed trees (dangling or backward references, ranges that
    /// do not nest) so it is safe to call on trees read from disk.
    pub fn walk<V: TreeVisitor>(&self, visitor: &mut V) -> Result<()> {
        if self.branch_nodes.is_empty() {
            return Ok(());
        }
        self.walk_node(0, 0, self.triangles.len(), 0, visitor)
    }

    fn walk_node<V: TreeVisitor>(
        &self,
        index: usize,
        start: usize,
        end: usize,
        depth: u32,
        visitor: &mut V,
    ) -> Result<()> {
        let node = self.node(index)?;
        let mid = self.first_triangle(node.right, index)?;
        if mid < start || mid > end {
            return Err(Error::IndexOutOfRange {
                what: "leaf run",
                index: mid as i64,
                len: end,
            });
        }

        visitor.visit_branch(BranchVisit {
            index,
            node,
            left: start..mid,
            right: mid..end,
            depth,
        });

        for (child, lo, hi) in [(node.left, start, mid), (node.right, mid, end)] {
            match child.kind() {
                Some(NodeKind::Branch) => {
                    self.check_child(index, child)?;
                    self.walk_node(child.index(), lo, hi, depth + 1, visitor)?;
                }
                Some(NodeKind::TriangleRun) => visitor.visit_leaf(LeafRun {
                    start: lo,
                    triangles: &self.triangles[lo..hi],
                    depth,
                }),
                None => return Err(Error::BadNodeRef { bits: child.bits() }),
            }
        }
        Ok(())
    }

    /// Index of the first triangle under `node_ref`: follow left children down to a run.
    fn first_triangle(&self, mut node_ref: NodeRef, parent: usize) -> Result<usize> {
        let mut parent = parent;
        loop {
            match node_ref.kind() {
                Some(NodeKind::TriangleRun) => return Ok(node_ref.index()),
                Some(NodeKind::Branch) => {
                    self.check_child(parent, node_ref)?;
                    parent = node_ref.index();
                    node_ref = self.node(parent)?.left;
                }
                None => return Err(Error::BadNodeRef { bits: node_ref.bits() }),
            }
        }
    }

    fn node(&self, index: usize) -> Result<&BranchNode> {
        self.branch_nodes.get(index).ok_or(Error::IndexOutOfRange {
            what: "branch node",
            index: index as i64,
            len: self.branch_nodes.len(),
        })
    }

    fn check_child(&self, parent: usize, child: NodeRef) -> Result<()> {
        if child.index() <= parent {
            return Err(Error::BadNodeRef { bits: child.bits() });
        }
        Ok(())
    }

    /// Overlap-tolerant box query, the way the runtime walks the tree.
    ///
    /// Descends left while the box reaches down to `left_value` and right
    /// while it reaches up to `right_value`, then walks each reached leaf run
    /// along its `HAS_NEXT` chain. Calls `f` with the index of every
    /// candidate triangle; a triangle may be reported more than once only if
    /// the tree is malformed.
    pub fn query_box(
        &self,
        bounds: &BoundingBox,
        mut f: impl FnMut(usize, &CollTriangle),
    ) -> Result<()> {
        if self.branch_nodes.is_empty() {
            return Ok(());
        }

        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            let node = self.node(index)?;
            let axis = node.axis().ok_or(Error::BadNodeRef { bits: node.left.bits() })?;
            let a = axis.index();

            let visit_left = bounds.min[a] <= node.left_value;
            let visit_right = bounds.max[a] >= node.right_value;

            // Right is pushed first so the left side is visited first.
            for (child, visit) in [(node.right, visit_right), (node.left, visit_left)] {
                if !visit {
                    continue;
                }
                match child.kind() {
                    Some(NodeKind::Branch) => {
                        self.check_child(index, child)?;
                        stack.push(child.index());
                    }
                    Some(NodeKind::TriangleRun) => self.walk_chain(child.index(), &mut f)?,
                    None => return Err(Error::BadNodeRef { bits: child.bits() }),
                }
            }
        }
        Ok(())
    }

    fn walk_chain(&self, start: usize, f: &mut impl FnMut(usize, &CollTriangle)) -> Result<()> {
        let mut i = start;
        loop {
            let tri = self.triangles.get(i).ok_or(Error::IndexOutOfRange {
                what: "triangle",
                index: i as i64,
                len: self.triangles.len(),
            })?;
            f(i, tri);
            if !tri.has_next() {
                return Ok(());
            }
            i += 1;
        }
    }
}
