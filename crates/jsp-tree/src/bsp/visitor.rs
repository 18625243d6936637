//! Visitor pattern for collision tree traversal.
//!
//! Visitors receive branch nodes and leaf runs as [`CollisionTree::walk`]
//! reaches them, keeping traversal separate from what is done with it.
//!
//! [`CollisionTree::walk`]: super::CollisionTree::walk

use std::ops::Range;

use crate::triangle::CollTriangle;

use super::node::BranchNode;

/// A contiguous run of triangles addressed by one leaf reference.
#[derive(Debug, Clone, Copy)]
pub struct LeafRun<'a> {
    /// Index of the first triangle of the run in the tree's triangle array.
    pub start: usize,
    /// The run itself. Empty when a branch side received no triangles.
    pub triangles: &'a [CollTriangle],
    /// Depth of the branch node owning this leaf.
    pub depth: u32,
}

impl LeafRun<'_> {
    /// Number of triangles in the run.
    #[inline]
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// Returns `true` for the run of a branch side that received no triangles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// `true` if `HAS_NEXT` is set on every triangle of the run except the last.
    pub fn is_chained(&self) -> bool {
        match self.triangles.split_last() {
            None => true,
            Some((last, rest)) => !last.has_next() && rest.iter().all(CollTriangle::has_next),
        }
    }
}

/// A branch node together with the triangle ranges its two sides cover.
#[derive(Debug, Clone)]
pub struct BranchVisit<'a> {
    /// Position in the branch node array.
    pub index: usize,
    pub node: &'a BranchNode,
    pub left: Range<usize>,
    pub right: Range<usize>,
    pub depth: u32,
}

/// Visitor for collision tree traversal.
pub trait TreeVisitor {
    /// Called for each branch node, before its children.
    fn visit_branch(&mut self, branch: BranchVisit<'_>) {
        let _ = branch;
    }

    /// Called for each leaf run, left before right.
    fn visit_leaf(&mut self, run: LeafRun<'_>);
}

/// Summary of a leaf run, detached from the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafInfo {
    pub start: usize,
    pub len: usize,
    pub depth: u32,
    pub chained: bool,
}

/// A simple visitor that records every branch index and leaf run.
#[derive(Debug, Default)]
pub struct CollectingVisitor {
    branches: Vec<usize>,
    leaves: Vec<LeafInfo>,
}

impl CollectingVisitor {
    /// Creates a visitor with nothing recorded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Branch indices in visiting order.
    pub fn branches(&self) -> &[usize] {
        &self.branches
    }

    /// Leaf runs in visiting order.
    pub fn leaves(&self) -> &[LeafInfo] {
        &self.leaves
    }

    /// Consumes the visitor, returning the recorded leaf runs.
    pub fn into_leaves(self) -> Vec<LeafInfo> {
        self.leaves
    }
}

impl TreeVisitor for CollectingVisitor {
    fn visit_branch(&mut self, branch: BranchVisit<'_>) {
        self.branches.push(branch.index);
    }

    fn visit_leaf(&mut self, run: LeafRun<'_>) {
        self.leaves.push(LeafInfo {
            start: run.start,
            len: run.len(),
            depth: run.depth,
            chained: run.is_chained(),
        });
    }
}

/// Adapts a closure over leaf runs into a [`TreeVisitor`]. Branches are skipped.
pub struct FnVisitor<F>(F);

impl<F: FnMut(LeafRun<'_>)> FnVisitor<F> {
    /// Wraps `on_leaf`, called once per leaf run in walk order.
    pub fn new(on_leaf: F) -> Self {
        Self(on_leaf)
    }
}

impl<F: FnMut(LeafRun<'_>)> TreeVisitor for FnVisitor<F> {
    fn visit_leaf(&mut self, run: LeafRun<'_>) {
        (self.0)(run);
    }
}
