//! Axis-aligned collision BSP over a flat triangle array.
//!
//! The builder recursively splits an index range of the working triangle
//! array by an axis-aligned plane, reordering the triangles in place so that
//! every leaf ends up as one contiguous run. Each split records two overlap
//! planes instead of the split coordinate itself, so a triangle straddling
//! the plane is stored once, on the side of its midpoint.
//!
//! # Example
//!
//! ```ignore
//! use jsp_tree::bsp::{CollectingVisitor, TreeBuilder};
//! use jsp_tree::BuildConfig;
//!
//! let builder = TreeBuilder::new(BuildConfig::default());
//! let (tree, stats) = builder.build_fitted(&mut triangles)?;
//!
//! let mut visitor = CollectingVisitor::new();
//! tree.walk(&mut visitor)?;
//! assert!(visitor.leaves().iter().all(|leaf| leaf.chained));
//! ```
//!
//! # Architecture
//!
//! - [`TreeBuilder`]: Partitions the triangles and emits branch nodes in pre-order
//! - [`CollisionTree`]: Branch nodes plus the reordered triangle records
//! - [`NodeRef`]: Packed child reference (kind, axis, index)
//! - [`SplitSelector`]: Strategy trait for choosing the split plane
//! - [`TreeVisitor`]: Visitor trait for walking branches and leaf runs

mod builder;
mod node;
mod selector;
mod tree;
mod visitor;

pub use builder::{BuildStats, TreeBuilder, partition};
pub use node::{BranchNode, NodeKind, NodeRef};
pub use selector::{LongestAxisMidpoint, SplitPlane, SplitSelector};
pub use tree::CollisionTree;
pub use visitor::{BranchVisit, CollectingVisitor, FnVisitor, LeafInfo, LeafRun, TreeVisitor};
