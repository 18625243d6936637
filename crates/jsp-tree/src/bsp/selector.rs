//! Split plane selection strategies.
//!
//! The choice of split affects how balanced the tree ends up. The shipped
//! strategy halves the longest side of the current bounding box.

use crate::triangle::WorkingTriangle;
use crate::{Axis, BoundingBox};

/// An axis-aligned split: triangles whose extent midpoint along `axis` is
/// below `value` go left, the rest go right.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPlane {
    pub axis: Axis,
    pub value: f32,
}

/// Strategy for choosing the split plane of a range.
pub trait SplitSelector {
    /// Picks a split for `triangles`, whose region is bounded by `bounds`.
    fn select(&self, bounds: &BoundingBox, triangles: &[WorkingTriangle]) -> SplitPlane;
}

/// Splits the longest side of the bounding box down the middle.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongestAxisMidpoint;

impl SplitSelector for LongestAxisMidpoint {
    fn select(&self, bounds: &BoundingBox, _triangles: &[WorkingTriangle]) -> SplitPlane {
        let axis = bounds.longest_axis();
        SplitPlane {
            axis,
            value: bounds.center(axis),
        }
    }
}
