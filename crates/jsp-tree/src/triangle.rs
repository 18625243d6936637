//! Collision triangle records.

use bitflags::bitflags;
use nalgebra::Point3;

use crate::Axis;

bitflags! {
    /// Per-triangle status bits, stored as one byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TriangleFlags: u8 {
        /// Another triangle of the same leaf run follows this one.
        const HAS_NEXT   = 0x01;
        /// Odd window of a tri-strip, wound clockwise.
        const IS_REVERSE = 0x02;
        /// Collision is enabled.
        const IS_SOLID   = 0x04;
        /// Belongs to a rendered surface.
        const IS_VISIBLE = 0x08;
        /// Characters slide off instead of standing.
        const NO_STAND   = 0x10;
        /// Always receives shadows.
        const SHADOW     = 0x20;
    }
}

/// A triangle as persisted in the collision chunk.
///
/// Geometry is addressed by surface and strip position, never by value, so
/// the record survives reordering of the triangle array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollTriangle {
    /// Index of the owning surface in scene order.
    pub surface: u16,
    /// Offset of the window's first index within the surface's concatenated strips.
    pub vertex: u16,
    pub flags: TriangleFlags,
    /// Reserved per-platform byte, always written as zero.
    pub platform_data: u8,
    pub material: u16,
}

impl CollTriangle {
    /// Returns `true` if another triangle of the same leaf run follows.
    #[inline]
    pub fn has_next(&self) -> bool {
        self.flags.contains(TriangleFlags::HAS_NEXT)
    }
}

/// Builder-side triangle: the persisted record plus cached geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkingTriangle {
    pub tri: CollTriangle,
    /// Position of the first of the three corners in the strip vector list.
    pub strip_offset: usize,
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl WorkingTriangle {
    /// Builds a working triangle whose extent is the component-wise min/max of `corners`.
    pub fn new(tri: CollTriangle, strip_offset: usize, corners: &[Point3<f32>; 3]) -> Self {
        let mut min = corners[0];
        let mut max = corners[0];
        for corner in &corners[1..] {
            for i in 0..3 {
                if corner[i] < min[i] {
                    min[i] = corner[i];
                }
                if corner[i] > max[i] {
                    max[i] = corner[i];
                }
            }
        }
        Self {
            tri,
            strip_offset,
            min,
            max,
        }
    }

    /// Midpoint of the extent along `axis`. Decides which side of a split the triangle falls on.
    #[inline]
    pub fn center(&self, axis: Axis) -> f32 {
        (self.min[axis.index()] + self.max[axis.index()]) / 2.0
    }
}
