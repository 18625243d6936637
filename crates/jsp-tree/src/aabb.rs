//! Axis-aligned bounding boxes and split axes.

use nalgebra::{Point3, Vector3};

/// One of the three coordinate axes a branch can split along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Component index (0, 1 or 2).
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Inverse of [`Axis::index`]. Returns `None` for anything above 2.
    pub fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Axis::X),
            1 => Some(Axis::Y),
            2 => Some(Axis::Z),
            _ => None,
        }
    }
}

/// A box given by its minimum and maximum corners.
///
/// An empty box has `min = +inf` and `max = -inf` so that the first point
/// added replaces both corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl BoundingBox {
    pub const EMPTY: Self = Self {
        min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    /// Creates a box from its corners, taken as given.
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        Self { min, max }
    }

    /// Smallest box containing all `points`.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3<f32>>) -> Self {
        let mut bbox = Self::EMPTY;
        for p in points {
            bbox.add_point(p);
        }
        bbox
    }

    /// Grows the box to contain `p`.
    pub fn add_point(&mut self, p: &Point3<f32>) {
        for i in 0..3 {
            if p[i] < self.min[i] {
                self.min[i] = p[i];
            }
            if p[i] > self.max[i] {
                self.max[i] = p[i];
            }
        }
    }

    /// Returns `true` if no point has been added yet.
    pub fn is_empty(&self) -> bool {
        (0..3).any(|i| self.min[i] > self.max[i])
    }

    /// Side lengths along each axis.
    #[inline]
    pub fn extent(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Axis with the greatest extent. Ties resolve to X, then Y, then Z.
    pub fn longest_axis(&self) -> Axis {
        let dim = self.extent();
        let mut axis = Axis::X;
        if dim.y > dim[axis.index()] {
            axis = Axis::Y;
        }
        if dim.z > dim[axis.index()] {
            axis = Axis::Z;
        }
        axis
    }

    /// Midpoint of the box along `axis`.
    #[inline]
    pub fn center(&self, axis: Axis) -> f32 {
        (self.min[axis.index()] + self.max[axis.index()]) / 2.0
    }

    /// Copy of the box with its maximum along `axis` replaced.
    pub fn with_max(mut self, axis: Axis, value: f32) -> Self {
        self.max[axis.index()] = value;
        self
    }

    /// Copy of the box with its minimum along `axis` replaced.
    pub fn with_min(mut self, axis: Axis, value: f32) -> Self {
        self.min[axis.index()] = value;
        self
    }

    /// Returns `true` if the boxes touch or overlap.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        (0..3).all(|i| self.min[i] <= other.max[i] && other.min[i] <= self.max[i])
    }
}
