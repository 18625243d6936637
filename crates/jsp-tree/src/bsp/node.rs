//! Branch nodes and packed child references.

use std::fmt;

use crate::{Axis, Error, Result};

/// What a child reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Start of a leaf run in the triangle array.
    TriangleRun = 1,
    /// Another entry in the branch node array.
    Branch = 2,
}

/// A child reference packed into one word.
///
/// Layout: bits 0-1 kind, bits 2-3 split axis, bits 4-11 reserved (zero),
/// bits 12-31 index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeRef(u32);

impl NodeRef {
    pub const INDEX_SHIFT: u32 = 12;
    pub const MAX_INDEX: u32 = u32::MAX >> Self::INDEX_SHIFT;

    const KIND_MASK: u32 = 0x3;
    const AXIS_MASK: u32 = 0xC;
    const AXIS_SHIFT: u32 = 2;

    /// Packs a reference. Fails if `index` does not fit the 20-bit index field.
    pub fn new(kind: NodeKind, axis: Axis, index: usize) -> Result<Self> {
        let index = u32::try_from(index)
            .ok()
            .filter(|&i| i <= Self::MAX_INDEX)
            .ok_or(Error::FieldOverflow {
                what: "node reference index",
                value: index as i64,
                bits: 32 - Self::INDEX_SHIFT,
            })?;
        let axis = (axis.index() as u32) << Self::AXIS_SHIFT;
        let kind = (kind as u32) & Self::KIND_MASK;
        Ok(Self(kind | (axis & Self::AXIS_MASK) | (index << Self::INDEX_SHIFT)))
    }

    /// Reference to the branch node at `index`.
    #[inline]
    pub fn branch(axis: Axis, index: usize) -> Result<Self> {
        Self::new(NodeKind::Branch, axis, index)
    }

    /// Reference to the leaf run starting at triangle `start`.
    #[inline]
    pub fn triangles(axis: Axis, start: usize) -> Result<Self> {
        Self::new(NodeKind::TriangleRun, axis, start)
    }

    /// Wraps raw bits, checking kind, axis and the reserved bits.
    pub fn from_bits(bits: u32) -> Result<Self> {
        let node = Self(bits);
        let reserved = bits & !(Self::KIND_MASK | Self::AXIS_MASK) & ((1 << Self::INDEX_SHIFT) - 1);
        if node.kind().is_none() || node.axis().is_none() || reserved != 0 {
            return Err(Error::BadNodeRef { bits });
        }
        Ok(node)
    }

    /// The packed word as written to disk.
    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Decoded kind, or `None` for the unused values 0 and 3.
    pub fn kind(self) -> Option<NodeKind> {
        match self.0 & Self::KIND_MASK {
            1 => Some(NodeKind::TriangleRun),
            2 => Some(NodeKind::Branch),
            _ => None,
        }
    }

    /// Decoded split axis, or `None` if the axis bits hold 3.
    pub fn axis(self) -> Option<Axis> {
        Axis::from_index((self.0 & Self::AXIS_MASK) >> Self::AXIS_SHIFT)
    }

    /// Branch node index or first triangle of the run, depending on the kind.
    #[inline]
    pub fn index(self) -> usize {
        (self.0 >> Self::INDEX_SHIFT) as usize
    }

    /// Returns `true` if this points at another branch node.
    #[inline]
    pub fn is_branch(self) -> bool {
        self.kind() == Some(NodeKind::Branch)
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeRef")
            .field("kind", &self.kind())
            .field("axis", &self.axis())
            .field("index", &self.index())
            .finish()
    }
}

/// An interior node of the collision tree.
///
/// `left_value` is the largest coordinate reached by the left subtree along
/// the split axis and `right_value` the smallest reached by the right subtree.
/// The two may overlap; queries use them rather than the split coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BranchNode {
    pub left: NodeRef,
    pub right: NodeRef,
    pub left_value: f32,
    pub right_value: f32,
}

impl BranchNode {
    /// Split axis of this branch. Both references carry the same axis.
    pub fn axis(&self) -> Option<Axis> {
        self.left.axis()
    }
}
