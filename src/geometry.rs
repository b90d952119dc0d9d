//! Geometric helpers for bounds checks, collision detection and support areas.

use crate::model::PalletSpec;
use crate::types::{Dimensional, Dims, Positioned, Vec3};

/// Axis-aligned bounding box of a positioned object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner (position)
    pub min: Vec3,
    /// Maximum corner (position + dimensions)
    pub max: Vec3,
}

impl BoundingBox {
    #[inline]
    pub fn from_position_and_dims(position: Vec3, dims: Dims) -> Self {
        Self {
            min: position,
            max: position + dims,
        }
    }

    #[inline]
    pub fn of<T: Positioned + Dimensional>(item: &T) -> Self {
        Self::from_position_and_dims(item.position(), item.dimensions())
    }
}

/// Checks that an object placed at `position` stays inside the pallet.
///
/// `epsilon` absorbs float drift from accumulated layer heights.
pub fn fits(pallet: &PalletSpec, dims: Dims, position: Vec3, epsilon: f64) -> bool {
    let far = position + dims;
    position.x >= -epsilon
        && position.y >= -epsilon
        && position.z >= -epsilon
        && far.x <= pallet.dims.length + epsilon
        && far.y <= pallet.dims.width + epsilon
        && far.z <= pallet.dims.height + epsilon
}

/// Checks whether two objects share volume.
///
/// Objects overlap only if their extents intersect on all three axes at once;
/// touching faces do not count.
pub fn overlaps<A, B>(a: &A, b: &B) -> bool
where
    A: Positioned + Dimensional,
    B: Positioned + Dimensional,
{
    let a = BoundingBox::of(a);
    let b = BoundingBox::of(b);

    // Separated along any single axis means no overlap
    !(a.max.x <= b.min.x
        || b.max.x <= a.min.x
        || a.max.y <= b.min.y
        || b.max.y <= a.min.y
        || a.max.z <= b.min.z
        || b.max.z <= a.min.z)
}

/// Length of the intersection of two intervals, at least 0.0.
///
/// ```
/// use pallet_stack::geometry::overlap_1d;
///
/// assert_eq!(overlap_1d(0.0, 5.0, 3.0, 8.0), 2.0);
/// assert_eq!(overlap_1d(0.0, 5.0, 6.0, 8.0), 0.0);
/// ```
pub fn overlap_1d(a1: f64, a2: f64, b1: f64, b2: f64) -> f64 {
    (a2.min(b2) - a1.max(b1)).max(0.0)
}

/// Intersection area of two horizontal footprints, ignoring z.
pub fn footprint_overlap_area<A, B>(a: &A, b: &B) -> f64
where
    A: Positioned + Dimensional,
    B: Positioned + Dimensional,
{
    let a = BoundingBox::of(a);
    let b = BoundingBox::of(b);
    overlap_1d(a.min.x, a.max.x, b.min.x, b.max.x) * overlap_1d(a.min.y, a.max.y, b.min.y, b.max.y)
}
