//! Common types and traits for pallet geometry.
//!
//! Positions are minimum corners in pallet coordinates: `x` runs along the pallet
//! length, `y` along its width and `z` upwards. Extents are kept separately as
//! [`Dims`] so a rotation never touches a position.

use std::ops::Add;

/// Global numerical tolerance for floating-point comparisons.
///
/// Used for bounds checks against the pallet extents.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Tolerance for matching a top face against a bottom face in the Z-plane.
pub const EPSILON_HEIGHT: f64 = 1e-6;

/// A point in pallet space.
///
/// # Examples
/// ```
/// use pallet_stack::types::Vec3;
///
/// let corner = Vec3::new(10.0, 0.0, 5.0);
/// assert_eq!(corner.as_tuple(), (10.0, 0.0, 5.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The pallet origin corner.
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Converts to tuple format for API compatibility.
    #[inline]
    pub const fn as_tuple(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }
}

impl Add<Dims> for Vec3 {
    type Output = Vec3;

    /// Moves a corner by an extent, giving the opposite corner.
    #[inline]
    fn add(self, rhs: Dims) -> Self::Output {
        Vec3::new(self.x + rhs.length, self.y + rhs.width, self.z + rhs.height)
    }
}

/// Extent of a box or pallet along the three axes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dims {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Dims {
    #[inline]
    pub const fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
        }
    }

    #[inline]
    pub const fn from_tuple(tuple: (f64, f64, f64)) -> Self {
        Self::new(tuple.0, tuple.1, tuple.2)
    }

    #[inline]
    pub const fn as_tuple(&self) -> (f64, f64, f64) {
        (self.length, self.width, self.height)
    }

    #[inline]
    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }

    /// Horizontal (length × width) area.
    #[inline]
    pub fn footprint_area(&self) -> f64 {
        self.length * self.width
    }

    /// The same box turned a quarter turn about the vertical axis.
    #[inline]
    pub const fn turned(&self) -> Self {
        Self::new(self.width, self.length, self.height)
    }

    /// The three extents sorted ascending.
    ///
    /// Two boxes that differ only by orientation share this triple.
    pub fn sorted(&self) -> [f64; 3] {
        let mut values = [self.length, self.width, self.height];
        values.sort_by(f64::total_cmp);
        values
    }

    /// Checks if all components are positive and finite.
    #[inline]
    pub fn is_valid(&self) -> bool {
        [self.length, self.width, self.height]
            .iter()
            .all(|v| *v > 0.0 && v.is_finite())
    }
}

impl From<(f64, f64, f64)> for Dims {
    #[inline]
    fn from(tuple: (f64, f64, f64)) -> Self {
        Self::from_tuple(tuple)
    }
}

/// Objects with a spatial extent.
pub trait Dimensional {
    fn dimensions(&self) -> Dims;

    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }

    fn footprint_area(&self) -> f64 {
        self.dimensions().footprint_area()
    }
}

/// Objects anchored in pallet space by their minimum corner.
pub trait Positioned {
    fn position(&self) -> Vec3;
}

/// Objects with a weight in kg.
pub trait Weighted {
    fn weight(&self) -> f64;
}
