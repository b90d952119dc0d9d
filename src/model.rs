//! Data models for pallet placement.
//!
//! - `BoxSpec`: a requested box type with a quantity
//! - `BoxUnit`: one physical box expanded from a `BoxSpec`
//! - `PlacementAttempt`: a trial rotation and position threaded through the search
//! - `PlacedBox`: a committed placement, never moved afterwards
//! - `PalletSpec`: the pallet a run fills

use thiserror::Error;

use crate::types::{Dimensional, Dims, Positioned, Vec3, Weighted};

/// Render colors, picked by unit id.
pub const COLOR_PALETTE: [&str; 20] = [
    "red",
    "green",
    "blue",
    "orange",
    "purple",
    "yellow",
    "pink",
    "cyan",
    "magenta",
    "lime",
    "teal",
    "brown",
    "grey",
    "olive",
    "navy",
    "maroon",
    "gold",
    "coral",
    "turquoise",
    "violet",
];

/// Validation error for box and pallet input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
}

fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

fn validate_dims(dims: Dims, owner: &str) -> Result<(), ValidationError> {
    validate_dimension(dims.length, &format!("{owner} length"))?;
    validate_dimension(dims.width, &format!("{owner} width"))?;
    validate_dimension(dims.height, &format!("{owner} height"))?;
    Ok(())
}

fn validate_weight_value(value: f64) -> Result<(), ValidationError> {
    if value <= 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidWeight(format!(
            "Weight must be positive, got: {}",
            value
        )));
    }
    Ok(())
}

/// A requested box type.
///
/// # Fields
/// * `name` - Display name shared by every unit of this type
/// * `dims` - Original dimensions (length, width, height)
/// * `weight` - Weight of a single unit in kg
/// * `quantity` - Number of units to place
#[derive(Clone, Debug, PartialEq)]
pub struct BoxSpec {
    pub name: String,
    pub dims: Dims,
    pub weight: f64,
    pub quantity: u32,
}

impl BoxSpec {
    /// Creates a box type after validating dimensions, weight and quantity.
    ///
    /// # Examples
    /// ```
    /// use pallet_stack::model::BoxSpec;
    /// use pallet_stack::types::Dims;
    ///
    /// assert!(BoxSpec::new("Crate", Dims::new(40.0, 30.0, 10.0), 1.0, 6).is_ok());
    /// assert!(BoxSpec::new("Crate", Dims::new(40.0, 30.0, 10.0), 1.0, 0).is_err());
    /// ```
    pub fn new(
        name: impl Into<String>,
        dims: Dims,
        weight: f64,
        quantity: u32,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        validate_dims(dims, "Box")?;
        validate_weight_value(weight)?;
        if quantity == 0 {
            return Err(ValidationError::InvalidQuantity(format!(
                "Quantity of '{}' must be at least 1",
                name
            )));
        }
        Ok(Self {
            name,
            dims,
            weight,
            quantity,
        })
    }
}

/// Expands box types into individual units with ordinal ids in input order.
pub fn expand_units(specs: &[BoxSpec]) -> Vec<BoxUnit> {
    specs
        .iter()
        .flat_map(|spec| std::iter::repeat_n(spec, spec.quantity as usize))
        .enumerate()
        .map(|(id, spec)| BoxUnit {
            id,
            name: spec.name.clone(),
            dims: spec.dims,
            weight: spec.weight,
        })
        .collect()
}

/// A single physical box. Immutable for the whole run.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxUnit {
    pub id: usize,
    pub name: String,
    /// Original dimensions as requested; rotations are derived from these.
    pub dims: Dims,
    pub weight: f64,
}

impl BoxUnit {
    /// The two horizontal rotations, smaller first dimension first.
    ///
    /// Square footprints yield the same extent twice.
    pub fn rotations(&self) -> [Dims; 2] {
        let mut rotations = [self.dims, self.dims.turned()];
        rotations.sort_by(|a, b| a.length.total_cmp(&b.length));
        rotations
    }

    /// Deterministic render color.
    pub fn color(&self) -> &'static str {
        COLOR_PALETTE[self.id % COLOR_PALETTE.len()]
    }
}

impl Dimensional for BoxUnit {
    fn dimensions(&self) -> Dims {
        self.dims
    }
}

/// A trial rotation and position for one unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementAttempt {
    pub dims: Dims,
    pub position: Vec3,
}

impl PlacementAttempt {
    pub fn new(dims: Dims, position: Vec3) -> Self {
        Self { dims, position }
    }

    /// Turns the attempt into a committed placement.
    pub fn commit(self, unit: &BoxUnit, support_threshold: u8, support_percent: f64) -> PlacedBox {
        PlacedBox {
            unit: unit.clone(),
            dims: self.dims,
            position: self.position,
            support_threshold,
            support_percent,
        }
    }
}

impl Dimensional for PlacementAttempt {
    fn dimensions(&self) -> Dims {
        self.dims
    }
}

impl Positioned for PlacementAttempt {
    fn position(&self) -> Vec3 {
        self.position
    }
}

/// A unit accepted onto a pallet.
///
/// # Fields
/// * `unit` - The placed unit
/// * `dims` - Oriented dimensions, one of `unit.rotations()`
/// * `position` - Minimum corner (x, y, z)
/// * `support_threshold` - Ladder tier that accepted the placement
/// * `support_percent` - Supported share of the footprint at acceptance
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedBox {
    pub unit: BoxUnit,
    pub dims: Dims,
    pub position: Vec3,
    pub support_threshold: u8,
    pub support_percent: f64,
}

impl PlacedBox {
    /// Z coordinate of the top face.
    #[inline]
    pub fn top_z(&self) -> f64 {
        self.position.z + self.dims.height
    }

    /// Hover label for renderers.
    pub fn label(&self) -> String {
        format!(
            "{} ({}x{}x{}), support {}%",
            self.unit.name,
            self.dims.length,
            self.dims.width,
            self.dims.height,
            self.support_threshold
        )
    }
}

impl Dimensional for PlacedBox {
    fn dimensions(&self) -> Dims {
        self.dims
    }
}

impl Positioned for PlacedBox {
    fn position(&self) -> Vec3 {
        self.position
    }
}

impl Weighted for PlacedBox {
    fn weight(&self) -> f64 {
        self.unit.weight
    }
}

/// A pallet to fill.
///
/// # Fields
/// * `id` - 1-based ordinal within the request
/// * `label` - Optional display name
/// * `dims` - Usable length, width and stacking height
#[derive(Clone, Debug, PartialEq)]
pub struct PalletSpec {
    pub id: usize,
    pub label: Option<String>,
    pub dims: Dims,
}

impl PalletSpec {
    /// Creates a pallet after validating its dimensions.
    pub fn new(id: usize, label: Option<String>, dims: Dims) -> Result<Self, ValidationError> {
        validate_dims(dims, "Pallet")?;
        Ok(Self { id, label, dims })
    }
}

impl Dimensional for PalletSpec {
    fn dimensions(&self) -> Dims {
        self.dims
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_box_input() {
        let dims = Dims::new(40.0, 30.0, 10.0);
        assert!(matches!(
            BoxSpec::new("a", Dims::new(0.0, 30.0, 10.0), 1.0, 1),
            Err(ValidationError::InvalidDimension(_))
        ));
        assert!(matches!(
            BoxSpec::new("a", dims, -1.0, 1),
            Err(ValidationError::InvalidWeight(_))
        ));
        assert!(matches!(
            BoxSpec::new("a", dims, f64::NAN, 1),
            Err(ValidationError::InvalidWeight(_))
        ));
        assert!(matches!(
            BoxSpec::new("a", dims, 1.0, 0),
            Err(ValidationError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn rejects_invalid_pallet_dims() {
        assert!(PalletSpec::new(1, None, Dims::new(80.0, 60.0, 115.0)).is_ok());
        let err = PalletSpec::new(1, None, Dims::new(80.0, 60.0, -1.0)).unwrap_err();
        assert!(err.to_string().contains("Pallet height"));
    }

    #[test]
    fn expands_quantities_with_sequential_ids() {
        let specs = vec![
            BoxSpec::new("A", Dims::new(1.0, 2.0, 3.0), 1.0, 2).unwrap(),
            BoxSpec::new("B", Dims::new(4.0, 5.0, 6.0), 2.0, 3).unwrap(),
        ];
        let units = expand_units(&specs);
        assert_eq!(units.len(), 5);
        assert_eq!(
            units.iter().map(|u| u.id).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
        assert_eq!(units[1].name, "A");
        assert_eq!(units[2].name, "B");
        assert_eq!(units[4].weight, 2.0);
    }

    #[test]
    fn rotations_prefer_smaller_first_dimension() {
        let unit = BoxUnit {
            id: 0,
            name: "A".into(),
            dims: Dims::new(40.0, 30.0, 10.0),
            weight: 1.0,
        };
        let [first, second] = unit.rotations();
        assert_eq!(first, Dims::new(30.0, 40.0, 10.0));
        assert_eq!(second, Dims::new(40.0, 30.0, 10.0));
    }

    #[test]
    fn colors_cycle_through_palette() {
        let unit = |id| BoxUnit {
            id,
            name: "A".into(),
            dims: Dims::new(1.0, 1.0, 1.0),
            weight: 1.0,
        };
        assert_eq!(unit(0).color(), "red");
        assert_eq!(unit(19).color(), "violet");
        assert_eq!(unit(20).color(), "red");
    }

    #[test]
    fn committed_placement_keeps_attempt() {
        let unit = BoxUnit {
            id: 3,
            name: "Crate".into(),
            dims: Dims::new(40.0, 30.0, 10.0),
            weight: 1.0,
        };
        let attempt = PlacementAttempt::new(Dims::new(30.0, 40.0, 10.0), Vec3::new(0.0, 0.0, 10.0));
        let placed = attempt.commit(&unit, 75, 76.5);
        assert_eq!(placed.position, attempt.position);
        assert_eq!(placed.dims, attempt.dims);
        assert!((placed.top_z() - 20.0).abs() < 1e-9);
        assert_eq!(placed.label(), "Crate (30x40x10), support 75%");
    }
}
