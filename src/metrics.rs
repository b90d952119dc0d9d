//! Summary figures over a finished pallet.

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{PalletSpec, PlacedBox};
use crate::types::{Dimensional, Weighted};

/// Industry divisor turning cubic centimetres into volumetric kilograms.
pub const VOLUMETRIC_DIVISOR: f64 = 6000.0;

/// Relative tolerance for declaring a pallet perfectly filled.
pub const PERFECT_FILL_TOLERANCE: f64 = 1e-3;

/// Greatest `z + height` among placed boxes, 0.0 for an empty pallet.
pub fn max_occupied_height(placed: &[PlacedBox]) -> f64 {
    placed.iter().map(PlacedBox::top_z).fold(0.0, f64::max)
}

/// `length × width × max occupied height / divisor`.
///
/// Only the occupied height counts; the pallet's nominal height does not.
pub fn volumetric_weight(pallet: &PalletSpec, placed: &[PlacedBox], divisor: f64) -> f64 {
    pallet.dims.length * pallet.dims.width * max_occupied_height(placed) / divisor
}

/// Sum of placed box volumes.
pub fn used_volume(placed: &[PlacedBox]) -> f64 {
    placed.iter().map(|b| b.volume()).sum()
}

/// True when the placed volume equals the pallet volume within `tolerance` (relative).
pub fn is_perfect_arrangement(pallet: &PalletSpec, placed: &[PlacedBox], tolerance: f64) -> bool {
    let capacity = pallet.volume();
    if capacity <= 0.0 {
        return false;
    }
    (used_volume(placed) - capacity).abs() <= tolerance * capacity
}

/// Per-pallet figures reported alongside a successful placement.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PalletMetrics {
    pub box_count: usize,
    pub total_weight: f64,
    pub used_volume: f64,
    pub utilization_percent: f64,
    pub max_height: f64,
    pub layer_count: usize,
    pub volumetric_weight: f64,
    /// Max of actual and volumetric weight.
    pub chargeable_weight: f64,
    pub is_perfect: bool,
}

impl PalletMetrics {
    pub fn compute(
        pallet: &PalletSpec,
        placed: &[PlacedBox],
        layer_count: usize,
        divisor: f64,
        perfect_tolerance: f64,
    ) -> Self {
        let used = used_volume(placed);
        let capacity = pallet.volume();
        let total_weight: f64 = placed.iter().map(|b| b.weight()).sum();
        let volumetric = volumetric_weight(pallet, placed, divisor);

        Self {
            box_count: placed.len(),
            total_weight,
            used_volume: used,
            utilization_percent: if capacity > 0.0 {
                used / capacity * 100.0
            } else {
                0.0
            },
            max_height: max_occupied_height(placed),
            layer_count,
            volumetric_weight: volumetric,
            chargeable_weight: total_weight.max(volumetric),
            is_perfect: is_perfect_arrangement(pallet, placed, perfect_tolerance),
        }
    }
}
