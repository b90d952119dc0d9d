//! Grouping of congruent boxes and the resulting placement order.
//!
//! Boxes are bucketed by their dimension signature. Buckets with the largest
//! total volume go first, so the bulkiest and most numerous shapes claim the
//! floor before smaller items fill what is left.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::model::BoxUnit;

/// A box's dimensions sorted ascending. Orientation-independent grouping key.
#[derive(Clone, Copy, Debug)]
pub struct DimensionSignature([f64; 3]);

impl DimensionSignature {
    pub fn of(unit: &BoxUnit) -> Self {
        Self(unit.dims.sorted())
    }

    pub fn values(&self) -> [f64; 3] {
        self.0
    }

    fn bits(&self) -> [u64; 3] {
        self.0.map(f64::to_bits)
    }
}

impl PartialEq for DimensionSignature {
    fn eq(&self, other: &Self) -> bool {
        self.bits() == other.bits()
    }
}

impl Eq for DimensionSignature {}

impl Hash for DimensionSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits().hash(state);
    }
}

/// Units sharing one dimension signature.
#[derive(Clone, Debug)]
pub struct BoxGroup {
    pub signature: DimensionSignature,
    /// Volume of a single unit.
    pub unit_volume: f64,
    pub units: Vec<BoxUnit>,
}

impl BoxGroup {
    pub fn count(&self) -> usize {
        self.units.len()
    }

    /// Single-unit volume × count.
    pub fn total_volume(&self) -> f64 {
        self.unit_volume * self.count() as f64
    }
}

/// Buckets units by signature, keeping first-appearance order of groups and
/// input order inside each group.
pub fn group_by_signature(units: &[BoxUnit]) -> Vec<BoxGroup> {
    let mut index: HashMap<DimensionSignature, usize> = HashMap::new();
    let mut groups: Vec<BoxGroup> = Vec::new();

    for unit in units {
        let signature = DimensionSignature::of(unit);
        let slot = *index.entry(signature).or_insert_with(|| {
            groups.push(BoxGroup {
                signature,
                unit_volume: unit.dims.volume(),
                units: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].units.push(unit.clone());
    }

    groups
}

/// Sorts groups descending by (total volume, count). Ties keep their order.
pub fn sort_by_priority(groups: &mut [BoxGroup]) {
    groups.sort_by(|a, b| {
        b.total_volume()
            .partial_cmp(&a.total_volume())
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.count().cmp(&a.count()))
    });
}

/// Produces the order in which units are offered to the placement engine.
pub fn placement_sequence(units: &[BoxUnit]) -> Vec<BoxUnit> {
    let mut groups = group_by_signature(units);
    sort_by_priority(&mut groups);
    groups.into_iter().flat_map(|group| group.units).collect()
}
