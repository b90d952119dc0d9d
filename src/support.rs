//! Support evaluation for stacked boxes.
//!
//! A box resting on the pallet floor is fully supported. Anything above the floor
//! counts only the footprint area shared with boxes whose top face sits exactly
//! at its bottom face.

use crate::geometry::footprint_overlap_area;
use crate::model::PlacedBox;
use crate::types::{Dimensional, Positioned};

/// Support thresholds in percent, strictest first. Never relaxed below the last tier.
pub const SUPPORT_THRESHOLDS: [u8; 5] = [80, 75, 70, 65, 60];

/// Percentage of the candidate's footprint resting on placed boxes.
///
/// Returns 100.0 for candidates on the floor.
pub fn support_percent<T>(placed: &[PlacedBox], candidate: &T, height_epsilon: f64) -> f64
where
    T: Positioned + Dimensional,
{
    let bottom_z = candidate.position().z;
    if bottom_z.abs() <= height_epsilon {
        return 100.0;
    }

    let base_area = candidate.footprint_area();
    if base_area <= 0.0 {
        return 0.0;
    }

    let support_area: f64 = placed
        .iter()
        .filter(|p| (p.top_z() - bottom_z).abs() <= height_epsilon)
        .map(|p| footprint_overlap_area(p, candidate))
        .sum();

    100.0 * support_area / base_area
}

/// Checks one threshold. Returns the verdict together with the measured percentage.
pub fn is_supported<T>(
    placed: &[PlacedBox],
    candidate: &T,
    threshold_percent: u8,
    height_epsilon: f64,
) -> (bool, f64)
where
    T: Positioned + Dimensional,
{
    let actual = support_percent(placed, candidate, height_epsilon);
    (actual >= f64::from(threshold_percent), actual)
}

/// The accepted tier and the measured support behind it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SupportDecision {
    pub threshold: u8,
    pub percent: f64,
}

/// Walks [`SUPPORT_THRESHOLDS`] and returns the first tier the candidate meets.
pub fn first_satisfied_tier<T>(
    placed: &[PlacedBox],
    candidate: &T,
    height_epsilon: f64,
) -> Option<SupportDecision>
where
    T: Positioned + Dimensional,
{
    let percent = support_percent(placed, candidate, height_epsilon);
    SUPPORT_THRESHOLDS
        .iter()
        .find(|&&tier| percent >= f64::from(tier))
        .map(|&threshold| SupportDecision { threshold, percent })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoxUnit, PlacementAttempt};
    use crate::types::{Dims, EPSILON_HEIGHT, Vec3};

    fn placed(x: f64, y: f64, z: f64, dims: (f64, f64, f64)) -> PlacedBox {
        let dims = Dims::from(dims);
        let unit = BoxUnit {
            id: 0,
            name: "base".into(),
            dims,
            weight: 1.0,
        };
        PlacementAttempt::new(dims, Vec3::new(x, y, z)).commit(&unit, 80, 100.0)
    }

    fn attempt(x: f64, y: f64, z: f64, dims: (f64, f64, f64)) -> PlacementAttempt {
        PlacementAttempt::new(Dims::from(dims), Vec3::new(x, y, z))
    }

    #[test]
    fn floor_is_always_fully_supported() {
        let candidate = attempt(10.0, 10.0, 0.0, (5.0, 5.0, 5.0));
        assert_eq!(is_supported(&[], &candidate, 80, EPSILON_HEIGHT), (true, 100.0));
    }

    #[test]
    fn unsupported_in_mid_air() {
        let candidate = attempt(0.0, 0.0, 10.0, (5.0, 5.0, 5.0));
        let (ok, percent) = is_supported(&[], &candidate, 60, EPSILON_HEIGHT);
        assert!(!ok);
        assert_eq!(percent, 0.0);
    }

    #[test]
    fn sums_support_from_several_boxes() {
        let below = vec![
            placed(0.0, 0.0, 0.0, (3.0, 4.0, 5.0)),
            placed(3.0, 0.0, 0.0, (3.0, 4.0, 5.0)),
        ];
        let candidate = attempt(0.0, 0.0, 5.0, (8.0, 4.0, 1.0));
        let percent = support_percent(&below, &candidate, EPSILON_HEIGHT);
        assert!((percent - 75.0).abs() < 1e-9);
        assert!(!is_supported(&below, &candidate, 80, EPSILON_HEIGHT).0);
        assert!(is_supported(&below, &candidate, 75, EPSILON_HEIGHT).0);
    }

    #[test]
    fn ignores_boxes_at_other_heights() {
        let below = vec![
            placed(0.0, 0.0, 0.0, (4.0, 4.0, 5.0)),
            // Shorter box, top face below the candidate
            placed(4.0, 0.0, 0.0, (4.0, 4.0, 3.0)),
        ];
        let candidate = attempt(0.0, 0.0, 5.0, (8.0, 4.0, 1.0));
        let percent = support_percent(&below, &candidate, EPSILON_HEIGHT);
        assert!((percent - 50.0).abs() < 1e-9);
        assert_eq!(first_satisfied_tier(&below, &candidate, EPSILON_HEIGHT), None);
    }

    #[test]
    fn absorbs_float_drift_in_heights() {
        let below = vec![placed(0.0, 0.0, 0.0, (4.0, 4.0, 0.1 + 0.2))];
        let candidate = attempt(0.0, 0.0, 0.3, (4.0, 4.0, 1.0));
        assert!((support_percent(&below, &candidate, EPSILON_HEIGHT) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn ladder_picks_strictest_satisfied_tier() {
        let below = vec![placed(0.0, 0.0, 0.0, (7.0, 10.0, 5.0))];
        // 70% of the footprint rests on the box below
        let candidate = attempt(0.0, 0.0, 5.0, (10.0, 10.0, 1.0));
        let decision = first_satisfied_tier(&below, &candidate, EPSILON_HEIGHT).unwrap();
        assert_eq!(decision.threshold, 70);
        assert!((decision.percent - 70.0).abs() < 1e-9);

        let full = attempt(0.0, 0.0, 5.0, (7.0, 10.0, 1.0));
        assert_eq!(
            first_satisfied_tier(&below, &full, EPSILON_HEIGHT).map(|d| d.threshold),
            Some(80)
        );
    }
}
