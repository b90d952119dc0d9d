//! Candidate positions on a layer.
//!
//! Every integer grid point a rotation can occupy is visited, row by row from the
//! pallet origin: x ascending within y ascending. The sequence is lazy and can be
//! restarted, so scanning a large pallet never materializes the grid.

use crate::model::PalletSpec;
use crate::types::{Dims, Vec3};

/// Lazy row-major scan over the unit grid of one layer.
#[derive(Clone, Debug)]
pub struct CandidatePositions {
    max_x: i64,
    max_y: i64,
    z: f64,
    next_x: i64,
    next_y: i64,
}

impl CandidatePositions {
    /// Highest grid coordinate along one axis, negative when the object does not fit.
    fn axis_limit(pallet_len: f64, object_len: f64, epsilon: f64) -> i64 {
        (pallet_len - object_len + epsilon).floor() as i64
    }

    /// Number of positions the full scan visits.
    pub fn total(&self) -> usize {
        if self.max_x < 0 || self.max_y < 0 {
            return 0;
        }
        ((self.max_x + 1) * (self.max_y + 1)) as usize
    }

    /// Rewinds to the origin corner.
    pub fn restart(&mut self) {
        self.next_x = 0;
        self.next_y = 0;
    }

    fn remaining(&self) -> usize {
        if self.max_x < 0 || self.next_y > self.max_y {
            return 0;
        }
        let rows_after = (self.max_y - self.next_y) * (self.max_x + 1);
        (rows_after + self.max_x + 1 - self.next_x) as usize
    }
}

impl Iterator for CandidatePositions {
    type Item = Vec3;

    fn next(&mut self) -> Option<Self::Item> {
        if self.max_x < 0 || self.next_y > self.max_y {
            return None;
        }

        let position = Vec3::new(self.next_x as f64, self.next_y as f64, self.z);
        if self.next_x < self.max_x {
            self.next_x += 1;
        } else {
            self.next_x = 0;
            self.next_y += 1;
        }
        Some(position)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CandidatePositions {}

/// Enumerates where an object with `dims` could sit on the layer at `z`.
///
/// `epsilon` is the bounds tolerance; it must match the one used by
/// [`crate::geometry::fits`] so every yielded position passes the bounds check.
///
/// ```
/// use pallet_stack::model::PalletSpec;
/// use pallet_stack::search::candidate_positions;
/// use pallet_stack::types::{Dims, EPSILON_GENERAL};
///
/// let pallet = PalletSpec::new(1, None, Dims::new(3.0, 2.0, 5.0)).unwrap();
/// let xy: Vec<(f64, f64)> = candidate_positions(&pallet, Dims::new(2.0, 1.0, 1.0), 0.0, EPSILON_GENERAL)
///     .map(|p| (p.x, p.y))
///     .collect();
/// assert_eq!(xy, vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
/// ```
pub fn candidate_positions(
    pallet: &PalletSpec,
    dims: Dims,
    z: f64,
    epsilon: f64,
) -> CandidatePositions {
    CandidatePositions {
        max_x: CandidatePositions::axis_limit(pallet.dims.length, dims.length, epsilon),
        max_y: CandidatePositions::axis_limit(pallet.dims.width, dims.width, epsilon),
        z,
        next_x: 0,
        next_y: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EPSILON_GENERAL;

    fn pallet(length: f64, width: f64) -> PalletSpec {
        PalletSpec::new(1, None, Dims::new(length, width, 100.0)).unwrap()
    }

    #[test]
    fn scans_row_major_from_origin() {
        let positions: Vec<Vec3> =
            candidate_positions(&pallet(4.0, 3.0), Dims::new(2.0, 2.0, 1.0), 7.0, EPSILON_GENERAL).collect();
        let xy: Vec<(f64, f64)> = positions.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(
            xy,
            vec![
                (0.0, 0.0),
                (1.0, 0.0),
                (2.0, 0.0),
                (0.0, 1.0),
                (1.0, 1.0),
                (2.0, 1.0)
            ]
        );
        assert!(positions.iter().all(|p| p.z == 7.0));
    }

    #[test]
    fn exact_fit_yields_only_origin() {
        let positions: Vec<Vec3> =
            candidate_positions(&pallet(80.0, 60.0), Dims::new(80.0, 60.0, 1.0), 0.0, EPSILON_GENERAL).collect();
        assert_eq!(positions, vec![Vec3::zero()]);
    }

    #[test]
    fn oversized_rotation_yields_nothing() {
        let scan = candidate_positions(&pallet(80.0, 60.0), Dims::new(90.0, 30.0, 1.0), 0.0, EPSILON_GENERAL);
        assert_eq!(scan.total(), 0);
        assert_eq!(scan.count(), 0);

        let scan = candidate_positions(&pallet(80.0, 60.0), Dims::new(30.0, 61.0, 1.0), 0.0, EPSILON_GENERAL);
        assert_eq!(scan.count(), 0);
    }

    #[test]
    fn fractional_slack_truncates_to_grid() {
        let scan = candidate_positions(&pallet(10.0, 1.0), Dims::new(7.5, 1.0, 1.0), 0.0, EPSILON_GENERAL);
        let xs: Vec<f64> = scan.map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn size_hint_tracks_progress_and_restart() {
        let mut scan = candidate_positions(&pallet(80.0, 60.0), Dims::new(40.0, 30.0, 1.0), 0.0, EPSILON_GENERAL);
        assert_eq!(scan.total(), 41 * 31);
        assert_eq!(scan.len(), 41 * 31);
        scan.next();
        scan.next();
        assert_eq!(scan.len(), 41 * 31 - 2);
        scan.restart();
        assert_eq!(scan.next(), Some(Vec3::zero()));
    }

    #[test]
    fn bounds_tolerance_widens_the_grid() {
        let box_dims = Dims::new(10.01, 1.0, 1.0);
        let strict = candidate_positions(&pallet(10.0, 1.0), box_dims, 0.0, EPSILON_GENERAL);
        assert_eq!(strict.count(), 0);

        let loose: Vec<Vec3> =
            candidate_positions(&pallet(10.0, 1.0), box_dims, 0.0, 0.1).collect();
        assert_eq!(loose, vec![Vec3::zero()]);
    }
}
