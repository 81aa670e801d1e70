use itertools::izip;
use nalgebra::{DVector, RealField, Vector3};

use crate::{Error, LineSet, PointArray};

/// Per-pair results of [`intersect_lines`].
///
/// Row `i` describes the pair (ray `i` of the first set, ray `i` of the
/// second set).
#[derive(Debug, Clone, PartialEq)]
pub struct PairwiseIntersections<R: RealField + Copy> {
    /// Midpoint of the two closest points on each ray pair.
    ///
    /// For a pair flagged in [`parallel`](PairwiseIntersections::parallel)
    /// the midpoint is undefined; the first ray's origin is stored as a
    /// placeholder.
    pub midpoints: PointArray<R>,
    /// Distance between the two closest points of each pair.
    pub distances: DVector<R>,
    /// Degenerate-geometry flags: `true` where the pair's rays are parallel
    /// and no unique closest-point pair exists.
    pub parallel: Vec<bool>,
}

impl<R: RealField + Copy> PairwiseIntersections<R> {
    /// Whether any pair was degenerate (parallel rays).
    pub fn any_parallel(&self) -> bool {
        self.parallel.iter().any(|&p| p)
    }
}

/// Closest-point intersection of two ray batches, paired by index.
///
/// Ray `i` of `first` is intersected with ray `i` of `second` (never
/// all-pairs); the two sets must hold the same number of rays. For each pair
/// the closest points on the two skew lines are found by solving the 2×2
/// system of the standard two-line algorithm; the result holds their midpoint
/// and separation distance.
///
/// A parallel pair has no unique closest-point pair. Rather than aborting the
/// batch, the pair is flagged in
/// [`parallel`](PairwiseIntersections::parallel), its distance falls back to
/// the perpendicular distance from the first ray's origin to the second line,
/// and its midpoint slot holds the first ray's origin as a placeholder.
/// Callers must check [`any_parallel`](PairwiseIntersections::any_parallel)
/// (or the flags) before trusting midpoints.
pub fn intersect_lines<R: RealField + Copy>(
    first: &LineSet<R>,
    second: &LineSet<R>,
) -> Result<PairwiseIntersections<R>, Error> {
    if first.len() != second.len() {
        return Err(Error::ShapeMismatch {
            left: first.len(),
            right: second.len(),
        });
    }

    let n = first.len();
    let d1s = first.directions();
    let d2s = second.directions();

    let mut midpoints = PointArray::zeros(n);
    let mut distances = DVector::zeros(n);
    let mut parallel = vec![false; n];

    let two: R = nalgebra::convert(2.0);
    // Directions are unit length, so the denominator a*c - b^2 lives in
    // [0, 1] and vanishes exactly for parallel rays.
    let parallel_tol = R::default_epsilon().sqrt();

    for (i, r1o, r1d, r2o, r2d) in izip!(
        0..n,
        first.starts().row_iter(),
        d1s.row_iter(),
        second.starts().row_iter(),
        d2s.row_iter()
    ) {
        let o1 = r1o.transpose();
        let o2 = r2o.transpose();
        let d1: Vector3<R> = r1d.transpose();
        let d2: Vector3<R> = r2d.transpose();

        let w0 = o1 - o2;
        let a = d1.dot(&d1);
        let b = d1.dot(&d2);
        let c = d2.dot(&d2);
        let d = d1.dot(&w0);
        let e = d2.dot(&w0);
        let denom = a * c - b * b;

        if denom.abs() <= parallel_tol {
            parallel[i] = true;
            distances[i] = w0.cross(&d2).norm();
            for j in 0..3 {
                midpoints[(i, j)] = o1[j];
            }
            continue;
        }

        let s = (b * e - c * d) / denom;
        let t = (a * e - b * d) / denom;
        let p1 = o1 + d1 * s;
        let p2 = o2 + d2 * t;

        distances[i] = (p1 - p2).norm();
        let mid = (p1 + p2) / two;
        for j in 0..3 {
            midpoints[(i, j)] = mid[j];
        }
    }

    Ok(PairwiseIntersections {
        midpoints,
        distances,
        parallel,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_ray(start: [f64; 3], end: [f64; 3]) -> LineSet<f64> {
        LineSet::from_start_end(
            PointArray::from_row_slice(&start),
            PointArray::from_row_slice(&end),
        )
        .unwrap()
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let one = single_ray([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let two = LineSet::from_start_end(
            PointArray::from_row_slice(&[
                0.0, 0.0, 0.0, //
                0.0, 1.0, 0.0,
            ]),
            PointArray::from_row_slice(&[
                1.0, 0.0, 0.0, //
                0.0, 2.0, 0.0,
            ]),
        )
        .unwrap();
        assert_eq!(
            intersect_lines(&one, &two),
            Err(Error::ShapeMismatch { left: 1, right: 2 })
        );
    }

    #[test]
    fn truly_intersecting_rays_meet_at_their_common_point() {
        // Both rays pass through (1,1,1) from different origins.
        let l1 = single_ray([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let l2 = single_ray([2.0, 0.0, 1.0], [1.0, 1.0, 1.0]);

        let result = intersect_lines(&l1, &l2).unwrap();
        assert!(!result.any_parallel());
        approx::assert_abs_diff_eq!(result.distances[0], 0.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(
            Vector3::new(
                result.midpoints[(0, 0)],
                result.midpoints[(0, 1)],
                result.midpoints[(0, 2)]
            ),
            Vector3::new(1.0, 1.0, 1.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn skew_rays_report_their_separation() {
        // Ray 1 along +X at z=0; ray 2 along +Y at z=3, crossing above x=y=0.
        let l1 = single_ray([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let l2 = single_ray([0.0, -5.0, 3.0], [0.0, -4.0, 3.0]);

        let result = intersect_lines(&l1, &l2).unwrap();
        approx::assert_abs_diff_eq!(result.distances[0], 3.0, epsilon = 1e-12);
        // Closest points are (0,0,0) and (0,0,3); midpoint between them.
        approx::assert_abs_diff_eq!(result.midpoints[(0, 0)], 0.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(result.midpoints[(0, 1)], 0.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(result.midpoints[(0, 2)], 1.5, epsilon = 1e-12);
    }

    #[test]
    fn parallel_pair_is_flagged_not_solved() {
        let l1 = single_ray([0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        let l2 = single_ray([0.0, 2.0, 0.0], [3.0, 2.0, 0.0]);

        let result = intersect_lines(&l1, &l2).unwrap();
        assert_eq!(result.parallel, vec![true]);
        assert!(result.any_parallel());
        // Fallback distance is the perpendicular line separation.
        approx::assert_abs_diff_eq!(result.distances[0], 2.0, epsilon = 1e-12);
        // Midpoint placeholder is the first ray's origin.
        approx::assert_abs_diff_eq!(result.midpoints[(0, 0)], 0.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(result.midpoints[(0, 1)], 0.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(result.midpoints[(0, 2)], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn one_bad_pair_does_not_abort_the_batch() {
        let firsts = LineSet::from_start_end(
            PointArray::from_row_slice(&[
                0.0, 0.0, 0.0, // meets its partner at (1,1,1)
                0.0, 0.0, 0.0, // parallel to its partner
            ]),
            PointArray::from_row_slice(&[
                1.0, 1.0, 1.0, //
                1.0, 0.0, 0.0,
            ]),
        )
        .unwrap();
        let seconds = LineSet::from_start_end(
            PointArray::from_row_slice(&[
                2.0, 0.0, 1.0, //
                0.0, 1.0, 0.0,
            ]),
            PointArray::from_row_slice(&[
                1.0, 1.0, 1.0, //
                1.0, 1.0, 0.0,
            ]),
        )
        .unwrap();

        let result = intersect_lines(&firsts, &seconds).unwrap();
        assert_eq!(result.parallel, vec![false, true]);
        approx::assert_abs_diff_eq!(result.distances[0], 0.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(result.midpoints[(0, 1)], 1.0, epsilon = 1e-9);
        approx::assert_abs_diff_eq!(result.distances[1], 1.0, epsilon = 1e-12);
    }
}
