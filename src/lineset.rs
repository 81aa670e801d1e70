use nalgebra::{convert, DVector, Dyn, OMatrix, RealField, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::{Error, PluckerArray, PointArray, RigidTransform};

/// An ordered batch of N rays/segments.
///
/// Each ray is stored as a start (origin) point and an end point; the
/// direction of ray `i` is `ends[i] - starts[i]` by construction, so the two
/// representations can never drift apart. A zero-length direction is rejected
/// at construction and by every setter, never silently normalized.
///
/// The Plücker view ([`plucker`](LineSet::plucker) /
/// [`from_plucker`](LineSet::from_plucker)) is derived, not stored.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct LineSet<R: RealField + Copy> {
    starts: PointArray<R>,
    ends: PointArray<R>,
}

impl<R: RealField + Copy> LineSet<R> {
    /// Build a line set from per-ray start and end points.
    ///
    /// Fails if the two arrays have different row counts, or if any ray has
    /// coincident start and end points (zero-length direction).
    pub fn from_start_end(starts: PointArray<R>, ends: PointArray<R>) -> Result<Self, Error> {
        if starts.nrows() != ends.nrows() {
            return Err(Error::ShapeMismatch {
                left: starts.nrows(),
                right: ends.nrows(),
            });
        }
        for i in 0..starts.nrows() {
            let d = row3(&ends, i) - row3(&starts, i);
            if d.norm_squared() == R::zero() {
                return Err(Error::DegenerateDirection { index: i });
            }
        }
        Ok(Self { starts, ends })
    }

    /// Build a line set from Plücker coordinates, one `(direction | moment)`
    /// row per line.
    ///
    /// Each row must satisfy `‖d‖ > 0` and the orthogonality constraint
    /// `d · m = 0` (up to a scaled tolerance).
    ///
    /// A Plücker pair determines a line but not a point on it, so the origin
    /// is reconstructed as the **point of the line closest to the coordinate
    /// origin**, `o = d × m / ‖d‖²`. The round trip through
    /// [`plucker`](LineSet::plucker) therefore recovers the original origin
    /// only when it already was the closest point; for any other origin only
    /// the line itself (and so the direction) survives.
    pub fn from_plucker(coords: &PluckerArray<R>) -> Result<Self, Error> {
        let n = coords.nrows();
        let mut starts = PointArray::zeros(n);
        let mut ends = PointArray::zeros(n);
        let tol = R::default_epsilon().sqrt();
        for i in 0..n {
            let d = Vector3::new(coords[(i, 0)], coords[(i, 1)], coords[(i, 2)]);
            let m = Vector3::new(coords[(i, 3)], coords[(i, 4)], coords[(i, 5)]);
            let n2 = d.norm_squared();
            if n2 == R::zero() {
                return Err(Error::DegenerateDirection { index: i });
            }
            if d.dot(&m).abs() > tol * (d.norm() * m.norm() + R::one()) {
                return Err(Error::InvalidPlucker { index: i });
            }
            let origin = d.cross(&m) / n2;
            let end = origin + d;
            for j in 0..3 {
                starts[(i, j)] = origin[j];
                ends[(i, j)] = end[j];
            }
        }
        Ok(Self { starts, ends })
    }

    /// Internal constructor for producers that guarantee validity.
    pub(crate) fn new_unchecked(starts: PointArray<R>, ends: PointArray<R>) -> Self {
        Self { starts, ends }
    }

    /// Number of rays in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.starts.nrows()
    }

    /// Whether the set holds no rays.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.starts.nrows() == 0
    }

    /// Per-ray start (origin) points.
    #[inline]
    pub fn starts(&self) -> &PointArray<R> {
        &self.starts
    }

    /// Per-ray end points.
    #[inline]
    pub fn ends(&self) -> &PointArray<R> {
        &self.ends
    }

    /// Row-wise normalized directions, `(end - start) / ‖end - start‖`.
    ///
    /// Infallible: zero-length directions were rejected at construction.
    pub fn directions(&self) -> PointArray<R> {
        let mut result = PointArray::zeros(self.len());
        for i in 0..self.len() {
            let d = self.raw_direction(i);
            let unit = d / d.norm();
            for j in 0..3 {
                result[(i, j)] = unit[j];
            }
        }
        result
    }

    /// Rewrite each ray as `end = start + direction`, preserving origins.
    ///
    /// The supplied directions are used as-is (not normalized). Fails on a
    /// row-count mismatch or a zero-length row.
    pub fn set_directions(&mut self, directions: &PointArray<R>) -> Result<(), Error> {
        if directions.nrows() != self.len() {
            return Err(Error::ShapeMismatch {
                left: self.len(),
                right: directions.nrows(),
            });
        }
        for i in 0..directions.nrows() {
            if row3(directions, i).norm_squared() == R::zero() {
                return Err(Error::DegenerateDirection { index: i });
            }
        }
        self.ends = &self.starts + directions;
        Ok(())
    }

    /// Plücker coordinates, one row per line as `(d̂ | m)` with unit
    /// direction `d̂` and moment `m = o × d̂`.
    ///
    /// `m` equals `o × (o + d̂)` since `o × o = 0`; the invariant
    /// `d̂ · m = 0` holds for every row by construction.
    pub fn plucker(&self) -> PluckerArray<R> {
        let dirs = self.directions();
        let mut result = PluckerArray::zeros(self.len());
        for i in 0..self.len() {
            let d = row3(&dirs, i);
            let o = row3(&self.starts, i);
            let m = o.cross(&d);
            for j in 0..3 {
                result[(i, j)] = d[j];
                result[(i, j + 3)] = m[j];
            }
        }
        result
    }

    /// Angle in degrees between each ray direction and the world Z axis.
    ///
    /// The dot product is clamped to `[-1, 1]` so floating-point drift cannot
    /// push `acos` outside its domain.
    pub fn angle_to_z_axis(&self) -> DVector<R> {
        let dirs = self.directions();
        let one = R::one();
        DVector::from_fn(self.len(), |i, _| {
            let cos = dirs[(i, 2)].clamp(-one, one);
            radians_to_degrees(cos.acos())
        })
    }

    /// Apply a rigid transform to both endpoint arrays, returning a new set.
    ///
    /// Known limitation: this transforms the stored endpoints, not the
    /// Plücker pair itself. The dual-space (adjoint) transform of Plücker
    /// coordinates is not implemented; for rays represented by endpoints the
    /// two agree, but the moment of an arbitrary rescaled Plücker row would
    /// not survive this path unchanged.
    pub fn transform(&self, transform: &RigidTransform<R>) -> Self {
        Self {
            starts: transform.apply(&self.starts),
            ends: transform.apply(&self.ends),
        }
    }

    /// Slide each origin along its own direction until `origin.z == 0`,
    /// returning a new set.
    ///
    /// A ray parallel to the z=0 plane (`direction.z ≈ 0`) cannot reach it
    /// and fails loudly with its row index rather than dividing by zero.
    pub fn normalize_to_plane(&self) -> Result<Self, Error> {
        let mut starts = self.starts.clone();
        let mut ends = self.ends.clone();
        for i in 0..self.len() {
            let o = row3(&self.starts, i);
            let d = self.raw_direction(i);
            if d[2].abs() <= R::default_epsilon() {
                return Err(Error::ParallelToPlane { index: i });
            }
            let t = -o[2] / d[2];
            let origin = o + d * t;
            let end = origin + d;
            for j in 0..3 {
                starts[(i, j)] = origin[j];
                ends[(i, j)] = end[j];
            }
        }
        Ok(Self { starts, ends })
    }

    /// Perpendicular distance from every ray to every query point.
    ///
    /// Returns a rays × points matrix; entry `(i, j)` is the distance from
    /// ray `i` to point `j`, computed as `‖(p - o) × d̂‖`.
    pub fn distance_to_points(&self, points: &PointArray<R>) -> OMatrix<R, Dyn, Dyn> {
        let dirs = self.directions();
        let mut result = OMatrix::<R, Dyn, Dyn>::zeros(self.len(), points.nrows());
        for i in 0..self.len() {
            let o = row3(&self.starts, i);
            let d = row3(&dirs, i);
            for j in 0..points.nrows() {
                let w = row3(points, j) - o;
                result[(i, j)] = w.cross(&d).norm();
            }
        }
        result
    }

    /// Euclidean length of each segment, `‖end - start‖`.
    pub fn lengths(&self) -> DVector<R> {
        DVector::from_fn(self.len(), |i, _| self.raw_direction(i).norm())
    }

    /// Index of the ray minimizing the **mean** perpendicular distance to all
    /// supplied points.
    ///
    /// Ties resolve to the lowest index. An empty ray set or point set is a
    /// structural error.
    pub fn nearest_ray_to(&self, points: &PointArray<R>) -> Result<usize, Error> {
        if self.is_empty() {
            return Err(Error::InvalidParameter("nearest_ray_to on an empty line set"));
        }
        if points.nrows() == 0 {
            return Err(Error::InvalidParameter("nearest_ray_to with no query points"));
        }
        let distances = self.distance_to_points(points);
        let npts: R = convert(points.nrows() as f64);
        let mut best = 0;
        let mut best_mean = distances.row(0).sum() / npts;
        for i in 1..self.len() {
            let mean = distances.row(i).sum() / npts;
            if mean < best_mean {
                best = i;
                best_mean = mean;
            }
        }
        Ok(best)
    }

    /// Angle in radians between the directions of two single-ray sets.
    pub fn angle_between(&self, other: &Self) -> Result<R, Error> {
        if self.len() != 1 {
            return Err(Error::SingleRayExpected { len: self.len() });
        }
        if other.len() != 1 {
            return Err(Error::SingleRayExpected { len: other.len() });
        }
        let d1 = row3(&self.directions(), 0);
        let d2 = row3(&other.directions(), 0);
        let one = R::one();
        Ok(d1.dot(&d2).clamp(-one, one).acos())
    }

    /// Angle in degrees between the directions of two single-ray sets.
    pub fn angle_between_degrees(&self, other: &Self) -> Result<R, Error> {
        Ok(radians_to_degrees(self.angle_between(other)?))
    }

    /// Best-fit line minimizing total squared orthogonal distance.
    ///
    /// Contract stub: always returns [`Error::NotImplemented`]. Provided so
    /// callers depending on the fitting contract fail explicitly instead of
    /// receiving a default line.
    pub fn fit_line(_points: &PointArray<R>) -> Result<Self, Error> {
        Err(Error::NotImplemented("fit_line"))
    }

    /// RANSAC line fit returning the best consensus line under `threshold`.
    ///
    /// Contract stub: always returns [`Error::NotImplemented`].
    pub fn fit_line_ransac(_points: &PointArray<R>, _threshold: R) -> Result<Self, Error> {
        Err(Error::NotImplemented("fit_line_ransac"))
    }

    /// Unnormalized direction of ray `i`, `end - start`.
    #[inline]
    fn raw_direction(&self, i: usize) -> Vector3<R> {
        row3(&self.ends, i) - row3(&self.starts, i)
    }
}

#[inline]
fn row3<R: RealField + Copy>(m: &PointArray<R>, i: usize) -> Vector3<R> {
    Vector3::new(m[(i, 0)], m[(i, 1)], m[(i, 2)])
}

fn radians_to_degrees<R: RealField + Copy>(radians: R) -> R {
    let half_turn: R = convert(180.0);
    radians * half_turn / R::pi()
}
