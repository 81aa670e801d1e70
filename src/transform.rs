use nalgebra::{convert, Matrix3, Matrix4, Point3, RealField, Rotation3, UnitQuaternion, Vector3, Vector4};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::PointArray;

/// A rigid-body transform stored as a 4×4 homogeneous matrix
/// `H = [[R, t], [0, 1]]`.
///
/// The matrix is the single canonical representation of the transform; the
/// rotation, translation, Euler-angle and quaternion accessors are all views
/// over it, so writing through any one of them is immediately visible through
/// the others.
///
/// The rotation block must be a proper rotation (orthonormal, determinant +1).
/// [`set_rotation`](RigidTransform::set_rotation) does not validate or
/// re-orthonormalize its argument; supplying a matrix with reflection or scale
/// is a caller contract violation.
///
/// A two-slot provenance record carries origin/destination frame labels
/// through composition and inversion, and a free-form units string (default
/// `"length in millimeters"`) is carried but never enforced numerically.
///
/// `Clone` produces an independent deep copy.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct RigidTransform<R: RealField + Copy> {
    matrix: Matrix4<R>,
    frames: [String; 2],
    units: String,
}

impl<R: RealField + Copy> Default for RigidTransform<R> {
    fn default() -> Self {
        Self::identity()
    }
}

impl<R: RealField + Copy> RigidTransform<R> {
    /// Create the identity transform with empty frame labels.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
            frames: [String::new(), String::new()],
            units: "length in millimeters".to_string(),
        }
    }

    /// Create a transform from a rotation matrix and a translation vector.
    ///
    /// The rotation matrix must be a proper rotation; this is not checked.
    pub fn from_parts(rotation: Matrix3<R>, translation: Vector3<R>) -> Self {
        let mut result = Self::identity();
        result.set_rotation(rotation);
        result.set_translation(translation);
        result
    }

    /// The full 4×4 homogeneous matrix.
    #[inline]
    pub fn matrix(&self) -> &Matrix4<R> {
        &self.matrix
    }

    /// The translation component `t`.
    #[inline]
    pub fn translation(&self) -> Vector3<R> {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Replace the translation component, leaving the rotation untouched.
    pub fn set_translation(&mut self, translation: Vector3<R>) {
        self.matrix
            .fixed_view_mut::<3, 1>(0, 3)
            .copy_from(&translation);
    }

    /// The 3×3 rotation block `R`.
    #[inline]
    pub fn rotation(&self) -> Matrix3<R> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Replace the rotation block, leaving the translation untouched.
    ///
    /// Caller contract: `rotation` must be orthonormal with determinant +1.
    /// No validation is performed.
    pub fn set_rotation(&mut self, rotation: Matrix3<R>) {
        self.matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation);
    }

    /// Euler angles in radians, XYZ intrinsic convention.
    ///
    /// The rotation decomposes as `R = Rx(a) · Ry(b) · Rz(c)`; the returned
    /// vector is `(a, b, c)`.
    pub fn euler_radians(&self) -> Vector3<R> {
        let r = self.rotation();
        let one = R::one();
        // Clamp against floating-point drift pushing the argument outside
        // the asin domain.
        let sb = r[(0, 2)].clamp(-one, one);
        let b = sb.asin();
        let a = (-r[(1, 2)]).atan2(r[(2, 2)]);
        let c = (-r[(0, 1)]).atan2(r[(0, 0)]);
        Vector3::new(a, b, c)
    }

    /// Set the rotation from Euler angles in radians, XYZ intrinsic convention.
    pub fn set_euler_radians(&mut self, angles: Vector3<R>) {
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), angles[0]);
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), angles[1]);
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), angles[2]);
        self.set_rotation((rx * ry * rz).into_inner());
    }

    /// Euler angles in degrees, XYZ intrinsic convention.
    pub fn euler_degrees(&self) -> Vector3<R> {
        self.euler_radians() * radians_to_degrees::<R>()
    }

    /// Set the rotation from Euler angles in degrees, XYZ intrinsic convention.
    pub fn set_euler_degrees(&mut self, angles: Vector3<R>) {
        self.set_euler_radians(angles / radians_to_degrees::<R>());
    }

    /// The rotation as a unit quaternion, component order `[x, y, z, w]`.
    pub fn quaternion(&self) -> Vector4<R> {
        let rot = Rotation3::from_matrix_unchecked(self.rotation());
        UnitQuaternion::from_rotation_matrix(&rot).into_inner().coords
    }

    /// Set the rotation from a quaternion with component order `[x, y, z, w]`.
    ///
    /// The quaternion is normalized before use.
    pub fn set_quaternion(&mut self, quaternion: Vector4<R>) {
        let q = UnitQuaternion::new_normalize(nalgebra::Quaternion::from_vector(quaternion));
        self.set_rotation(q.to_rotation_matrix().into_inner());
    }

    /// The provenance record as `(origin label, destination label)`.
    #[inline]
    pub fn frames(&self) -> (&str, &str) {
        (&self.frames[0], &self.frames[1])
    }

    /// Set the provenance record.
    pub fn set_frames(&mut self, origin: &str, destination: &str) {
        self.frames = [origin.to_string(), destination.to_string()];
    }

    /// The units string. Carried for traceability, never enforced.
    #[inline]
    pub fn units(&self) -> &str {
        &self.units
    }

    /// Set the units string.
    pub fn set_units(&mut self, units: &str) {
        self.units = units.to_string();
    }

    /// Map a batch of points through the transform.
    ///
    /// A homogeneous coordinate is appended internally and the result is
    /// de-homogenized. The input is not modified.
    pub fn apply(&self, points: &PointArray<R>) -> PointArray<R> {
        let mut result = PointArray::zeros(points.nrows());
        for i in 0..points.nrows() {
            let p = Point3::new(points[(i, 0)], points[(i, 1)], points[(i, 2)]);
            let q = self.apply_point(&p);
            for j in 0..3 {
                result[(i, j)] = q[j];
            }
        }
        result
    }

    /// Map a single point through the transform.
    pub fn apply_point(&self, point: &Point3<R>) -> Point3<R> {
        let h = self.matrix * point.to_homogeneous();
        Point3::new(h[0] / h[3], h[1] / h[3], h[2] / h[3])
    }

    /// The algebraic inverse `H' = [[Rᵗ, −Rᵗt], [0, 1]]`.
    ///
    /// The provenance record is reversed: the inverse maps destination back
    /// to origin.
    pub fn inverse(&self) -> Self {
        let rt = self.rotation().transpose();
        let t = -(rt * self.translation());
        let mut result = Self::from_parts(rt, t);
        result.frames = [self.frames[1].clone(), self.frames[0].clone()];
        result.units = self.units.clone();
        result
    }

    /// Chain two transforms: `self` applies first, then `other`.
    ///
    /// The pinned order convention is
    /// `a.compose(&b).apply_point(&p) == b.apply_point(&a.apply_point(&p))`,
    /// which makes the matrix of the result `other.H * self.H`. The resulting
    /// provenance record is `(self origin, other destination)`. Neither
    /// operand is modified.
    pub fn compose(&self, other: &Self) -> Self {
        Self {
            matrix: other.matrix * self.matrix,
            frames: [self.frames[0].clone(), other.frames[1].clone()],
            units: self.units.clone(),
        }
    }
}

fn radians_to_degrees<R: RealField + Copy>() -> R {
    let half_turn: R = convert(180.0);
    half_turn / R::pi()
}
