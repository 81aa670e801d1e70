use nalgebra::{convert, Matrix3, RealField, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::{Error, LineSet, PointArray};

/// Pinhole camera intrinsics with radial distortion.
///
/// A mutable parameter bag: the constructor validates
/// `fx > 0, fy > 0, width > 0, height > 0`, after which the fields are public
/// for direct mutation. The two 3×3 matrix views
/// ([`k_matrix`](IntrinsicModel::k_matrix) /
/// [`k_matrix_transposed`](IntrinsicModel::k_matrix_transposed)) are exact
/// rearrangements of the same five scalars, derived on access and never
/// stored separately.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct IntrinsicModel<R: RealField + Copy> {
    /// Horizontal focal length in pixels.
    pub fx: R,
    /// Vertical focal length in pixels.
    pub fy: R,
    /// Horizontal principal-point coordinate in pixels.
    pub cx: R,
    /// Vertical principal-point coordinate in pixels.
    pub cy: R,
    /// Skew between the horizontal and vertical axes.
    pub skew: R,
    /// Sensor width in pixels.
    pub width: u32,
    /// Sensor height in pixels.
    pub height: u32,
    /// Physical size of one pixel (length units per pixel).
    pub pixel_size: R,
    /// Radial distortion coefficients `[k1, k2, k3]`.
    pub distortion: [R; 3],
    /// Free-form metadata tag.
    pub info: String,
}

impl<R: RealField + Copy> IntrinsicModel<R> {
    /// Create a model with zero skew, unit pixel size and no distortion.
    ///
    /// Fails with a structural-validation error unless `fx > 0`, `fy > 0`,
    /// `width > 0` and `height > 0`.
    pub fn new(fx: R, fy: R, cx: R, cy: R, width: u32, height: u32) -> Result<Self, Error> {
        if fx <= R::zero() || fy <= R::zero() {
            return Err(Error::InvalidParameter("focal length must be positive"));
        }
        if width == 0 || height == 0 {
            return Err(Error::InvalidParameter("image dimensions must be positive"));
        }
        Ok(Self {
            fx,
            fy,
            cx,
            cy,
            skew: R::zero(),
            width,
            height,
            pixel_size: R::one(),
            distortion: [R::zero(); 3],
            info: String::new(),
        })
    }

    /// The intrinsic matrix in row convention:
    /// `[[fx, s, cx], [0, fy, cy], [0, 0, 1]]`.
    pub fn k_matrix(&self) -> Matrix3<R> {
        let zero = R::zero();
        Matrix3::new(
            self.fx, self.skew, self.cx, //
            zero, self.fy, self.cy, //
            zero, zero, R::one(),
        )
    }

    /// The intrinsic matrix in column convention, the transpose of
    /// [`k_matrix`](IntrinsicModel::k_matrix).
    ///
    /// This is the layout used by the external JSON interchange format. It is
    /// produced by transposition of the same five scalars, never re-derived.
    pub fn k_matrix_transposed(&self) -> Matrix3<R> {
        self.k_matrix().transpose()
    }

    /// Focal lengths in physical units, `(fx · pixel_size, fy · pixel_size)`.
    pub fn focal_length_mm(&self) -> (R, R) {
        (self.fx * self.pixel_size, self.fy * self.pixel_size)
    }

    /// Field of view per axis in radians, `2 · atan(dim / (2 · f))`.
    pub fn perspective_angle(&self) -> (R, R) {
        let two: R = convert(2.0);
        let w: R = convert(self.width as f64);
        let h: R = convert(self.height as f64);
        (
            two * (w / (two * self.fx)).atan(),
            two * (h / (two * self.fy)).atan(),
        )
    }

    /// Solve the focal lengths for the given per-axis field of view
    /// (radians): `f = dim / (2 · tan(angle / 2))`.
    ///
    /// Angles must lie in `(0, π)` so the solved focal lengths stay positive.
    pub fn set_perspective_angle(&mut self, horizontal: R, vertical: R) -> Result<(), Error> {
        let two: R = convert(2.0);
        if horizontal <= R::zero()
            || vertical <= R::zero()
            || horizontal >= R::pi()
            || vertical >= R::pi()
        {
            return Err(Error::InvalidParameter(
                "perspective angle must lie in (0, pi)",
            ));
        }
        let w: R = convert(self.width as f64);
        let h: R = convert(self.height as f64);
        self.fx = w / (two * (horizontal / two).tan());
        self.fy = h / (two * (vertical / two).tan());
        Ok(())
    }

    /// Scale the model uniformly: `fx, fy, cx, cy` are multiplied by
    /// `factor`, `width` and `height` are scaled and rounded to the nearest
    /// pixel. `pixel_size` and distortion are unchanged.
    pub fn scale(&mut self, factor: f64) -> Result<(), Error> {
        if factor <= 0.0 {
            return Err(Error::InvalidParameter("scale factor must be positive"));
        }
        let f: R = convert(factor);
        self.fx *= f;
        self.fy *= f;
        self.cx *= f;
        self.cy *= f;
        self.width = (self.width as f64 * factor).round() as u32;
        self.height = (self.height as f64 * factor).round() as u32;
        Ok(())
    }

    /// One ray per pixel, all origins at the camera center `(0, 0, 0)`.
    ///
    /// Rays are emitted row-major: the ray for pixel `(u, v)` sits at index
    /// `v · width + u`. Pinned pixel convention: the ray passes through the
    /// integer lattice coordinate of the pixel, homogeneous `(u, v, 1)` - so
    /// with unit focal lengths and a zero principal point, pixel `(0, 0)`
    /// yields direction `(0, 0, 1)` exactly.
    ///
    /// Back-projection applies the analytic inverse of the intrinsic matrix,
    /// then the radial polynomial
    /// `scale = 1 + k1·r² + k2·r⁴ + k3·r⁶` with `r² = x² + y²` to the ideal
    /// ray - pinned as an *undistortion* of that ray, not a forward
    /// distortion of the pixel - and normalizes the result.
    pub fn generate_rays(&self) -> LineSet<R> {
        let n = self.width as usize * self.height as usize;
        let starts = PointArray::zeros(n);
        let mut ends = PointArray::zeros(n);

        let [k1, k2, k3] = self.distortion;
        let one = R::one();

        for v in 0..self.height {
            for u in 0..self.width {
                let i = v as usize * self.width as usize + u as usize;
                let uc: R = convert(u as f64);
                let vc: R = convert(v as f64);

                // Analytic inverse of the K matrix.
                let y = (vc - self.cy) / self.fy;
                let x = (uc - self.skew * y - self.cx) / self.fx;

                let r2 = x * x + y * y;
                let radial = one + k1 * r2 + k2 * r2 * r2 + k3 * r2 * r2 * r2;

                let dir = Vector3::new(x * radial, y * radial, one);
                let unit = dir / dir.norm();
                for j in 0..3 {
                    ends[(i, j)] = unit[j];
                }
            }
        }

        // The z component is always 1 before normalization, so every ray is
        // valid by construction.
        LineSet::new_unchecked(starts, ends)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> IntrinsicModel<f64> {
        let mut m = IntrinsicModel::new(100.0, 102.0, 321.0, 239.9, 640, 480).unwrap();
        m.skew = 0.1;
        m
    }

    #[test]
    fn constructor_validates_invariants() {
        assert!(matches!(
            IntrinsicModel::new(0.0, 1.0, 0.0, 0.0, 10, 10),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            IntrinsicModel::new(1.0, -2.0, 0.0, 0.0, 10, 10),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            IntrinsicModel::new(1.0, 1.0, 0.0, 0.0, 0, 10),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn matrix_views_are_transposes_of_the_same_scalars() {
        let m = model();
        let k = m.k_matrix();
        assert_eq!(k[(0, 0)], 100.0);
        assert_eq!(k[(0, 1)], 0.1);
        assert_eq!(k[(0, 2)], 321.0);
        assert_eq!(k[(1, 1)], 102.0);
        assert_eq!(k[(1, 2)], 239.9);
        assert_eq!(k[(2, 2)], 1.0);

        // Bit-exact rearrangement, no re-derivation.
        assert_eq!(m.k_matrix_transposed(), k.transpose());
        assert_eq!(m.k_matrix_transposed().transpose(), k);
    }

    #[test]
    fn focal_length_in_physical_units() {
        let mut m = model();
        m.pixel_size = 0.005;
        let (fx_mm, fy_mm) = m.focal_length_mm();
        approx::assert_abs_diff_eq!(fx_mm, 0.5, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(fy_mm, 0.51, epsilon = 1e-12);
    }

    #[test]
    fn perspective_angle_roundtrip() {
        let mut m = model();
        m.set_perspective_angle(1.2, 0.9).unwrap();
        let (h, v) = m.perspective_angle();
        approx::assert_abs_diff_eq!(h, 1.2, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(v, 0.9, epsilon = 1e-12);
        assert!(m.fx > 0.0 && m.fy > 0.0);

        assert!(matches!(
            m.set_perspective_angle(0.0, 1.0),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn scale_literals() {
        let mut m = model();
        m.pixel_size = 0.005;
        m.scale(0.5).unwrap();
        approx::assert_abs_diff_eq!(m.fx, 50.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(m.fy, 51.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(m.cx, 160.5, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(m.cy, 119.95, epsilon = 1e-12);
        assert_eq!(m.width, 320);
        assert_eq!(m.height, 240);
        // Pixel size is untouched.
        approx::assert_abs_diff_eq!(m.pixel_size, 0.005, epsilon = 1e-15);

        assert!(matches!(m.scale(-1.0), Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn pixel_zero_maps_to_optical_axis_for_unit_camera() {
        // fx = fy = 1, cx = cy = 0, no distortion: the pinned pixel
        // convention sends pixel (0,0) straight down the optical axis.
        let m = IntrinsicModel::<f64>::new(1.0, 1.0, 0.0, 0.0, 2, 2).unwrap();
        let rays = m.generate_rays();

        approx::assert_abs_diff_eq!(rays.ends()[(0, 0)], 0.0, epsilon = 1e-15);
        approx::assert_abs_diff_eq!(rays.ends()[(0, 1)], 0.0, epsilon = 1e-15);
        approx::assert_abs_diff_eq!(rays.ends()[(0, 2)], 1.0, epsilon = 1e-15);
    }

    #[test]
    fn rays_are_row_major_with_shared_zero_origin() {
        let m = IntrinsicModel::<f64>::new(2.0, 2.0, 1.0, 1.0, 4, 3).unwrap();
        let rays = m.generate_rays();
        assert_eq!(rays.len(), 12);

        // All origins at the camera center.
        approx::assert_abs_diff_eq!(
            *rays.starts(),
            PointArray::zeros(12),
            epsilon = 1e-15
        );

        // Ray for pixel (u=3, v=1) sits at index 1*4 + 3; its unnormalized
        // direction is ((3-1)/2, (1-1)/2, 1) = (1, 0, 1).
        let dirs = rays.directions();
        let i = 1 * 4 + 3;
        let s = std::f64::consts::FRAC_1_SQRT_2;
        approx::assert_abs_diff_eq!(dirs[(i, 0)], s, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(dirs[(i, 1)], 0.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(dirs[(i, 2)], s, epsilon = 1e-12);
    }

    #[test]
    fn radial_polynomial_rescales_the_ideal_ray() {
        let mut m = IntrinsicModel::<f64>::new(1.0, 1.0, 0.0, 0.0, 2, 2).unwrap();
        m.distortion = [0.1, 0.01, 0.001];
        let rays = m.generate_rays();

        // Pixel (1,1): ideal ray (1,1,1), r^2 = 2.
        let r2 = 2.0;
        let radial = 1.0 + 0.1 * r2 + 0.01 * r2 * r2 + 0.001 * r2 * r2 * r2;
        let expected = Vector3::new(radial, radial, 1.0).normalize();

        let dirs = rays.directions();
        let i = 1 * 2 + 1;
        approx::assert_abs_diff_eq!(dirs[(i, 0)], expected[0], epsilon = 1e-12);
        approx::assert_abs_diff_eq!(dirs[(i, 1)], expected[1], epsilon = 1e-12);
        approx::assert_abs_diff_eq!(dirs[(i, 2)], expected[2], epsilon = 1e-12);
    }

    #[test]
    fn skew_feeds_the_analytic_inverse() {
        let mut m = IntrinsicModel::<f64>::new(2.0, 4.0, 0.0, 0.0, 4, 4).unwrap();
        m.skew = 0.5;
        let rays = m.generate_rays();

        // Pixel (u=3, v=2): y = 2/4 = 0.5, x = (3 - 0.5*0.5)/2 = 1.375.
        let dirs = rays.directions();
        let expected = Vector3::new(1.375, 0.5, 1.0).normalize();
        let i = 2 * 4 + 3;
        approx::assert_abs_diff_eq!(dirs[(i, 0)], expected[0], epsilon = 1e-12);
        approx::assert_abs_diff_eq!(dirs[(i, 1)], expected[1], epsilon = 1e-12);
        approx::assert_abs_diff_eq!(dirs[(i, 2)], expected[2], epsilon = 1e-12);
    }

    #[test]
    #[cfg(feature = "serde-serialize")]
    fn test_serde() {
        let mut expected = model();
        expected.distortion = [0.1, -0.05, 0.001];
        expected.info = "left camera".to_string();

        let buf = serde_json::to_string(&expected).unwrap();
        let actual: IntrinsicModel<f64> = serde_json::from_str(&buf).unwrap();
        assert!(expected == actual);
        assert!(actual.fx == 100.0);
        assert!(actual.info == "left camera");
    }
}
