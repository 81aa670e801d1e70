#![deny(rust_2018_idioms, unsafe_code, missing_docs)]
#![cfg_attr(not(doctest), doc = include_str!("../README.md"))]

//! # Examples
//!
//! ## Example - generating rays and moving them into the world frame
//!
//! ```
//! use line_geom::{IntrinsicModel, RigidTransform};
//! use nalgebra::Vector3;
//!
//! // A small camera: 4x3 pixels, unit focal length, principal point at zero.
//! let mut camera = IntrinsicModel::<f64>::new(1.0, 1.0, 0.0, 0.0, 4, 3).unwrap();
//! camera.info = "toy camera".to_string();
//!
//! // One ray per pixel, all origins at the camera center.
//! let rays = camera.generate_rays();
//! assert_eq!(rays.len(), 12);
//!
//! // Move the rays into the world frame.
//! let mut cam_to_world = RigidTransform::identity();
//! cam_to_world.set_translation(Vector3::new(0.0, 0.0, -100.0));
//! cam_to_world.set_frames("camera", "world");
//! let world_rays = rays.transform(&cam_to_world);
//! assert_eq!(world_rays.len(), 12);
//! ```
//!
//! ## Example - Plücker round trip
//!
//! ```
//! use line_geom::{LineSet, PointArray};
//!
//! // A ray whose origin is already its closest point to the coordinate
//! // origin, so the Plücker round trip recovers it exactly.
//! let lines = LineSet::<f64>::from_start_end(
//!     PointArray::from_row_slice(&[0.0, 2.0, 0.0]),
//!     PointArray::from_row_slice(&[1.0, 2.0, 0.0]),
//! )
//! .unwrap();
//!
//! let restored = LineSet::from_plucker(&lines.plucker()).unwrap();
//! approx::assert_abs_diff_eq!(restored.starts(), lines.starts(), epsilon = 1e-12);
//! ```

use nalgebra::{Dyn, OMatrix, U3, U6};

mod transform;
pub use transform::RigidTransform;

mod lineset;
pub use lineset::LineSet;

mod intersection;
pub use intersection::{intersect_lines, PairwiseIntersections};

mod intrinsics;
pub use intrinsics::IntrinsicModel;

/// N×3 array of 3D points or vectors, one row per entry.
pub type PointArray<R> = OMatrix<R, Dyn, U3>;

/// N×6 array of Plücker coordinates, one line per row as `(direction | moment)`.
pub type PluckerArray<R> = OMatrix<R, Dyn, U6>;

/// All possible errors.
///
/// Structural-validation errors ([`Error::ShapeMismatch`],
/// [`Error::SingleRayExpected`], [`Error::InvalidParameter`]) indicate a
/// caller contract violation and are raised immediately.
/// Degenerate-geometry errors ([`Error::DegenerateDirection`],
/// [`Error::InvalidPlucker`], [`Error::ParallelToPlane`]) name the offending
/// row. [`Error::NotImplemented`] marks contract stubs so an unimplemented
/// routine can never be mistaken for a valid default result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Two batch inputs have different row counts.
    #[error("shape mismatch: {left} rows vs {right} rows")]
    ShapeMismatch {
        /// Row count of the first operand.
        left: usize,
        /// Row count of the second operand.
        right: usize,
    },
    /// A parameter violates a documented invariant.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
    /// A ray has a zero-length direction.
    #[error("zero-length direction in row {index}")]
    DegenerateDirection {
        /// Index of the offending row.
        index: usize,
    },
    /// A Plücker row violates the direction-moment orthogonality constraint.
    #[error("direction and moment are not orthogonal in row {index}")]
    InvalidPlucker {
        /// Index of the offending row.
        index: usize,
    },
    /// A ray is parallel to the z=0 plane and cannot be normalized onto it.
    #[error("ray {index} is parallel to the z=0 plane")]
    ParallelToPlane {
        /// Index of the offending row.
        index: usize,
    },
    /// An operation defined for single rays was called on a larger set.
    #[error("expected exactly one ray, got {len}")]
    SingleRayExpected {
        /// Actual number of rays supplied.
        len: usize,
    },
    /// The routine is a documented contract stub.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}
