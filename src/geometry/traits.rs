use nalgebra::RealField;
use num_traits::{Float, FromPrimitive, ToPrimitive};

/// Scalar type the mesh and the deformation core are generic over (`f32` or `f64`).
///
/// The numerically heavy parts of the solver (SVD, sparse factorization) always run
/// in `f64` regardless of this bound; `RealNumber` only governs how vertex positions
/// are stored and returned to the caller.
pub trait RealNumber: RealField + Copy + Float + ToPrimitive + FromPrimitive {}

impl<T> RealNumber for T where T: RealField + Copy + Float + ToPrimitive + FromPrimitive {}
