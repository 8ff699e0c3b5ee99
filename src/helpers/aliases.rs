use nalgebra::Vector3;

use crate::geometry::traits::RealNumber;

/// Generic 3-component vector / point, parameterized over the mesh's scalar type.
pub type Vec3<T> = Vector3<T>;
pub type Vec3i = Vector3<isize>;
pub type Vec3f = Vector3<f32>;
pub type Vec3d = Vector3<f64>;

/// Narrows a generic vector to the `f64` values the numerical core operates on.
#[inline]
pub fn to_vec3d<T: RealNumber>(v: &Vec3<T>) -> Vec3d {
    Vec3d::new(
        v.x.to_f64().unwrap_or(0.0),
        v.y.to_f64().unwrap_or(0.0),
        v.z.to_f64().unwrap_or(0.0),
    )
}

/// Widens an `f64` vector back to the mesh's scalar type.
#[inline]
pub fn from_vec3d<T: RealNumber>(v: &Vec3d) -> Vec3<T> {
    Vec3::new(
        T::from_f64(v.x).unwrap_or_else(T::zero),
        T::from_f64(v.y).unwrap_or_else(T::zero),
        T::from_f64(v.z).unwrap_or_else(T::zero),
    )
}
