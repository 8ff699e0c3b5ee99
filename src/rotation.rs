use nalgebra as na;

use crate::{
    config::ArapConfig,
    diagnostics::Diagnostics,
    geometry::traits::RealNumber,
    helpers::aliases::{to_vec3d, Vec3},
    mesh::Mesh,
    weights::CotangentWeights,
};

/// Per-vertex rotation matrices, stored as a contiguous `N * 9` buffer rather than a
/// `Vec` of heap-allocated 3x3 objects, so the local step touches one allocation.
#[derive(Debug, Clone)]
pub struct RotationBuffer {
    data: Vec<f64>,
}

impl RotationBuffer {
    pub fn identity(vertex_count: usize) -> Self {
        let mut data = vec![0.0; vertex_count * 9];
        for i in 0..vertex_count {
            let base = i * 9;
            data[base] = 1.0;
            data[base + 4] = 1.0;
            data[base + 8] = 1.0;
        }
        Self { data }
    }

    #[inline]
    pub fn get(&self, vertex: usize) -> na::Matrix3<f64> {
        na::Matrix3::from_column_slice(&self.data[vertex * 9..vertex * 9 + 9])
    }

    #[inline]
    pub fn set(&mut self, vertex: usize, rotation: &na::Matrix3<f64>) {
        self.data[vertex * 9..vertex * 9 + 9].copy_from_slice(rotation.as_slice());
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len() / 9
    }
}

/// Fits `R_i` for every vertex from the current iterate `v_cur` against rest-pose
/// geometry (§4.4): assemble the weighted covariance `S_i`, take its SVD, and
/// recover the closest proper rotation with a column-flip determinant correction.
///
/// Behind the `parallel` feature each vertex is independent of every other (its
/// covariance only reads `V_rest`, `v_cur`, and `W`), so the loop runs via `rayon`
/// into a scratch `Vec` collected back in index order — identical to the
/// sequential result, never a reduction race.
pub fn fit_rotations<T: RealNumber>(
    mesh: &Mesh<T>,
    weights: &CotangentWeights,
    v_cur: &[Vec3<T>],
    config: &ArapConfig,
    diagnostics: &mut Diagnostics,
    rotations: &mut RotationBuffer,
) {
    let n = mesh.vertex_count();

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        let fitted: Vec<(na::Matrix3<f64>, bool)> = (0..n)
            .into_par_iter()
            .map(|i| fit_one(mesh, weights, v_cur, config, i))
            .collect();

        for (i, (rotation, degenerate)) in fitted.into_iter().enumerate() {
            rotations.set(i, &rotation);
            if degenerate {
                diagnostics.record_degenerate_rotation(i);
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        for i in 0..n {
            let (rotation, degenerate) = fit_one(mesh, weights, v_cur, config, i);
            rotations.set(i, &rotation);
            if degenerate {
                diagnostics.record_degenerate_rotation(i);
            }
        }
    }
}

fn fit_one<T: RealNumber>(
    mesh: &Mesh<T>,
    weights: &CotangentWeights,
    v_cur: &[Vec3<T>],
    config: &ArapConfig,
    vertex: usize,
) -> (na::Matrix3<f64>, bool) {
    let rest_i = to_vec3d(&mesh.vertex_position(vertex));
    let cur_i = to_vec3d(&v_cur[vertex]);

    let mut covariance = na::Matrix3::<f64>::zeros();
    for &j in mesh.ring(vertex) {
        let w = weights.get(vertex, j);
        if w == 0.0 {
            continue;
        }

        let e_rest = rest_i - to_vec3d(&mesh.vertex_position(j));
        let e_cur = cur_i - to_vec3d(&v_cur[j]);
        covariance += w * (e_rest * e_cur.transpose());
    }

    fit_rotation_from_covariance(&covariance, config)
}

/// Recovers the closest proper rotation to `covariance` via SVD (§4.4, steps 3-5).
///
/// Returns the identity with `degenerate = true` when the smallest singular value
/// falls below `svd_degenerate_threshold` (colinear or isolated one-ring) or the
/// SVD itself fails to converge.
fn fit_rotation_from_covariance(covariance: &na::Matrix3<f64>, config: &ArapConfig) -> (na::Matrix3<f64>, bool) {
    let svd = covariance.svd_unordered(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return (na::Matrix3::identity(), true);
    };

    let singular_values = svd.singular_values;
    let mut min_index = 0;
    for axis in 1..3 {
        if singular_values[axis] < singular_values[min_index] {
            min_index = axis;
        }
    }

    if singular_values[min_index] < config.svd_degenerate_threshold() {
        return (na::Matrix3::identity(), true);
    }

    let mut v = v_t.transpose();
    let mut rotation = v * u.transpose();

    if rotation.determinant() < 0.0 {
        for row in 0..3 {
            v[(row, min_index)] = -v[(row, min_index)];
        }
        rotation = v * u.transpose();
    }

    for entry in rotation.iter_mut() {
        if entry.abs() < config.rotation_zero_threshold() {
            *entry = 0.0;
        }
    }

    (rotation, false)
}
