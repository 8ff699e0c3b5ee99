use nalgebra as na;

use crate::{
    error::ArapError,
    geometry::traits::RealNumber,
    helpers::aliases::{from_vec3d, to_vec3d, Vec3, Vec3d},
    laplacian::LaplacianSystem,
    mesh::Mesh,
    rotation::RotationBuffer,
    weights::CotangentWeights,
};

/// Builds the right-hand side from the current rotations and anchor positions,
/// then solves `L_ff X = RHS` one spatial axis at a time, writing the result back
/// into the free rows of `v_cur` (§4.5). Anchor rows of `v_cur` are read but never
/// written here.
///
/// `L_ff`'s off-diagonal entries are `-w_ij` (§4.3), so moving a neighboring
/// anchor's known position to the right-hand side of `L_ff X = RHS` flips that
/// sign back to positive: `RHS_i = b_i + Σ_{j anchor} w_ij · V_cur[j]`. This is the
/// addition that makes the rest-reproduction invariant (§8.2) hold exactly when
/// every rotation is the identity and every anchor sits at its rest position.
pub fn solve_positions<T: RealNumber>(
    mesh: &Mesh<T>,
    weights: &CotangentWeights,
    system: &LaplacianSystem,
    rotations: &RotationBuffer,
    v_cur: &mut [Vec3<T>],
) -> Result<(), ArapError> {
    let partition = system.partition();
    let free = partition.free();

    let mut rhs: Vec<faer::Col<f64>> = (0..3).map(|_| faer::Col::zeros(free.len())).collect();

    for (row, &i) in free.iter().enumerate() {
        let rest_i = to_vec3d(&mesh.vertex_position(i));
        let r_i = rotations.get(i);
        let mut b = na::Vector3::<f64>::zeros();

        for &j in mesh.ring(i) {
            let w = weights.get(i, j);
            if w == 0.0 {
                continue;
            }

            let rest_j = to_vec3d(&mesh.vertex_position(j));
            let r_sum = r_i + rotations.get(j);
            b += (0.5 * w) * (r_sum * (rest_i - rest_j));

            if partition.is_anchor(j) {
                b += w * to_vec3d(&v_cur[j]);
            }
        }

        rhs[0][row] = b.x;
        rhs[1][row] = b.y;
        rhs[2][row] = b.z;
    }

    #[cfg(feature = "parallel")]
    let solved: Vec<faer::Col<f64>> = {
        use rayon::prelude::*;
        rhs.par_iter().map(|axis| system.solve_axis(axis)).collect()
    };
    #[cfg(not(feature = "parallel"))]
    let solved: Vec<faer::Col<f64>> = rhs.iter().map(|axis| system.solve_axis(axis)).collect();

    for (row, &i) in free.iter().enumerate() {
        let position = Vec3d::new(solved[0][row], solved[1][row], solved[2][row]);
        if !position.iter().all(|c| c.is_finite()) {
            return Err(ArapError::NumericalFailure);
        }
        v_cur[i] = from_vec3d(&position);
    }

    Ok(())
}
