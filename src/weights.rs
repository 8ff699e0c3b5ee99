use std::collections::HashMap;

use crate::{
    config::ArapConfig,
    diagnostics::Diagnostics,
    geometry::traits::RealNumber,
    helpers::aliases::{to_vec3d, Vec3d},
    mesh::Mesh,
};

/// Symmetric sparse edge-weight matrix `W`, keyed by canonicalized `(min, max)`
/// vertex index pairs. `W[i,j] == 0` implicitly for any pair not present.
#[derive(Debug, Clone, Default)]
pub struct CotangentWeights {
    weights: HashMap<(usize, usize), f64>,
}

impl CotangentWeights {
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let key = if i < j { (i, j) } else { (j, i) };
        self.weights.get(&key).copied().unwrap_or(0.0)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Computes `w_ij = ½(cot α + cot β)` for every edge of `mesh`, from rest-pose
/// geometry only. `W` is never recomputed from the deformed mesh: ARAP weights are
/// a function of `V_rest` alone.
///
/// Cotangents are computed as `(u·v) / |u×v|` between the two edge vectors out of
/// the opposite vertex — algebraically `cos θ / sin θ` without an explicit
/// normalization step.
pub fn build_cotangent_weights<T: RealNumber>(
    mesh: &Mesh<T>,
    config: &ArapConfig,
    diagnostics: &mut Diagnostics,
) -> CotangentWeights {
    let degenerate = degenerate_triangles(mesh, diagnostics);
    let mut weights = HashMap::with_capacity(mesh.vertex_count() * 3);

    for (a, b) in mesh.edges() {
        let incident = mesh.edge_triangles(a, b).expect("edge came from mesh.edges()");
        let mut weight = 0.0;
        let mut any_contribution = false;

        for triangle_index in incident.iter() {
            if degenerate.contains(&triangle_index) {
                continue;
            }

            let opposite = mesh.opposite(triangle_index, a, b);
            if let Some(cot) = cotangent_at(mesh, opposite, a, b) {
                weight += 0.5 * cot;
                any_contribution = true;
            }
        }

        if !any_contribution {
            continue;
        }

        if config.use_absolute_weights() {
            weight = weight.max(0.0);
        }

        if weight.abs() < config.weight_epsilon() {
            diagnostics.record_dropped_weight();
            continue;
        }

        weights.insert((a.min(b), a.max(b)), weight);
    }

    CotangentWeights { weights }
}

/// `cot` of the angle at `apex` opposite edge `(a, b)`.
fn cotangent_at<T: RealNumber>(mesh: &Mesh<T>, apex: usize, a: usize, b: usize) -> Option<f64> {
    let apex_pos = to_vec3d(&mesh.vertex_position(apex));
    let a_pos = to_vec3d(&mesh.vertex_position(a));
    let b_pos = to_vec3d(&mesh.vertex_position(b));

    let u: Vec3d = a_pos - apex_pos;
    let v: Vec3d = b_pos - apex_pos;
    let cross_norm = u.cross(&v).norm();

    if cross_norm == 0.0 {
        None
    } else {
        Some(u.dot(&v) / cross_norm)
    }
}

fn degenerate_triangles<T: RealNumber>(mesh: &Mesh<T>, diagnostics: &mut Diagnostics) -> std::collections::HashSet<usize> {
    let mut degenerate = std::collections::HashSet::new();

    for (triangle_index, &[v0, v1, v2]) in mesh.triangles().iter().enumerate() {
        let p0 = to_vec3d(&mesh.vertex_position(v0));
        let p1 = to_vec3d(&mesh.vertex_position(v1));
        let p2 = to_vec3d(&mesh.vertex_position(v2));
        let cross = (p1 - p0).cross(&(p2 - p0));

        if cross.norm_squared() == 0.0 {
            diagnostics.record_degenerate_triangle(triangle_index);
            degenerate.insert(triangle_index);
        }
    }

    degenerate
}
