/// Non-fatal conditions observed while building weights or fitting rotations.
///
/// Degenerate triangles and dropped small weights are not errors (see `ArapError`);
/// they are recorded here so a caller can inspect mesh quality without the solver
/// reaching for a logging crate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    /// Triangle indices skipped during weight building because their cross product
    /// was numerically zero (degenerate / zero-area).
    pub degenerate_triangles: Vec<usize>,
    /// Number of edge weights dropped because `|w_ij| < weight_epsilon`.
    pub dropped_small_weights: usize,
    /// Vertices whose covariance `S_i` was degenerate and whose rotation defaulted to identity.
    pub degenerate_rotations: Vec<usize>,
}

impl Diagnostics {
    pub(crate) fn record_degenerate_triangle(&mut self, triangle_index: usize) {
        #[cfg(debug_assertions)]
        eprintln!("arap_core: skipping degenerate triangle {triangle_index}");
        self.degenerate_triangles.push(triangle_index);
    }

    pub(crate) fn record_dropped_weight(&mut self) {
        self.dropped_small_weights += 1;
    }

    pub(crate) fn record_degenerate_rotation(&mut self, vertex_index: usize) {
        #[cfg(debug_assertions)]
        eprintln!("arap_core: vertex {vertex_index} has degenerate covariance, using identity rotation");
        self.degenerate_rotations.push(vertex_index);
    }

    pub fn is_clean(&self) -> bool {
        self.degenerate_triangles.is_empty()
            && self.dropped_small_weights == 0
            && self.degenerate_rotations.is_empty()
    }
}
