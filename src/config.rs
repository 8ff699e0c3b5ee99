/// Tunable constants for the ARAP solver.
///
/// Follows the `with_*` builder pattern used by `IncrementalRemesher` elsewhere in
/// this crate: construct with `ArapConfig::default()` and chain setters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArapConfig {
    max_iters: usize,
    atol: f64,
    btol: f64,
    weight_epsilon: f64,
    svd_degenerate_threshold: f64,
    rotation_zero_threshold: f64,
    use_absolute_weights: bool,
}

impl Default for ArapConfig {
    fn default() -> Self {
        Self {
            max_iters: 100,
            atol: 1e-4,
            btol: 1e-2,
            weight_epsilon: 1e-6,
            svd_degenerate_threshold: 1e-12,
            rotation_zero_threshold: 1e-5,
            use_absolute_weights: false,
        }
    }
}

impl ArapConfig {
    pub fn new() -> Self {
        Default::default()
    }

    /// Hard cap on the number of local/global alternations per `deform` call. Default 100.
    #[inline]
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Stop when `|Δ_{k-1} - Δ_k| < atol`. Default 1e-4.
    #[inline]
    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    /// Stop when `Δ_k < btol`. Default 1e-2.
    #[inline]
    pub fn with_btol(mut self, btol: f64) -> Self {
        self.btol = btol;
        self
    }

    /// Cotangent weights smaller than this in magnitude are dropped. Default 1e-6.
    #[inline]
    pub fn with_weight_epsilon(mut self, weight_epsilon: f64) -> Self {
        self.weight_epsilon = weight_epsilon;
        self
    }

    /// Below this singular value, a vertex's rotation fit defaults to identity. Default 1e-12.
    #[inline]
    pub fn with_svd_degenerate_threshold(mut self, threshold: f64) -> Self {
        self.svd_degenerate_threshold = threshold;
        self
    }

    /// Rotation matrix entries smaller than this in magnitude are zeroed. Default 1e-5.
    #[inline]
    pub fn with_rotation_zero_threshold(mut self, threshold: f64) -> Self {
        self.rotation_zero_threshold = threshold;
        self
    }

    /// When set, cotangent weights are clamped to `max(w, 0.0)` as a stabilization option.
    #[inline]
    pub fn with_absolute_weights(mut self, use_absolute_weights: bool) -> Self {
        self.use_absolute_weights = use_absolute_weights;
        self
    }

    #[inline]
    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    #[inline]
    pub fn atol(&self) -> f64 {
        self.atol
    }

    #[inline]
    pub fn btol(&self) -> f64 {
        self.btol
    }

    #[inline]
    pub fn weight_epsilon(&self) -> f64 {
        self.weight_epsilon
    }

    #[inline]
    pub fn svd_degenerate_threshold(&self) -> f64 {
        self.svd_degenerate_threshold
    }

    #[inline]
    pub fn rotation_zero_threshold(&self) -> f64 {
        self.rotation_zero_threshold
    }

    #[inline]
    pub fn use_absolute_weights(&self) -> bool {
        self.use_absolute_weights
    }
}
