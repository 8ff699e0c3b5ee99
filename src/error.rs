/// Errors produced while configuring or running the ARAP solver.
///
/// Setup errors (`NonManifoldMesh`, `EmptyMesh`, `IllConditionedSystem`) are reported
/// directly to the caller from `init`/`set_anchors`. `NumericalFailure` aborts the
/// current `deform` call and leaves the previous `V_cur` untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArapError {
    /// More than two triangles share an edge.
    NonManifoldMesh,
    /// Fewer than 3 vertices or no triangles were given.
    EmptyMesh,
    /// `L_ff` is not positive-definite; the anchor set leaves a free vertex ungrounded.
    IllConditionedSystem,
    /// `deform` was called before `init`/`set_anchors` configured the solver.
    NotConfigured,
    /// An SVD or sparse solve produced a non-finite value.
    NumericalFailure,
}

impl ToString for ArapError {
    fn to_string(&self) -> String {
        match self {
            ArapError::NonManifoldMesh => "non-manifold mesh: an edge is shared by more than two triangles".to_string(),
            ArapError::EmptyMesh => "empty mesh: need at least 3 vertices and 1 triangle".to_string(),
            ArapError::IllConditionedSystem => "ill-conditioned system: free-vertex Laplacian is not positive-definite, add an anchor".to_string(),
            ArapError::NotConfigured => "solver not configured: call init/set_anchors before deform".to_string(),
            ArapError::NumericalFailure => "numerical failure: SVD or sparse solve produced a non-finite value".to_string(),
        }
    }
}
