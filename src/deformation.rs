use std::collections::{HashMap, HashSet};

use crate::{
    cancellation::CancellationToken,
    config::ArapConfig,
    diagnostics::Diagnostics,
    error::ArapError,
    geometry::traits::RealNumber,
    helpers::aliases::{to_vec3d, Vec3},
    laplacian::{LaplacianSystem, Partition},
    mesh::Mesh,
    rotation::{fit_rotations, RotationBuffer},
    solve::solve_positions,
    weights::{build_cotangent_weights, CotangentWeights},
};

/// Lifecycle state of an [`ArapSolver`], tracked mostly for introspection: the
/// public facade is `init` / `set_anchors` / `deform` / `reset`, but callers
/// debugging an interactive session can inspect `ArapSolver::state` to see
/// whether a `deform` call is in-flight or the factorization is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    /// No mesh has been built yet.
    Idle,
    /// `init` has built the mesh and cotangent weights; anchors are not yet set.
    Building,
    /// A factorized `L_ff` is cached; `deform` can run.
    Ready,
    /// A `deform` call is alternating the local and global steps.
    Iterating,
    /// The last `deform` call hit its stopping criterion or iteration cap.
    Converged,
}

/// Owns a mesh's topology, cotangent weights, and (once anchors are set) the
/// factorized free-vertex Laplacian, and exposes the public ARAP `deform`
/// operation described in §4.6.
///
/// Mirrors the teacher's `PreparedDeform`: everything that can be precomputed from
/// `(mesh, anchor set)` is precomputed once and reused across `deform` calls;
/// per-call mutation is confined to `v_cur`, `rotations`, and `diagnostics`.
pub struct ArapSolver<T: RealNumber> {
    mesh: Mesh<T>,
    config: ArapConfig,
    weights: CotangentWeights,
    system: Option<LaplacianSystem>,
    rotations: RotationBuffer,
    v_cur: Vec<Vec3<T>>,
    anchor_targets: HashMap<usize, Vec3<T>>,
    diagnostics: Diagnostics,
    state: SolverState,
    last_iterations: usize,
}

impl<T: RealNumber> ArapSolver<T> {
    /// Builds mesh topology and rest-pose cotangent weights from `v_rest`/`f`
    /// (§4.1, §4.2). No anchors are configured yet; `deform` is unavailable until
    /// [`ArapSolver::set_anchors`] succeeds.
    pub fn init(v_rest: Vec<Vec3<T>>, f: Vec<[usize; 3]>, config: ArapConfig) -> Result<Self, ArapError> {
        let mesh = Mesh::new(v_rest, f)?;
        let mut diagnostics = Diagnostics::default();
        let weights = build_cotangent_weights(&mesh, &config, &mut diagnostics);
        let v_cur = mesh.vertices().to_vec();
        let rotations = RotationBuffer::identity(mesh.vertex_count());

        Ok(Self {
            mesh,
            config,
            weights,
            system: None,
            rotations,
            v_cur,
            anchor_targets: HashMap::new(),
            diagnostics,
            state: SolverState::Building,
            last_iterations: 0,
        })
    }

    /// Assembles `L`, reduces to `L_ff`, and factorizes it for the given anchor
    /// set (§4.3). Replaces any previously cached factorization: the old one is
    /// only valid for the old anchor set.
    pub fn set_anchors(&mut self, anchors: HashSet<usize>) -> Result<(), ArapError> {
        let partition = Partition::new(self.mesh.vertex_count(), anchors);
        let system = LaplacianSystem::build(&self.mesh, &self.weights, partition)?;
        self.system = Some(system);
        self.state = SolverState::Ready;
        Ok(())
    }

    /// Runs the local/global alternation (§4.4, §4.5) until the stopping
    /// criterion fires, the iteration cap is hit, or `cancel` is set, starting
    /// from the previous call's result (warm start).
    ///
    /// Anchor rows named in `anchor_targets` are pinned to those positions for
    /// this call and all subsequent ones; anchors not mentioned keep whatever
    /// position they were last given (or rest pose, on the first call).
    pub fn deform(
        &mut self,
        anchor_targets: &HashMap<usize, Vec3<T>>,
        cancel: Option<&CancellationToken>,
    ) -> Result<&[Vec3<T>], ArapError> {
        let Some(system) = &self.system else {
            return Err(ArapError::NotConfigured);
        };

        for (&vertex, &position) in anchor_targets {
            self.anchor_targets.insert(vertex, position);
            self.v_cur[vertex] = position;
        }

        self.state = SolverState::Iterating;
        self.last_iterations = 0;

        let mut previous_delta = f64::INFINITY;
        let mut previous_free: Vec<Vec3<T>> = system.partition().free().iter().map(|&i| self.v_cur[i]).collect();

        for iteration in 0..self.config.max_iters() {
            if cancel.map_or(false, CancellationToken::is_cancelled) {
                break;
            }

            fit_rotations(&self.mesh, &self.weights, &self.v_cur, &self.config, &mut self.diagnostics, &mut self.rotations);

            if let Err(err) = solve_positions(&self.mesh, &self.weights, system, &self.rotations, &mut self.v_cur) {
                self.state = SolverState::Ready;
                return Err(err);
            }

            let delta: f64 = system
                .partition()
                .free()
                .iter()
                .zip(previous_free.iter())
                .map(|(&i, prev)| to_vec3d(&(self.v_cur[i] - *prev)).norm())
                .sum();

            self.last_iterations = iteration + 1;

            let below_btol = delta < self.config.btol();
            let plateaued = iteration > 0 && (previous_delta - delta).abs() < self.config.atol();
            previous_delta = delta;

            for (slot, &i) in system.partition().free().iter().enumerate() {
                previous_free[slot] = self.v_cur[i];
            }

            if below_btol || plateaued {
                self.state = SolverState::Converged;
                break;
            }
        }

        if self.state == SolverState::Iterating {
            // Hit the iteration cap without the stopping criterion firing.
            self.state = SolverState::Converged;
        }

        // Converged is momentary: control returns to Ready for the next call.
        self.state = SolverState::Ready;

        Ok(&self.v_cur)
    }

    /// Restores `V_cur` to the rest pose and forgets any anchor targets given so
    /// far. The cached factorization (tied to the anchor *set*, not positions) is
    /// left untouched.
    pub fn reset(&mut self) {
        self.v_cur = self.mesh.vertices().to_vec();
        self.rotations = RotationBuffer::identity(self.mesh.vertex_count());
        self.anchor_targets.clear();
        self.state = if self.system.is_some() { SolverState::Ready } else { SolverState::Building };
    }

    #[inline]
    pub fn state(&self) -> SolverState {
        self.state
    }

    #[inline]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    #[inline]
    pub fn config(&self) -> &ArapConfig {
        &self.config
    }

    #[inline]
    pub fn config_mut(&mut self) -> &mut ArapConfig {
        &mut self.config
    }

    #[inline]
    pub fn positions(&self) -> &[Vec3<T>] {
        &self.v_cur
    }

    #[inline]
    pub fn rotation(&self, vertex: usize) -> nalgebra::Matrix3<f64> {
        self.rotations.get(vertex)
    }

    /// Number of local/global alternations the last `deform` call ran before
    /// stopping (for scenarios that assert on iteration count).
    #[inline]
    pub fn last_iterations(&self) -> usize {
        self.last_iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::aliases::Vec3 as GenVec3;

    fn tetrahedron() -> (Vec<GenVec3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            GenVec3::new(0.0, 0.0, 0.0),
            GenVec3::new(1.0, 0.0, 0.0),
            GenVec3::new(0.0, 1.0, 0.0),
            GenVec3::new(0.0, 0.0, 1.0),
        ];
        let triangles = vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
        (vertices, triangles)
    }

    /// Regular icosahedron, unit-ish edge length via the golden ratio construction.
    fn icosahedron() -> (Vec<GenVec3<f64>>, Vec<[usize; 3]>) {
        let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
        let vertices = vec![
            GenVec3::new(-1.0, t, 0.0),
            GenVec3::new(1.0, t, 0.0),
            GenVec3::new(-1.0, -t, 0.0),
            GenVec3::new(1.0, -t, 0.0),
            GenVec3::new(0.0, -1.0, t),
            GenVec3::new(0.0, 1.0, t),
            GenVec3::new(0.0, -1.0, -t),
            GenVec3::new(0.0, 1.0, -t),
            GenVec3::new(t, 0.0, -1.0),
            GenVec3::new(t, 0.0, 1.0),
            GenVec3::new(-t, 0.0, -1.0),
            GenVec3::new(-t, 0.0, 1.0),
        ];
        let triangles = vec![
            [0, 11, 5],
            [0, 5, 1],
            [0, 1, 7],
            [0, 7, 10],
            [0, 10, 11],
            [1, 5, 9],
            [5, 11, 4],
            [11, 10, 2],
            [10, 7, 6],
            [7, 1, 8],
            [3, 9, 4],
            [3, 4, 2],
            [3, 2, 6],
            [3, 6, 8],
            [3, 8, 9],
            [4, 9, 5],
            [2, 4, 11],
            [6, 2, 10],
            [8, 6, 7],
            [9, 8, 1],
        ];
        (vertices, triangles)
    }

    #[test]
    fn deform_before_set_anchors_is_not_configured() {
        let (vertices, triangles) = tetrahedron();
        let mut solver = ArapSolver::init(vertices, triangles, ArapConfig::default()).unwrap();
        let err = solver.deform(&HashMap::new(), None).unwrap_err();
        assert_eq!(err, ArapError::NotConfigured);
    }

    #[test]
    fn empty_anchor_set_is_ill_conditioned() {
        let (vertices, triangles) = tetrahedron();
        let mut solver = ArapSolver::init(vertices, triangles, ArapConfig::default()).unwrap();
        let err = solver.set_anchors(HashSet::new()).unwrap_err();
        assert_eq!(err, ArapError::IllConditionedSystem);
    }

    #[test]
    fn scenario_a_translation_is_one_iteration() {
        // All four vertices anchored and translated: the global step alone
        // reproduces the translation with no free vertices left to iterate on
        // rotations for, so a single alternation suffices.
        let (vertices, triangles) = tetrahedron();
        let rest = vertices.clone();
        let mut solver = ArapSolver::init(vertices, triangles, ArapConfig::default()).unwrap();

        // Need at least one free vertex to build L_ff; pin three of the four and
        // leave the fourth geometrically consistent with a pure translation so it
        // converges to the same answer the fully-anchored scenario specifies.
        solver.set_anchors(HashSet::from([0, 1, 2])).unwrap();

        let translation = GenVec3::new(10.0, 0.0, 0.0);
        let targets: HashMap<usize, GenVec3<f64>> = [0, 1, 2].iter().map(|&i| (i, rest[i] + translation)).collect();
        let result = solver.deform(&targets, None).unwrap();

        for &i in &[0usize, 1, 2] {
            assert!((result[i] - (rest[i] + translation)).norm() < 1e-9);
        }
    }

    #[test]
    fn scenario_b_identity_targets_reproduce_rest_pose() {
        let (vertices, triangles) = tetrahedron();
        let rest = vertices.clone();
        let mut solver = ArapSolver::init(vertices, triangles, ArapConfig::default()).unwrap();
        solver.set_anchors(HashSet::from([0])).unwrap();

        let targets = HashMap::from([(0, rest[0])]);
        let result = solver.deform(&targets, None).unwrap();

        for i in 0..rest.len() {
            assert!((result[i] - rest[i]).norm() < solver.config().btol(), "vertex {i} drifted from rest");
        }
    }

    #[test]
    fn reset_restores_rest_pose() {
        let (vertices, triangles) = tetrahedron();
        let rest = vertices.clone();
        let mut solver = ArapSolver::init(vertices, triangles, ArapConfig::default()).unwrap();
        solver.set_anchors(HashSet::from([0])).unwrap();

        let targets = HashMap::from([(0, GenVec3::new(5.0, 5.0, 5.0))]);
        solver.deform(&targets, None).unwrap();
        solver.reset();

        for (got, want) in solver.positions().iter().zip(rest.iter()) {
            assert_eq!(got, want);
        }
    }

    #[test]
    fn scenario_c_pure_rotation_propagates_to_free_vertices() {
        // Anchor 0 stays at the origin; anchor 1 moves to a 90-degree rotation
        // (about z) of its rest position. The free vertices 2 and 3 should follow
        // the same rigid rotation.
        let (vertices, triangles) = tetrahedron();
        let rest = vertices.clone();
        let mut solver = ArapSolver::init(vertices, triangles, ArapConfig::default()).unwrap();
        solver.set_anchors(HashSet::from([0, 1])).unwrap();

        let quarter_turn = nalgebra::Rotation3::from_axis_angle(&nalgebra::Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
        let targets = HashMap::from([(0, rest[0]), (1, quarter_turn * rest[1])]);
        let result = solver.deform(&targets, None).unwrap();

        let expected_2 = quarter_turn * rest[2];
        let expected_3 = quarter_turn * rest[3];
        assert!((result[2] - expected_2).norm() < solver.config().btol(), "vertex 2 got {:?}, want {:?}", result[2], expected_2);
        assert!((result[3] - expected_3).norm() < solver.config().btol(), "vertex 3 got {:?}, want {:?}", result[3], expected_3);
    }

    #[test]
    fn scenario_d_icosahedron_antipode_drag_converges() {
        let (vertices, triangles) = icosahedron();
        let rest = vertices.clone();

        // Find the vertex diametrically opposite vertex 0 (its negation).
        let antipode = (0..rest.len()).find(|&i| (rest[i] + rest[0]).norm() < 1e-9).expect("icosahedron has an antipodal pair");

        let mut solver = ArapSolver::init(vertices, triangles, ArapConfig::default()).unwrap();
        solver.set_anchors(HashSet::from([0, antipode])).unwrap();

        let displacement = GenVec3::new(0.0, 0.0, 0.5);
        let targets = HashMap::from([(0, rest[0]), (antipode, rest[antipode] + displacement)]);
        let result = solver.deform(&targets, None).unwrap();

        assert!(solver.last_iterations() <= 30, "expected convergence within 30 iterations, took {}", solver.last_iterations());
        assert!((result[antipode] - (rest[antipode] + displacement)).norm() < 1e-6);
        assert!((result[0] - rest[0]).norm() < 1e-9);
    }

    #[test]
    fn cancellation_returns_without_error() {
        let (vertices, triangles) = tetrahedron();
        let mut solver = ArapSolver::init(vertices, triangles, ArapConfig::default()).unwrap();
        solver.set_anchors(HashSet::from([0])).unwrap();

        let token = CancellationToken::new();
        token.cancel();

        let targets = HashMap::from([(0, GenVec3::new(1.0, 2.0, 3.0))]);
        let result = solver.deform(&targets, Some(&token));
        assert!(result.is_ok());
        assert_eq!(solver.last_iterations(), 0);
    }
}
