use std::collections::{HashMap, HashSet};

use faer::{linalg::solvers::Solve, sparse as sp};

use crate::{error::ArapError, geometry::traits::RealNumber, mesh::Mesh, weights::CotangentWeights};

type Triplet = sp::Triplet<usize, usize, f64>;

/// Splits a mesh's vertices into the free set `Fr` (solved for) and the anchor set
/// `A` (externally prescribed), and maps free vertex indices to their row/column
/// in the reduced system `L_ff`.
#[derive(Debug, Clone)]
pub struct Partition {
    free: Vec<usize>,
    anchors: HashSet<usize>,
    free_row: HashMap<usize, usize>,
}

impl Partition {
    pub fn new(vertex_count: usize, anchors: HashSet<usize>) -> Self {
        let free: Vec<usize> = (0..vertex_count).filter(|v| !anchors.contains(v)).collect();
        let free_row = free.iter().enumerate().map(|(row, &v)| (v, row)).collect();
        Self { free, anchors, free_row }
    }

    #[inline]
    pub fn free(&self) -> &[usize] {
        &self.free
    }

    #[inline]
    pub fn anchors(&self) -> &HashSet<usize> {
        &self.anchors
    }

    #[inline]
    pub fn is_anchor(&self, vertex: usize) -> bool {
        self.anchors.contains(&vertex)
    }

    #[inline]
    pub fn free_row(&self, vertex: usize) -> Option<usize> {
        self.free_row.get(&vertex).copied()
    }
}

/// The weighted Laplacian's free-vertex submatrix `L_ff = P L Pᵀ`, factorized once
/// and reused across `deform` calls until the anchor set changes.
pub struct LaplacianSystem {
    partition: Partition,
    factorization: sp::linalg::solvers::Llt<usize, f64>,
}

impl LaplacianSystem {
    /// Assembles `L = D - W` implicitly (the diagonal is each vertex's full degree,
    /// over *all* neighbors including anchors) and reduces it to `L_ff` by simply
    /// dropping anchor rows/columns, matching `L_ff = P L Pᵀ`.
    pub fn build<T: RealNumber>(
        mesh: &Mesh<T>,
        weights: &CotangentWeights,
        partition: Partition,
    ) -> Result<Self, ArapError> {
        if partition.free().is_empty() {
            return Err(ArapError::IllConditionedSystem);
        }

        let mut triplets = Vec::with_capacity(partition.free().len() * 4);

        for (row, &i) in partition.free().iter().enumerate() {
            let mut degree = 0.0;
            for &j in mesh.ring(i) {
                degree += weights.get(i, j);
            }
            triplets.push(Triplet::new(row, row, degree));

            for &j in mesh.ring(i) {
                if let Some(col) = partition.free_row(j) {
                    triplets.push(Triplet::new(row, col, -weights.get(i, j)));
                }
            }
        }

        let size = partition.free().len();
        let l_ff = sp::SparseColMat::try_new_from_triplets(size, size, &triplets)
            .map_err(|_| ArapError::NumericalFailure)?;

        let factorization = l_ff
            .sp_cholesky(faer::Side::Lower)
            .map_err(|_| ArapError::IllConditionedSystem)?;

        Ok(Self { partition, factorization })
    }

    #[inline]
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Solves `L_ff x = rhs` for a single spatial axis using the cached factorization.
    pub fn solve_axis(&self, rhs: &faer::Col<f64>) -> faer::Col<f64> {
        self.factorization.solve(rhs)
    }
}
