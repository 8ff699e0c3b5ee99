use std::collections::{HashMap, HashSet};

use crate::{
    error::ArapError,
    geometry::traits::RealNumber,
    helpers::aliases::Vec3,
};

pub type MeshF = Mesh<f32>;
pub type MeshD = Mesh<f64>;

/// The one or two triangles incident to an undirected edge.
///
/// A boundary edge has only `first`; an interior edge has both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeTriangles {
    pub first: usize,
    pub second: Option<usize>,
}

impl EdgeTriangles {
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = usize> {
        [Some(self.first), self.second].into_iter().flatten()
    }

    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.second.is_none()
    }
}

/// Rest-pose mesh topology: triangle list, one-ring adjacency, and edge↔triangle
/// incidence, derived once from `F` and never mutated afterwards.
///
/// Stored as flat arrays of plain integer indices rather than an interlinked
/// half-edge/corner-table graph: the ARAP core never edits topology, only reads
/// adjacency, so the simpler representation is both cheaper and easier to reason
/// about than a general-purpose editable mesh structure.
#[derive(Debug, Clone)]
pub struct Mesh<T: RealNumber> {
    vertices: Vec<Vec3<T>>,
    triangles: Vec<[usize; 3]>,
    rings: Vec<HashSet<usize>>,
    edge_triangles: HashMap<(usize, usize), EdgeTriangles>,
}

#[inline]
fn canonical_edge(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl<T: RealNumber> Mesh<T> {
    /// Builds mesh topology from a vertex buffer and a zero-based triangle index list.
    ///
    /// One pass over `F`: every directed edge of every triangle inserts a
    /// cross-entry into `rings` and appends the triangle to the canonicalized
    /// `(min, max)` edge-to-triangle bucket. A third triangle claiming the same
    /// edge means the input isn't a manifold surface.
    pub fn new(vertices: Vec<Vec3<T>>, triangles: Vec<[usize; 3]>) -> Result<Self, ArapError> {
        if vertices.len() < 3 || triangles.is_empty() {
            return Err(ArapError::EmptyMesh);
        }

        let mut rings = vec![HashSet::new(); vertices.len()];
        let mut edge_triangles: HashMap<(usize, usize), EdgeTriangles> = HashMap::new();

        for (triangle_index, &[v0, v1, v2]) in triangles.iter().enumerate() {
            for &(a, b) in &[(v0, v1), (v1, v2), (v2, v0)] {
                rings[a].insert(b);
                rings[b].insert(a);

                let key = canonical_edge(a, b);
                match edge_triangles.get_mut(&key) {
                    None => {
                        edge_triangles.insert(key, EdgeTriangles { first: triangle_index, second: None });
                    }
                    Some(incident) if incident.second.is_none() => {
                        incident.second = Some(triangle_index);
                    }
                    Some(_) => return Err(ArapError::NonManifoldMesh),
                }
            }
        }

        Ok(Self {
            vertices,
            triangles,
            rings,
            edge_triangles,
        })
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn vertices(&self) -> &[Vec3<T>] {
        &self.vertices
    }

    #[inline]
    pub fn vertex_position(&self, vertex: usize) -> Vec3<T> {
        self.vertices[vertex]
    }

    #[inline]
    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    #[inline]
    pub fn triangle(&self, triangle_index: usize) -> [usize; 3] {
        self.triangles[triangle_index]
    }

    #[inline]
    pub fn ring(&self, vertex: usize) -> &HashSet<usize> {
        &self.rings[vertex]
    }

    #[inline]
    pub fn edge_triangles(&self, a: usize, b: usize) -> Option<EdgeTriangles> {
        self.edge_triangles.get(&canonical_edge(a, b)).copied()
    }

    /// The third vertex of `triangle` that is not part of edge `(a, b)`.
    #[inline]
    pub fn opposite(&self, triangle_index: usize, a: usize, b: usize) -> usize {
        self.triangles[triangle_index]
            .into_iter()
            .find(|&v| v != a && v != b)
            .expect("edge (a, b) must belong to triangle")
    }

    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.edge_triangles.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tetrahedron() -> Mesh<f64> {
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ];
        let triangles = vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
        Mesh::new(vertices, triangles).expect("tetrahedron should build")
    }

    #[test]
    fn rings_are_symmetric() {
        let mesh = tetrahedron();
        for i in 0..mesh.vertex_count() {
            for &j in mesh.ring(i) {
                assert!(mesh.ring(j).contains(&i), "ring({i}) has {j} but ring({j}) lacks {i}");
            }
        }
    }

    #[test]
    fn no_self_loops() {
        let mesh = tetrahedron();
        for i in 0..mesh.vertex_count() {
            assert!(!mesh.ring(i).contains(&i));
        }
    }

    #[test]
    fn interior_edge_has_two_triangles() {
        let mesh = tetrahedron();
        // Every edge of a closed tetrahedron is interior.
        for (a, b) in mesh.edges() {
            let incident = mesh.edge_triangles(a, b).unwrap();
            assert!(!incident.is_boundary(), "edge ({a},{b}) should be interior");
        }
    }

    #[test]
    fn boundary_edge_has_one_triangle() {
        // A single triangle: every edge is a boundary edge.
        let vertices = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)];
        let triangles = vec![[0, 1, 2]];
        let mesh = Mesh::new(vertices, triangles).unwrap();

        for (a, b) in mesh.edges() {
            assert!(mesh.edge_triangles(a, b).unwrap().is_boundary());
        }
    }

    #[test]
    fn opposite_vertex_is_third_corner() {
        let mesh = tetrahedron();
        assert_eq!(mesh.opposite(0, 0, 1), 2);
        assert_eq!(mesh.opposite(0, 1, 2), 0);
    }

    #[test]
    fn empty_mesh_rejected() {
        let err = Mesh::<f64>::new(vec![], vec![]).unwrap_err();
        assert_eq!(err, ArapError::EmptyMesh);
    }

    #[test]
    fn bowtie_is_non_manifold() {
        // Three triangles sharing the edge (0, 1).
        let vertices = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.5, 0.0, 1.0),
        ];
        let triangles = vec![[0, 1, 2], [0, 1, 3], [0, 1, 4]];
        let err = Mesh::new(vertices, triangles).unwrap_err();
        assert_eq!(err, ArapError::NonManifoldMesh);
    }
}
