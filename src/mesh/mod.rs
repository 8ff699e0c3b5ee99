pub mod topology;

pub use topology::{EdgeTriangles, Mesh, MeshD, MeshF};
