pub mod cancellation;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod laplacian;
pub mod mesh;
pub mod rotation;
pub mod solve;
pub mod weights;

mod deformation;
mod helpers;

pub use cancellation::CancellationToken;
pub use config::ArapConfig;
pub use deformation::{ArapSolver, SolverState};
pub use diagnostics::Diagnostics;
pub use error::ArapError;
pub use mesh::{EdgeTriangles, Mesh, MeshD, MeshF};
