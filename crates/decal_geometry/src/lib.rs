//! Surface math for placing decals on triangulated meshes.
//!
//! Everything here is engine independent apart from `bevy::math` types and the
//! `Mesh` conversions, so the editor crate and its tests can share it.

mod basis;
mod lattice;
mod surface;
mod tube;

pub use basis::{TangentBasis, fallback_basis, tangent_basis};
pub use lattice::{DeformationLattice, LatticeTransform, smooth_falloff};
pub use surface::{GeometryError, SurfaceGeometry, SurfaceHit};
pub use tube::{BentTube, bent_tube_mesh};

/// Shared tolerance for degenerate-triangle and near-zero checks.
pub const EPSILON: f32 = 1e-6;
