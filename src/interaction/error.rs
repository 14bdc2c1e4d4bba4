use thiserror::Error;

/// A tool was armed or updated without the state its strategy promised.
/// Reaching one of these means the dispatch predicates let through a hit
/// they should have rejected.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ToolError {
    #[error("no stamp is placed")]
    MissingStamp,
    #[error("the stamp has no deformation lattice")]
    MissingLattice,
    #[error("no decal surface is available")]
    MissingSurface,
    #[error("no widget is shown")]
    MissingWidget,
    #[error("the pointer ray did not hit the surface at a UV point")]
    MissingUv,
}
