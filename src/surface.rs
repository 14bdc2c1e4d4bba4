use bevy::{math::Affine3A, prelude::*};
use decal_geometry::{SurfaceGeometry, SurfaceHit, TangentBasis};

/// The mesh decals are stamped onto. Holds a CPU copy of the geometry for
/// raycasts and UV lookups; the entity's `GlobalTransform` places it.
#[derive(Component)]
pub struct DecalSurface {
    pub geometry: SurfaceGeometry,
}

/// Surface geometry paired with its world transform for one query pass.
#[derive(Clone, Copy)]
pub struct SurfaceRef<'a> {
    pub geometry: &'a SurfaceGeometry,
    pub world_from_local: Affine3A,
}

impl<'a> SurfaceRef<'a> {
    pub fn new(geometry: &'a SurfaceGeometry, world_from_local: Affine3A) -> Self {
        Self {
            geometry,
            world_from_local,
        }
    }

    pub fn from_entity(surface: &'a DecalSurface, transform: &GlobalTransform) -> Self {
        Self::new(&surface.geometry, transform.affine())
    }

    pub fn raycast(&self, ray: Ray3d) -> Option<SurfaceHit> {
        self.geometry.raycast(ray, &self.world_from_local)
    }

    pub fn position_from_uv(&self, uv: Vec2) -> Option<Vec3> {
        self.geometry.position_from_uv(&self.world_from_local, uv)
    }

    pub fn face_index_from_uv(&self, uv: Vec2) -> Option<usize> {
        self.geometry.face_index_from_uv(uv)
    }

    /// World position of `uv` inside a face already found for it.
    pub fn position_in_face(&self, face: usize, uv: Vec2) -> Option<Vec3> {
        let local = self.geometry.local_position_in_face(face, uv)?;
        Some(self.world_from_local.transform_point3(local))
    }

    pub fn face_normal(&self, face: usize) -> Option<Vec3> {
        self.geometry.world_face_normal(face, &self.world_from_local)
    }

    pub fn basis_at(&self, face: usize, normal: Vec3) -> TangentBasis {
        self.geometry.basis_at(face, normal, &self.world_from_local)
    }
}
