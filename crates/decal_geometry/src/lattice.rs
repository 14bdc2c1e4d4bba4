use bevy::{
    asset::RenderAssetUsages,
    mesh::{Indices, PrimitiveTopology},
    prelude::*,
};

use crate::EPSILON;

/// Smoothstep falloff: 1 at the centre, 0 at and beyond `radius`, with zero
/// slope at both ends.
pub fn smooth_falloff(distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 || distance >= radius {
        return 0.0;
    }
    let t = distance.max(0.0) / radius;
    1.0 - (3.0 * t * t - 2.0 * t * t * t)
}

/// Placement of the lattice in the texture plane.
///
/// The texture plane is UV space with V flipped (`y = 1 - v`) so that it
/// matches the orthographic render of the unit square, where +Y is the top
/// row of the texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatticeTransform {
    pub translation: Vec2,
    pub scale: Vec2,
    pub rotation: f32,
}

impl LatticeTransform {
    pub fn new(anchor_uv: Vec2, size: Vec2, rotation: f32) -> Self {
        Self {
            translation: uv_to_plane(anchor_uv),
            scale: size,
            rotation,
        }
    }

    pub fn local_to_plane(&self, local: Vec2) -> Vec2 {
        self.translation + Vec2::from_angle(self.rotation).rotate(local * self.scale)
    }

    pub fn local_to_uv(&self, local: Vec2) -> Vec2 {
        plane_to_uv(self.local_to_plane(local))
    }

    /// Convert a UV-space displacement into lattice-local units.
    pub fn uv_delta_to_local(&self, delta_uv: Vec2) -> Vec2 {
        let plane = Vec2::new(delta_uv.x, -delta_uv.y);
        let unrotated = Vec2::from_angle(-self.rotation).rotate(plane);
        unrotated / self.scale.max(Vec2::splat(EPSILON))
    }

    pub fn to_transform(&self) -> Transform {
        Transform {
            translation: self.translation.extend(0.0),
            rotation: Quat::from_rotation_z(self.rotation),
            scale: self.scale.extend(1.0),
        }
    }
}

pub fn uv_to_plane(uv: Vec2) -> Vec2 {
    Vec2::new(uv.x, 1.0 - uv.y)
}

pub fn plane_to_uv(plane: Vec2) -> Vec2 {
    Vec2::new(plane.x, 1.0 - plane.y)
}

/// Subdivided plane over `[-0.5, 0.5]²` whose vertices the brush displaces.
///
/// `original` is fixed at construction; only [`DeformationLattice::deform`]
/// and [`DeformationLattice::reset`] touch `current`.
#[derive(Clone, Debug)]
pub struct DeformationLattice {
    segments: u32,
    original: Vec<Vec3>,
    current: Vec<Vec3>,
    generation: u64,
}

impl DeformationLattice {
    pub fn new(segments: u32) -> Self {
        let segments = segments.max(1);
        let step = 1.0 / segments as f32;
        let mut original = Vec::with_capacity(((segments + 1) * (segments + 1)) as usize);
        // Rows run top to bottom, columns left to right.
        for iy in 0..=segments {
            for ix in 0..=segments {
                original.push(Vec3::new(
                    ix as f32 * step - 0.5,
                    0.5 - iy as f32 * step,
                    0.0,
                ));
            }
        }
        Self {
            segments,
            current: original.clone(),
            original,
            generation: 0,
        }
    }

    pub fn segments(&self) -> u32 {
        self.segments
    }

    pub fn vertex_count(&self) -> usize {
        self.current.len()
    }

    pub fn original_positions(&self) -> &[Vec3] {
        &self.original
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.current
    }

    /// Bumped on every write to the vertex buffer, used as the dirty marker.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_deformed(&self) -> bool {
        self.current
            .iter()
            .zip(&self.original)
            .any(|(current, original)| current.distance_squared(*original) > EPSILON * EPSILON)
    }

    /// Displace vertices near `anchor_uv` by `direction_uv` scaled with
    /// [`smooth_falloff`]. Returns how many vertices moved.
    pub fn deform(
        &mut self,
        transform: &LatticeTransform,
        anchor_uv: Vec2,
        direction_uv: Vec2,
        radius: f32,
    ) -> usize {
        let mut moved = 0;
        for vertex in &mut self.current {
            let vertex_uv = transform.local_to_uv(vertex.truncate());
            let influence = smooth_falloff(vertex_uv.distance(anchor_uv), radius);
            if influence > EPSILON {
                let local = transform.uv_delta_to_local(direction_uv * influence);
                vertex.x += local.x;
                vertex.y += local.y;
                moved += 1;
            }
        }
        // Always dirty: a stroke that moved nothing still has to refresh the preview.
        self.generation += 1;
        moved
    }

    pub fn reset(&mut self) {
        self.current.clone_from(&self.original);
        self.generation += 1;
    }

    /// Bounding rectangle of the deformed lattice in the texture plane.
    pub fn plane_bounds(&self, transform: &LatticeTransform) -> Rect {
        let mut min = Vec2::splat(f32::INFINITY);
        let mut max = Vec2::splat(f32::NEG_INFINITY);
        for vertex in &self.current {
            let p = transform.local_to_plane(vertex.truncate());
            min = min.min(p);
            max = max.max(p);
        }
        Rect { min, max }
    }

    /// Texture coordinates into the source image, top-left origin.
    pub fn image_uvs(&self) -> Vec<[f32; 2]> {
        let step = 1.0 / self.segments as f32;
        (0..=self.segments)
            .flat_map(|iy| (0..=self.segments).map(move |ix| [ix as f32 * step, iy as f32 * step]))
            .collect()
    }

    pub fn triangle_indices(&self) -> Vec<u32> {
        let row = self.segments + 1;
        let mut indices = Vec::with_capacity((self.segments * self.segments * 6) as usize);
        for iy in 0..self.segments {
            for ix in 0..self.segments {
                let a = iy * row + ix;
                let b = a + row;
                let c = b + 1;
                let d = a + 1;
                indices.extend_from_slice(&[a, b, d, b, c, d]);
            }
        }
        indices
    }

    pub fn build_mesh(&self) -> Mesh {
        let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
        self.write_positions(&mut mesh);
        mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, vec![[0.0, 0.0, 1.0]; self.vertex_count()]);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.image_uvs());
        mesh.insert_indices(Indices::U32(self.triangle_indices()));
        mesh
    }

    /// Upload the current vertex positions into an existing lattice mesh.
    pub fn write_positions(&self, mesh: &mut Mesh) {
        let positions: Vec<[f32; 3]> = self.current.iter().map(|p| p.to_array()).collect();
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    }
}
