use bevy::{
    math::Affine3A,
    mesh::{Indices, VertexAttributeValues},
    prelude::*,
};
use thiserror::Error;

use crate::{EPSILON, TangentBasis, fallback_basis, tangent_basis};

/// Barycentric acceptance slack for near-edge UV queries.
const UV_TOLERANCE: f32 = 0.1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("mesh has no position attribute")]
    MissingPositions,
    #[error("mesh attribute `{0}` has an unexpected vertex format")]
    UnexpectedFormat(&'static str),
    #[error("mesh has {uvs} UVs for {positions} positions")]
    UvCountMismatch { positions: usize, uvs: usize },
    #[error("index {index} is out of range for {positions} positions")]
    IndexOutOfRange { index: usize, positions: usize },
    #[error("{0} is not a whole number of triangles")]
    IncompleteTriangle(usize),
}

/// CPU-side copy of a triangulated surface: positions, optional UVs and an
/// optional index buffer (non-indexed meshes are read as consecutive triples).
#[derive(Clone, Debug, Default)]
pub struct SurfaceGeometry {
    positions: Vec<Vec3>,
    uvs: Option<Vec<Vec2>>,
    indices: Option<Vec<u32>>,
}

/// Nearest ray/surface intersection, in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceHit {
    pub point: Vec3,
    pub distance: f32,
    pub face_index: usize,
    pub uv: Option<Vec2>,
    /// Geometric face normal, following the triangle winding.
    pub normal: Vec3,
}

impl SurfaceGeometry {
    pub fn new(
        positions: Vec<Vec3>,
        uvs: Option<Vec<Vec2>>,
        indices: Option<Vec<u32>>,
    ) -> Result<Self, GeometryError> {
        if let Some(uvs) = &uvs
            && uvs.len() != positions.len()
        {
            return Err(GeometryError::UvCountMismatch {
                positions: positions.len(),
                uvs: uvs.len(),
            });
        }
        let element_count = indices.as_ref().map_or(positions.len(), Vec::len);
        if element_count % 3 != 0 {
            return Err(GeometryError::IncompleteTriangle(element_count));
        }
        if let Some(indices) = &indices
            && let Some(&index) = indices.iter().find(|&&i| i as usize >= positions.len())
        {
            return Err(GeometryError::IndexOutOfRange {
                index: index as usize,
                positions: positions.len(),
            });
        }
        Ok(Self {
            positions,
            uvs,
            indices,
        })
    }

    /// Copy the attributes needed for surface queries out of a triangle-list mesh.
    pub fn from_mesh(mesh: &Mesh) -> Result<Self, GeometryError> {
        let positions = match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
            Some(VertexAttributeValues::Float32x3(values)) => {
                values.iter().map(|p| Vec3::from_array(*p)).collect()
            }
            Some(_) => return Err(GeometryError::UnexpectedFormat("position")),
            None => return Err(GeometryError::MissingPositions),
        };
        let uvs = match mesh.attribute(Mesh::ATTRIBUTE_UV_0) {
            Some(VertexAttributeValues::Float32x2(values)) => {
                Some(values.iter().map(|uv| Vec2::from_array(*uv)).collect())
            }
            Some(_) => return Err(GeometryError::UnexpectedFormat("uv")),
            None => None,
        };
        let indices = mesh.indices().map(|indices| match indices {
            Indices::U16(values) => values.iter().map(|&i| u32::from(i)).collect(),
            Indices::U32(values) => values.clone(),
        });
        Self::new(positions, uvs, indices)
    }

    pub fn has_uvs(&self) -> bool {
        self.uvs.is_some()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.as_ref().map_or(self.positions.len(), Vec::len) / 3
    }

    pub fn triangle_indices(&self, face: usize) -> Option<[usize; 3]> {
        if face >= self.triangle_count() {
            return None;
        }
        let base = face * 3;
        Some(match &self.indices {
            Some(indices) => [
                indices[base] as usize,
                indices[base + 1] as usize,
                indices[base + 2] as usize,
            ],
            None => [base, base + 1, base + 2],
        })
    }

    pub fn triangle_positions(&self, face: usize) -> Option<[Vec3; 3]> {
        let [a, b, c] = self.triangle_indices(face)?;
        Some([self.positions[a], self.positions[b], self.positions[c]])
    }

    pub fn triangle_uvs(&self, face: usize) -> Option<[Vec2; 3]> {
        let uvs = self.uvs.as_ref()?;
        let [a, b, c] = self.triangle_indices(face)?;
        Some([uvs[a], uvs[b], uvs[c]])
    }

    /// Unit face normal in local space, `None` for degenerate triangles.
    pub fn face_normal(&self, face: usize) -> Option<Vec3> {
        let [a, b, c] = self.triangle_positions(face)?;
        let normal = (b - a).cross(c - a);
        (normal.length_squared() > EPSILON * EPSILON).then(|| normal.normalize())
    }

    /// Face normal transformed to world space.
    pub fn world_face_normal(&self, face: usize, world_from_local: &Affine3A) -> Option<Vec3> {
        let local = self.face_normal(face)?;
        Some(world_normal(local, world_from_local))
    }

    /// Index of the triangle whose UV footprint contains `target`.
    ///
    /// Accepts barycentric coordinates within [`UV_TOLERANCE`] of the triangle
    /// and, among the accepted faces, returns the one with the closest UV
    /// centroid. Linear in the triangle count.
    pub fn face_index_from_uv(&self, target: Vec2) -> Option<usize> {
        self.uvs.as_ref()?;
        let mut best: Option<(usize, f32)> = None;
        for face in 0..self.triangle_count() {
            let Some(uvs) = self.triangle_uvs(face) else {
                continue;
            };
            let Some(weights) = uv_barycentric(target, uvs) else {
                continue;
            };
            if weights.x < -UV_TOLERANCE
                || weights.y < -UV_TOLERANCE
                || weights.x + weights.y > 1.0 + UV_TOLERANCE
            {
                continue;
            }
            let centroid = (uvs[0] + uvs[1] + uvs[2]) / 3.0;
            let distance = target.distance(centroid);
            if best.is_none_or(|(_, best_distance)| distance < best_distance) {
                best = Some((face, distance));
            }
        }
        best.map(|(face, _)| face)
    }

    /// World position of the surface point carrying `target` UVs.
    pub fn position_from_uv(&self, world_from_local: &Affine3A, target: Vec2) -> Option<Vec3> {
        let face = self.face_index_from_uv(target)?;
        let local = self.local_position_in_face(face, target)?;
        Some(world_from_local.transform_point3(local))
    }

    /// Interpolated local position of `target` UVs inside `face`.
    pub fn local_position_in_face(&self, face: usize, target: Vec2) -> Option<Vec3> {
        let [p0, p1, p2] = self.triangle_positions(face)?;
        let weights = uv_barycentric(target, self.triangle_uvs(face)?)?;
        let w = 1.0 - weights.x - weights.y;
        Some(p0 * w + p1 * weights.x + p2 * weights.y)
    }

    /// UVs at a local-space point lying on `face`.
    pub fn uv_at(&self, face: usize, local_point: Vec3) -> Option<Vec2> {
        let [p0, p1, p2] = self.triangle_positions(face)?;
        let [uv0, uv1, uv2] = self.triangle_uvs(face)?;
        let weights = point_barycentric(local_point, [p0, p1, p2])?;
        let w = 1.0 - weights.x - weights.y;
        Some(uv0 * w + uv1 * weights.x + uv2 * weights.y)
    }

    /// World-space tangent frame at `face`, orthogonalized against `normal`.
    pub fn basis_at(&self, face: usize, normal: Vec3, world_from_local: &Affine3A) -> TangentBasis {
        match (self.triangle_positions(face), self.triangle_uvs(face)) {
            (Some(positions), Some(uvs)) => {
                let positions = positions.map(|p| world_from_local.transform_point3(p));
                tangent_basis(positions, uvs, normal)
            }
            _ => fallback_basis(normal),
        }
    }

    /// Nearest double-sided intersection of a world-space ray with the surface.
    pub fn raycast(&self, ray: Ray3d, world_from_local: &Affine3A) -> Option<SurfaceHit> {
        let local_from_world = world_from_local.inverse();
        let origin = local_from_world.transform_point3(ray.origin);
        // Left unnormalized so the hit parameter stays a world-space distance.
        let direction = local_from_world.transform_vector3(*ray.direction);

        let mut nearest: Option<(usize, f32)> = None;
        for face in 0..self.triangle_count() {
            let Some(triangle) = self.triangle_positions(face) else {
                continue;
            };
            let Some(t) = ray_triangle(origin, direction, triangle) else {
                continue;
            };
            if nearest.is_none_or(|(_, best)| t < best) {
                nearest = Some((face, t));
            }
        }

        let (face_index, distance) = nearest?;
        let local_point = origin + direction * distance;
        let normal = self
            .world_face_normal(face_index, world_from_local)
            .unwrap_or(-*ray.direction);
        Some(SurfaceHit {
            point: world_from_local.transform_point3(local_point),
            distance,
            face_index,
            uv: self.uv_at(face_index, local_point),
            normal,
        })
    }
}

/// Weights of `uvs[1]` and `uvs[2]` for `target`; `None` if the UV triangle is degenerate.
fn uv_barycentric(target: Vec2, uvs: [Vec2; 3]) -> Option<Vec2> {
    let v0 = uvs[1] - uvs[0];
    let v1 = uvs[2] - uvs[0];
    let v2 = target - uvs[0];

    let dot00 = v0.dot(v0);
    let dot01 = v0.dot(v1);
    let dot02 = v0.dot(v2);
    let dot11 = v1.dot(v1);
    let dot12 = v1.dot(v2);

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() < EPSILON * EPSILON {
        return None;
    }
    let inv = 1.0 / denom;
    Some(Vec2::new(
        (dot11 * dot02 - dot01 * dot12) * inv,
        (dot00 * dot12 - dot01 * dot02) * inv,
    ))
}

fn point_barycentric(point: Vec3, triangle: [Vec3; 3]) -> Option<Vec2> {
    let v0 = triangle[1] - triangle[0];
    let v1 = triangle[2] - triangle[0];
    let v2 = point - triangle[0];

    let dot00 = v0.dot(v0);
    let dot01 = v0.dot(v1);
    let dot02 = v0.dot(v2);
    let dot11 = v1.dot(v1);
    let dot12 = v1.dot(v2);

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() < EPSILON * EPSILON {
        return None;
    }
    let inv = 1.0 / denom;
    Some(Vec2::new(
        (dot11 * dot02 - dot01 * dot12) * inv,
        (dot00 * dot12 - dot01 * dot02) * inv,
    ))
}

/// Möller–Trumbore without backface culling. Returns the ray parameter.
fn ray_triangle(origin: Vec3, direction: Vec3, [a, b, c]: [Vec3; 3]) -> Option<f32> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < EPSILON * EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = edge2.dot(q) * inv_det;
    (t > EPSILON).then_some(t)
}

fn world_normal(local: Vec3, world_from_local: &Affine3A) -> Vec3 {
    let normal_matrix = Mat3::from(world_from_local.matrix3).inverse().transpose();
    (normal_matrix * local).normalize_or(local)
}
