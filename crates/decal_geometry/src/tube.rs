use bevy::{
    asset::RenderAssetUsages,
    math::cubic_splines::{CubicCardinalSpline, CubicGenerator},
    mesh::{Indices, PrimitiveTopology},
    prelude::*,
};

/// Gently bent, tapered tube used as the default decal target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BentTube {
    pub radius: f32,
    pub height: f32,
    /// Sideways wobble of the centreline.
    pub irregularity: f32,
    /// Fraction the radius shrinks from base to top.
    pub taper: f32,
    pub radial_segments: u32,
    pub curve_segments: u32,
}

impl Default for BentTube {
    fn default() -> Self {
        Self {
            radius: 0.2,
            height: 4.0,
            irregularity: 0.2,
            taper: 0.3,
            radial_segments: 32,
            curve_segments: 64,
        }
    }
}

impl BentTube {
    fn control_points(&self) -> Vec<Vec3> {
        (0..=5)
            .map(|i| {
                let t = i as f32 / 5.0;
                Vec3::new(
                    (t * std::f32::consts::PI * 1.5).sin() * self.irregularity,
                    t * self.height,
                    (t * std::f32::consts::PI * 1.3).cos() * self.irregularity,
                )
            })
            .collect()
    }

    /// Sampled centreline points and unit tangents.
    fn centerline(&self) -> Vec<(Vec3, Vec3)> {
        let control = self.control_points();
        let samples = self.curve_segments.max(1);
        match CubicCardinalSpline::new_catmull_rom(control.iter().copied()).to_curve() {
            Ok(curve) => {
                let span = curve.segments().len() as f32;
                (0..=samples)
                    .map(|i| {
                        let t = span * i as f32 / samples as f32;
                        (curve.position(t), curve.velocity(t).normalize_or(Vec3::Y))
                    })
                    .collect()
            }
            // Straight fallback; only reachable with fewer than two control points.
            Err(_) => (0..=samples)
                .map(|i| (Vec3::Y * self.height * i as f32 / samples as f32, Vec3::Y))
                .collect(),
        }
    }
}

/// Triangulate a [`BentTube`] with parallel-transported cross-section frames
/// so the seam does not twist. U runs around the tube, V along it.
pub fn bent_tube_mesh(tube: &BentTube) -> Mesh {
    let centerline = tube.centerline();
    let radial = tube.radial_segments.max(3);
    let rings = centerline.len();

    let mut frames: Vec<(Vec3, Vec3)> = Vec::with_capacity(rings);
    for (i, &(_, tangent)) in centerline.iter().enumerate() {
        let (right, up) = if i == 0 {
            let mut reference = Vec3::X - tangent * Vec3::X.dot(tangent);
            if reference.length() < 0.01 {
                reference = Vec3::Y - tangent * Vec3::Y.dot(tangent);
            }
            let right = tangent.cross(reference.normalize_or(Vec3::Z)).normalize_or(Vec3::X);
            (right, tangent.cross(right).normalize_or(Vec3::Z))
        } else {
            let (previous_right, previous_up) = frames[i - 1];
            let transport = Quat::from_rotation_arc(centerline[i - 1].1, tangent);
            let up = transport * previous_up;
            let right = up.cross(tangent).normalize_or(transport * previous_right);
            (right, tangent.cross(right).normalize_or(up))
        };
        frames.push((right, up));
    }

    let vertex_count = rings * (radial as usize + 1);
    let mut positions = Vec::with_capacity(vertex_count);
    let mut normals = Vec::with_capacity(vertex_count);
    let mut uvs = Vec::with_capacity(vertex_count);

    for (i, (&(point, _), &(right, up))) in centerline.iter().zip(&frames).enumerate() {
        let along = i as f32 / (rings - 1).max(1) as f32;
        let radius = tube.radius * (1.0 - along * tube.taper);
        for j in 0..=radial {
            let around = j as f32 / radial as f32;
            let (sin, cos) = (around * std::f32::consts::TAU).sin_cos();
            let offset = right * cos * radius + up * sin * radius;
            positions.push((point + offset).to_array());
            normals.push(offset.normalize_or(right).to_array());
            uvs.push([around, along]);
        }
    }

    let row = radial + 1;
    let mut indices = Vec::with_capacity((rings - 1) * radial as usize * 6);
    for i in 0..(rings as u32).saturating_sub(1) {
        for j in 0..radial {
            let current = i * row + j;
            let next = current + 1;
            let current_next = current + row;
            let next_next = current_next + 1;
            indices.extend_from_slice(&[current, next, current_next, next, next_next, current_next]);
        }
    }

    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_NORMAL, normals);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SurfaceGeometry;

    #[test]
    fn default_tube_triangle_count() {
        let mesh = bent_tube_mesh(&BentTube::default());
        let geometry = SurfaceGeometry::from_mesh(&mesh).unwrap();
        assert_eq!(geometry.triangle_count(), 64 * 32 * 2);
    }

    #[test]
    fn every_interior_uv_maps_to_a_face() {
        let geometry = SurfaceGeometry::from_mesh(&bent_tube_mesh(&BentTube::default())).unwrap();
        for uv in [Vec2::new(0.5, 0.5), Vec2::new(0.1, 0.9), Vec2::new(0.95, 0.05)] {
            assert!(geometry.face_index_from_uv(uv).is_some(), "no face for {uv}");
        }
    }

    #[test]
    fn tube_spans_its_height() {
        let mesh = bent_tube_mesh(&BentTube::default());
        let geometry = SurfaceGeometry::from_mesh(&mesh).unwrap();
        let last = geometry.triangle_count() - 1;
        let top = geometry.triangle_positions(last).unwrap();
        assert!(top.iter().all(|p| (p.y - 4.0).abs() < 0.3));
    }
}
