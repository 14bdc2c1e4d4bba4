use bevy::prelude::*;

use crate::EPSILON;

/// Orthonormal frame at a surface point: `u_axis` follows increasing U,
/// `v_axis` increasing V, both perpendicular to `normal`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TangentBasis {
    pub u_axis: Vec3,
    pub v_axis: Vec3,
    pub normal: Vec3,
}

impl TangentBasis {
    /// Rotation taking local X/Y/Z onto `u_axis`/`v_axis`/`u_axis × v_axis`.
    ///
    /// The third axis is the cross product rather than `normal`, so a frame
    /// whose UV orientation is mirrored relative to the normal still yields a
    /// proper rotation.
    pub fn rotation(&self) -> Quat {
        let z = self.u_axis.cross(self.v_axis).normalize_or(self.normal);
        Quat::from_mat3(&Mat3::from_cols(self.u_axis, self.v_axis, z)).normalize()
    }
}

/// Tangent frame of one triangle from its positions and UVs.
///
/// Solves the 2×2 system relating the edge vectors to the UV deltas, then
/// Gram-Schmidt orthogonalizes against `normal` and against each other.
/// Falls back to [`fallback_basis`] when the UV mapping is degenerate.
pub fn tangent_basis(positions: [Vec3; 3], uvs: [Vec2; 3], normal: Vec3) -> TangentBasis {
    let normal = normal.normalize_or(Vec3::Z);

    let edge1 = positions[1] - positions[0];
    let edge2 = positions[2] - positions[0];
    let duv1 = uvs[1] - uvs[0];
    let duv2 = uvs[2] - uvs[0];

    let det = duv1.x * duv2.y - duv2.x * duv1.y;
    if det.abs() < EPSILON {
        return fallback_basis(normal);
    }
    let f = 1.0 / det;

    let tangent = (f * (duv2.y * edge1 - duv1.y * edge2)).normalize_or_zero();
    let bitangent = (f * (-duv2.x * edge1 + duv1.x * edge2)).normalize_or_zero();

    let u_axis = (tangent - normal * normal.dot(tangent)).normalize_or_zero();
    if u_axis == Vec3::ZERO {
        return fallback_basis(normal);
    }
    let v_axis = bitangent - normal * normal.dot(bitangent);
    let v_axis = (v_axis - u_axis * u_axis.dot(v_axis)).normalize_or_zero();
    if v_axis == Vec3::ZERO {
        return fallback_basis(normal);
    }

    TangentBasis {
        u_axis,
        v_axis,
        normal,
    }
}

/// Frame for surfaces without UVs: world +X projected onto the tangent plane
/// (world +Y if X is parallel to the normal), `v_axis = normal × u_axis`.
pub fn fallback_basis(normal: Vec3) -> TangentBasis {
    let normal = normal.normalize_or(Vec3::Z);
    let project = |axis: Vec3| (axis - normal * axis.dot(normal)).normalize_or_zero();

    let mut u_axis = project(Vec3::X);
    if u_axis == Vec3::ZERO {
        u_axis = project(Vec3::Y);
    }
    let v_axis = normal.cross(u_axis).normalize();

    TangentBasis {
        u_axis,
        v_axis,
        normal,
    }
}
