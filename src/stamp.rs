use std::f32::consts::{PI, TAU};

use bevy::prelude::*;
use decal_geometry::{LatticeTransform, TangentBasis};

/// Identifier of the active stamp. The editor holds at most one stamp, so a
/// single fixed id stands in for "a stamp is selected".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StampId(pub u32);

impl StampId {
    pub const PRIMARY: StampId = StampId(1);
}

impl std::fmt::Display for StampId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stamp-{}", self.0)
    }
}

/// Placement of the decal on the surface, in UV space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StampInfo {
    pub uv: Vec2,
    pub size: Vec2,
    /// Canvas-space rotation in radians, kept in `(-π, π]`.
    pub rotation: f32,
    pub basis: TangentBasis,
}

impl StampInfo {
    pub fn new(uv: Vec2, size: f32, basis: TangentBasis) -> Self {
        Self {
            uv,
            size: Vec2::splat(size),
            rotation: 0.0,
            basis,
        }
    }

    /// Where the lattice sits in the texture plane for this placement.
    pub fn lattice_transform(&self) -> LatticeTransform {
        LatticeTransform::new(self.uv, self.size, self.rotation)
    }
}

/// Normalize an angle into `(-π, π]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decal_geometry::fallback_basis;

    #[test]
    fn wrap_angle_range() {
        for angle in [-10.0, -PI, -1.0, 0.0, 1.0, PI, 3.5, 7.0, 100.0] {
            let wrapped = wrap_angle(angle);
            assert!(wrapped > -PI && wrapped <= PI, "{angle} -> {wrapped}");
            let turns = (wrapped - angle).rem_euclid(TAU);
            assert!(turns < 1e-3 || turns > TAU - 1e-3);
        }
        assert_eq!(wrap_angle(-PI), PI);
        assert!((wrap_angle(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn new_stamp_is_square_and_unrotated() {
        let stamp = StampInfo::new(Vec2::splat(0.5), 0.4, fallback_basis(Vec3::Z));
        assert_eq!(stamp.size, Vec2::splat(0.4));
        assert_eq!(stamp.rotation, 0.0);
        assert_eq!(StampId::PRIMARY.to_string(), "stamp-1");

        let transform = stamp.lattice_transform();
        assert!(transform.local_to_uv(Vec2::ZERO).abs_diff_eq(Vec2::splat(0.5), 1e-6));
        assert!(transform.local_to_uv(Vec2::new(0.5, 0.5)).abs_diff_eq(Vec2::new(0.7, 0.3), 1e-6));
    }
}
