pub mod spawn;

use std::f32::consts::FRAC_PI_2;

use bevy::{
    math::bounding::{Aabb3d, BoundingSphere, RayCast3d},
    prelude::*,
};
use decal_geometry::{EPSILON, TangentBasis};
use serde::{Deserialize, Serialize};

use crate::hit_test::{HitKind, HitResult};

pub use spawn::WidgetSpawnPlugin;

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

pub const COLOR_X: Color = Color::srgb(1.0, 0.0, 0.0);
pub const COLOR_Y: Color = Color::srgb(0.0, 1.0, 0.0);
pub const COLOR_CENTER: Color = Color::srgb(1.0, 1.0, 0.0);
pub const COLOR_ROTATE: Color = Color::srgb(0.0, 0.5, 1.0);
pub const COLOR_HOVERED: Color = Color::WHITE;

// ---------------------------------------------------------------------------
// Dimensions
// ---------------------------------------------------------------------------

/// Sizes of an arrow-style widget (scale and move), in world units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrowDimensions {
    pub length: f32,
    pub head_length: f32,
    pub head_width: f32,
    pub center_radius: f32,
    pub handle_radius: f32,
    pub collider_radius: f32,
}

impl ArrowDimensions {
    fn shaft_radius(&self) -> f32 {
        self.head_width * 0.15
    }
}

pub const SCALE_DIMENSIONS: ArrowDimensions = ArrowDimensions {
    length: 0.2,
    head_length: 0.05,
    head_width: 0.03,
    center_radius: 0.02,
    handle_radius: 0.015,
    collider_radius: 0.04,
};

pub const MOVE_DIMENSIONS: ArrowDimensions = ArrowDimensions {
    length: 0.36,
    head_length: 0.09,
    head_width: 0.054,
    center_radius: 0.036,
    handle_radius: 0.027,
    collider_radius: 0.072,
};

pub const ROTATE_RING_RADIUS: f32 = 0.27;
pub const ROTATE_RING_HALF_WIDTH: f32 = 0.018;
pub const ROTATE_HANDLE_RADIUS: f32 = 0.036;
pub const ROTATE_COLLIDER_RADIUS: f32 = 0.072;

// ---------------------------------------------------------------------------
// Widget kinds
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Scale,
    #[default]
    Move,
    Rotate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleType {
    X,
    Y,
    Center,
}

/// A pickable region of a widget: one of the axis handles, or the rotate ring handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WidgetHandle {
    Axis(HandleType),
    Rotate,
}

impl WidgetHandle {
    pub fn color(self) -> Color {
        match self {
            WidgetHandle::Axis(HandleType::X) => COLOR_X,
            WidgetHandle::Axis(HandleType::Y) => COLOR_Y,
            WidgetHandle::Axis(HandleType::Center) => COLOR_CENTER,
            WidgetHandle::Rotate => COLOR_ROTATE,
        }
    }
}

/// Invisible pick sphere in widget-local space, larger than the visible handle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WidgetCollider {
    pub handle: WidgetHandle,
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PartShape {
    /// Cylinder along local +Y.
    Shaft { length: f32, radius: f32 },
    /// Cone along local +Y, tip at `+length / 2`.
    Cone { length: f32, radius: f32 },
    Sphere { radius: f32 },
    /// Flat annulus in the XY plane.
    Ring { radius: f32, half_width: f32 },
}

/// Visible geometry of a widget, placed in widget-local space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WidgetPart {
    pub handle: WidgetHandle,
    pub shape: PartShape,
    pub transform: Transform,
}

impl WidgetKind {
    pub fn label(self) -> &'static str {
        match self {
            WidgetKind::Scale => "scale",
            WidgetKind::Move => "move",
            WidgetKind::Rotate => "rotate",
        }
    }

    fn arrow_dimensions(self) -> Option<ArrowDimensions> {
        match self {
            WidgetKind::Scale => Some(SCALE_DIMENSIONS),
            WidgetKind::Move => Some(MOVE_DIMENSIONS),
            WidgetKind::Rotate => None,
        }
    }

    /// Hit classification produced when one of this widget's colliders is picked.
    pub fn hit_kind(self) -> HitKind {
        match self {
            WidgetKind::Scale => HitKind::ResizeHandle,
            WidgetKind::Move => HitKind::MoveHandle,
            WidgetKind::Rotate => HitKind::RotateHandle,
        }
    }

    /// Axis role of a picked handle, if this widget kind has axes.
    pub fn handle_type(self, handle: WidgetHandle) -> Option<HandleType> {
        match (self, handle) {
            (WidgetKind::Rotate, _) | (_, WidgetHandle::Rotate) => None,
            (_, WidgetHandle::Axis(axis)) => Some(axis),
        }
    }

    pub fn hit_result(self, collider: &WidgetCollider, point: Vec3, distance: f32) -> HitResult {
        HitResult {
            kind: self.hit_kind(),
            handle_type: self.handle_type(collider.handle),
            point: Some(point),
            distance,
            surface_hit: None,
        }
    }

    pub fn colliders(self) -> Vec<WidgetCollider> {
        match self.arrow_dimensions() {
            Some(dims) => [
                (HandleType::X, Vec3::X * dims.length),
                (HandleType::Y, Vec3::Y * dims.length),
                (HandleType::Center, Vec3::ZERO),
            ]
            .into_iter()
            .map(|(axis, center)| WidgetCollider {
                handle: WidgetHandle::Axis(axis),
                center,
                radius: dims.collider_radius,
            })
            .collect(),
            None => vec![WidgetCollider {
                handle: WidgetHandle::Rotate,
                center: Vec3::X * ROTATE_RING_RADIUS,
                radius: ROTATE_COLLIDER_RADIUS,
            }],
        }
    }

    pub fn parts(self) -> Vec<WidgetPart> {
        let Some(dims) = self.arrow_dimensions() else {
            return vec![
                WidgetPart {
                    handle: WidgetHandle::Rotate,
                    shape: PartShape::Ring {
                        radius: ROTATE_RING_RADIUS,
                        half_width: ROTATE_RING_HALF_WIDTH,
                    },
                    transform: Transform::IDENTITY,
                },
                WidgetPart {
                    handle: WidgetHandle::Rotate,
                    shape: PartShape::Sphere {
                        radius: ROTATE_HANDLE_RADIUS,
                    },
                    transform: Transform::from_translation(Vec3::X * ROTATE_RING_RADIUS),
                },
            ];
        };

        let shaft_length = dims.length - dims.head_length;
        let mut parts = Vec::with_capacity(7);
        for (axis, direction, to_axis) in [
            (HandleType::X, Vec3::X, Quat::from_rotation_z(-FRAC_PI_2)),
            (HandleType::Y, Vec3::Y, Quat::IDENTITY),
        ] {
            let handle = WidgetHandle::Axis(axis);
            parts.push(WidgetPart {
                handle,
                shape: PartShape::Shaft {
                    length: shaft_length,
                    radius: dims.shaft_radius(),
                },
                transform: Transform::from_translation(direction * shaft_length * 0.5)
                    .with_rotation(to_axis),
            });
            parts.push(WidgetPart {
                handle,
                shape: PartShape::Cone {
                    length: dims.head_length,
                    radius: dims.head_width * 0.5,
                },
                transform: Transform::from_translation(
                    direction * (dims.length - dims.head_length * 0.5),
                )
                .with_rotation(to_axis),
            });
            parts.push(WidgetPart {
                handle,
                shape: PartShape::Sphere {
                    radius: dims.handle_radius,
                },
                transform: Transform::from_translation(direction * dims.length),
            });
        }
        parts.push(WidgetPart {
            handle: WidgetHandle::Axis(HandleType::Center),
            shape: PartShape::Sphere {
                radius: dims.center_radius,
            },
            transform: Transform::IDENTITY,
        });
        parts
    }
}

impl WidgetPart {
    /// Distance along a widget-local ray to this part's pick volume.
    fn intersect(&self, ray: Ray3d) -> Option<f32> {
        let cast = RayCast3d::from_ray(ray, f32::MAX);
        let center = self.transform.translation;
        match self.shape {
            PartShape::Sphere { radius } => {
                cast.sphere_intersection_at(&BoundingSphere::new(center, radius))
            }
            PartShape::Shaft { length, radius } | PartShape::Cone { length, radius } => {
                let half = (self.transform.rotation * Vec3::new(radius, length * 0.5, radius)).abs();
                cast.aabb_intersection_at(&Aabb3d::new(center, half))
            }
            PartShape::Ring { radius, half_width } => {
                if ray.direction.z.abs() < EPSILON {
                    return None;
                }
                let t = (center.z - ray.origin.z) / ray.direction.z;
                if t < 0.0 {
                    return None;
                }
                let point = ray.get_point(t);
                let from_center = (point - center).truncate().length();
                ((from_center - radius).abs() <= half_width).then_some(t)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Widget state
// ---------------------------------------------------------------------------

/// The manipulation widget attached to the stamp. Pure value: the scene-graph
/// entities are written from it by [`spawn::WidgetSpawnPlugin`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WidgetState {
    pub kind: WidgetKind,
    pub position: Vec3,
    pub rotation: Quat,
    pub hovered: Option<WidgetHandle>,
}

impl WidgetState {
    pub fn new(kind: WidgetKind, position: Vec3, rotation: Quat) -> Self {
        Self {
            kind,
            position,
            rotation,
            hovered: None,
        }
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.position).with_rotation(self.rotation)
    }

    /// World-space direction of the widget's local X axis.
    pub fn x_axis(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn y_axis(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    fn to_local(&self, ray: Ray3d) -> Option<Ray3d> {
        let inverse = self.rotation.inverse();
        let direction = Dir3::new(inverse * *ray.direction).ok()?;
        Some(Ray3d::new(inverse * (ray.origin - self.position), direction))
    }

    /// Nearest collider along a world ray, with its hit distance.
    pub fn pick_collider(&self, ray: Ray3d) -> Option<(WidgetCollider, f32)> {
        let local = self.to_local(ray)?;
        let cast = RayCast3d::from_ray(local, f32::MAX);
        self.kind
            .colliders()
            .into_iter()
            .filter_map(|collider| {
                cast.sphere_intersection_at(&BoundingSphere::new(collider.center, collider.radius))
                    .map(|distance| (collider, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Nearest visible part along a world ray.
    pub fn pick_body(&self, ray: Ray3d) -> Option<(WidgetPart, f32)> {
        let local = self.to_local(ray)?;
        self.kind
            .parts()
            .into_iter()
            .filter_map(|part| part.intersect(local).map(|distance| (part, distance)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

/// Widget orientation for a stamp frame: `u`/`v` turned by `-rotation`
/// within their own plane, `v` re-orthogonalized against `u`.
///
/// The third axis is `u × v` so the result is a proper rotation even when
/// the UV frame is mirrored relative to the surface normal.
pub fn widget_orientation(basis: &TangentBasis, rotation: f32) -> Quat {
    let u = basis.u_axis.normalize_or(Vec3::X);
    let v = basis.v_axis.normalize_or(Vec3::Y);
    let (sin, cos) = rotation.sin_cos();
    let rotated_u = u * cos - v * sin;
    let rotated_v = u * sin + v * cos;

    let corrected_v = (rotated_v - rotated_u * rotated_u.dot(rotated_v)).normalize_or(rotated_v);
    TangentBasis {
        u_axis: rotated_u,
        v_axis: corrected_v,
        normal: basis.normal,
    }
    .rotation()
}

#[cfg(test)]
mod tests {
    use std::f32::consts::FRAC_PI_4;

    use super::*;
    use decal_geometry::fallback_basis;

    fn ray_towards(target: Vec3) -> Ray3d {
        let origin = target + Vec3::Z * 3.0;
        Ray3d::new(origin, Dir3::NEG_Z)
    }

    #[test]
    fn move_widget_colliders_classify_handles() {
        let widget = WidgetState::new(WidgetKind::Move, Vec3::new(1.0, 2.0, 0.0), Quat::IDENTITY);

        let (collider, _) = widget
            .pick_collider(ray_towards(widget.position + Vec3::X * 0.36))
            .unwrap();
        assert_eq!(collider.handle, WidgetHandle::Axis(HandleType::X));

        let (collider, _) = widget.pick_collider(ray_towards(widget.position)).unwrap();
        let hit = widget.kind.hit_result(&collider, widget.position, 3.0);
        assert_eq!(hit.kind, HitKind::MoveHandle);
        assert_eq!(hit.handle_type, Some(HandleType::Center));
    }

    #[test]
    fn colliders_are_larger_than_visible_handles() {
        let widget = WidgetState::new(WidgetKind::Scale, Vec3::ZERO, Quat::IDENTITY);
        // Inside the 0.04 collider but outside the 0.015 handle sphere.
        let near_handle = Vec3::new(0.2, 0.03, 0.0);
        assert!(widget.pick_collider(ray_towards(near_handle)).is_some());
        assert!(widget.pick_body(ray_towards(near_handle)).is_none());
    }

    #[test]
    fn shaft_is_body_but_not_collider() {
        let widget = WidgetState::new(WidgetKind::Move, Vec3::ZERO, Quat::IDENTITY);
        let mid_shaft = Vec3::new(0.18, 0.0, 0.0);
        assert!(widget.pick_collider(ray_towards(mid_shaft)).is_none());
        let (part, _) = widget.pick_body(ray_towards(mid_shaft)).unwrap();
        assert_eq!(part.handle, WidgetHandle::Axis(HandleType::X));
    }

    #[test]
    fn rotate_widget_ring_and_handle() {
        let widget = WidgetState::new(WidgetKind::Rotate, Vec3::ZERO, Quat::IDENTITY);
        let (collider, _) = widget.pick_collider(ray_towards(Vec3::X * 0.27)).unwrap();
        assert_eq!(widget.kind.handle_type(collider.handle), None);
        assert_eq!(widget.kind.hit_kind(), HitKind::RotateHandle);

        let on_ring = Vec3::new(0.0, -0.27, 0.0);
        assert!(widget.pick_collider(ray_towards(on_ring)).is_none());
        assert!(widget.pick_body(ray_towards(on_ring)).is_some());
        assert!(widget.pick_body(ray_towards(Vec3::ZERO)).is_none());
    }

    #[test]
    fn picking_follows_widget_rotation() {
        let rotation = Quat::from_rotation_z(FRAC_PI_2);
        let widget = WidgetState::new(WidgetKind::Move, Vec3::ZERO, rotation);
        // Local +X now points along world +Y.
        let (collider, _) = widget.pick_collider(ray_towards(Vec3::Y * 0.36)).unwrap();
        assert_eq!(collider.handle, WidgetHandle::Axis(HandleType::X));
    }

    #[test]
    fn orientation_turns_axes_against_rotation() {
        let basis = fallback_basis(Vec3::Z);
        let unrotated = widget_orientation(&basis, 0.0);
        assert!((unrotated * Vec3::X).abs_diff_eq(basis.u_axis, 1e-5));
        assert!((unrotated * Vec3::Y).abs_diff_eq(basis.v_axis, 1e-5));

        let turned = widget_orientation(&basis, FRAC_PI_4);
        let expected_x = (basis.u_axis - basis.v_axis).normalize();
        assert!((turned * Vec3::X).abs_diff_eq(expected_x, 1e-5));
        assert!(((turned * Vec3::Z).dot(Vec3::Z) - 1.0).abs() < 1e-5);
    }
}
