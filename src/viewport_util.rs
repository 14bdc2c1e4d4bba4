use bevy::{math::Affine3A, prelude::*};

/// Snapshot of the camera taken once per pointer event, so hover and the
/// active tool see the same projection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    clip_from_world: Mat4,
    world_from_clip: Mat4,
    world_from_view: Affine3A,
    viewport_size: Vec2,
}

impl CameraView {
    pub fn new(clip_from_view: Mat4, world_from_view: Affine3A, viewport_size: Vec2) -> Self {
        let clip_from_world = clip_from_view * Mat4::from(world_from_view.inverse());
        Self {
            clip_from_world,
            world_from_clip: clip_from_world.inverse(),
            world_from_view,
            viewport_size: viewport_size.max(Vec2::ONE),
        }
    }

    pub fn from_camera(camera: &Camera, transform: &GlobalTransform) -> Option<Self> {
        let viewport_size = camera.logical_viewport_size()?;
        Some(Self::new(camera.clip_from_view(), transform.affine(), viewport_size))
    }

    pub fn viewport_size(&self) -> Vec2 {
        self.viewport_size
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.viewport_size.x / self.viewport_size.y
    }

    /// Camera right and up directions in world space.
    pub fn right(&self) -> Vec3 {
        self.world_from_view.transform_vector3(Vec3::X).normalize_or(Vec3::X)
    }

    pub fn up(&self) -> Vec3 {
        self.world_from_view.transform_vector3(Vec3::Y).normalize_or(Vec3::Y)
    }

    /// Viewport logical pixels (origin top-left, Y down) to NDC (Y up).
    pub fn viewport_to_ndc(&self, position: Vec2) -> Vec2 {
        let normalized = position / self.viewport_size;
        Vec2::new(normalized.x * 2.0 - 1.0, 1.0 - normalized.y * 2.0)
    }

    /// World-space pick ray through an NDC point.
    pub fn ndc_ray(&self, ndc: Vec2) -> Option<Ray3d> {
        // Reverse-Z: depth 1 is the near plane.
        let near = self.world_from_clip.project_point3(ndc.extend(1.0));
        let far = self.world_from_clip.project_point3(ndc.extend(f32::EPSILON));
        if !near.is_finite() || !far.is_finite() {
            return None;
        }
        let direction = Dir3::new(far - near).ok()?;
        Some(Ray3d::new(near, direction))
    }

    /// NDC of a world point; `z` is the reverse-Z depth.
    pub fn project(&self, world: Vec3) -> Vec3 {
        self.clip_from_world.project_point3(world)
    }

    /// Screen direction, in NDC, of a world axis leaving `origin`.
    /// Returns zero when the axis points straight at the camera.
    pub fn project_axis(&self, origin: Vec3, axis: Vec3) -> Vec2 {
        let start = self.project(origin).truncate();
        let end = self.project(origin + axis).truncate();
        (end - start).normalize_or_zero()
    }
}

/// Convert a window cursor position to coordinates local to the camera's
/// viewport, or `None` when the cursor is outside it.
pub(crate) fn window_to_viewport_cursor(cursor_pos: Vec2, camera: &Camera) -> Option<Vec2> {
    let Some(rect) = camera.logical_viewport_rect() else {
        return Some(cursor_pos);
    };
    rect.contains(cursor_pos).then(|| cursor_pos - rect.min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::front_view;

    #[test]
    fn ndc_conversion_flips_y() {
        let view = front_view(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        assert_eq!(view.viewport_to_ndc(Vec2::ZERO), Vec2::new(-1.0, 1.0));
        assert_eq!(view.viewport_to_ndc(Vec2::splat(400.0)), Vec2::ZERO);
        assert_eq!(view.viewport_to_ndc(Vec2::new(800.0, 800.0)), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn centre_ray_points_at_target() {
        let eye = Vec3::new(1.0, 2.0, 5.0);
        let view = front_view(eye, Vec3::ZERO);
        let ray = view.ndc_ray(Vec2::ZERO).unwrap();
        let expected = (Vec3::ZERO - eye).normalize();
        assert!(ray.direction.as_vec3().abs_diff_eq(expected, 1e-4));
        assert!(ray.origin.distance(eye) < 0.2);
    }

    #[test]
    fn ray_and_projection_agree() {
        let view = front_view(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        let point = Vec3::new(0.4, -0.3, 0.0);
        let ndc = view.project(point).truncate();
        let ray = view.ndc_ray(ndc).unwrap();
        let t = (point - ray.origin).dot(*ray.direction);
        assert!(ray.get_point(t).abs_diff_eq(point, 1e-4));
    }

    #[test]
    fn projected_axes_follow_camera() {
        let view = front_view(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO);
        assert!(view.project_axis(Vec3::ZERO, Vec3::X).abs_diff_eq(Vec2::X, 1e-5));
        assert!(view.project_axis(Vec3::ZERO, Vec3::Y).abs_diff_eq(Vec2::Y, 1e-5));
        assert!(view.right().abs_diff_eq(Vec3::X, 1e-5));
        assert!(view.up().abs_diff_eq(Vec3::Y, 1e-5));
    }
}
