use bevy::prelude::*;

use super::{stamp_and_widget, widget_screen_axes};
use crate::{
    interaction::{Tool, ToolContext, ToolError},
    widget::HandleType,
};

/// Moves the stamp anchor. Axis handles slide along the rotated widget axes
/// in UV space, the centre handle snaps to the surface under the cursor.
pub struct MoveTool {
    handle: HandleType,
    armed: Option<MoveGesture>,
}

#[derive(Clone, Copy)]
struct MoveGesture {
    start_ndc: Vec2,
    initial_uv: Vec2,
}

impl MoveTool {
    pub fn new(handle: HandleType) -> Self {
        Self {
            handle,
            armed: None,
        }
    }

    fn snap_to_cursor(ctx: &mut ToolContext) -> Result<(), ToolError> {
        let (mut stamp, _) = stamp_and_widget(ctx)?;
        let surface = ctx.surface()?;
        // Off the surface the gesture stays armed and the stamp stays put.
        let Some(hit) = ctx.pointer.ray.and_then(|ray| surface.raycast(ray)) else {
            return Ok(());
        };
        let Some(uv) = hit.uv else {
            return Ok(());
        };

        stamp.uv = uv.clamp(Vec2::ZERO, Vec2::ONE);
        stamp.basis = surface.basis_at(hit.face_index, hit.normal);
        ctx.session.update_stamp(stamp, Some(hit.point), Some(surface));
        Ok(())
    }
}

/// UV offset for sliding `amount` along the X or Y widget axis of a stamp
/// rotated by `rotation`. Widget axes turn by `-rotation` in UV space.
pub fn axis_delta(handle: HandleType, amount: f32, rotation: f32) -> Vec2 {
    let (sin, cos) = (-rotation).sin_cos();
    match handle {
        HandleType::X => Vec2::new(amount * cos, amount * sin),
        HandleType::Y => Vec2::new(-amount * sin, amount * cos),
        HandleType::Center => Vec2::ZERO,
    }
}

impl Tool for MoveTool {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext) -> Result<(), ToolError> {
        let (stamp, _) = stamp_and_widget(ctx)?;
        self.armed = Some(MoveGesture {
            start_ndc: ctx.pointer.ndc,
            initial_uv: stamp.uv,
        });
        ctx.session.orbit_enabled = false;
        Ok(())
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext) -> Result<(), ToolError> {
        let Some(gesture) = self.armed else {
            return Ok(());
        };
        if self.handle == HandleType::Center {
            return Self::snap_to_cursor(ctx);
        }

        let (mut stamp, widget) = stamp_and_widget(ctx)?;
        let surface = ctx.surface()?;

        let delta = ctx.pointer.ndc - gesture.start_ndc;
        let (screen_u, screen_v) = widget_screen_axes(&ctx.view, &widget);
        let along = match self.handle {
            HandleType::X => delta.dot(screen_u),
            _ => delta.dot(screen_v),
        };
        let amount = along * ctx.config.move_sensitivity;
        let uv = (gesture.initial_uv + axis_delta(self.handle, amount, stamp.rotation))
            .clamp(Vec2::ZERO, Vec2::ONE);

        let Some(face) = surface.face_index_from_uv(uv) else {
            return Ok(());
        };
        let Some(point) = surface.position_in_face(face, uv) else {
            return Ok(());
        };
        if let Some(normal) = surface.face_normal(face) {
            stamp.basis = surface.basis_at(face, normal);
        }
        stamp.uv = uv;
        ctx.session.update_stamp(stamp, Some(point), Some(surface));
        Ok(())
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext) {
        self.armed = None;
        ctx.session.orbit_enabled = true;
    }
}

#[cfg(test)]
mod tests {
    use std::{f32::consts::FRAC_PI_2, time::Duration};

    use bevy::math::Affine3A;

    use super::*;
    use crate::{
        config::EditorConfig,
        surface::SurfaceRef,
        test_support::{front_view, quad, sample_at, sample_ndc, session_with_stamp},
        widget::WidgetKind,
    };

    #[test]
    fn axis_delta_follows_rotated_widget_axes() {
        assert!(axis_delta(HandleType::X, 0.1, 0.0).abs_diff_eq(Vec2::new(0.1, 0.0), 1e-6));
        assert!(axis_delta(HandleType::Y, 0.1, 0.0).abs_diff_eq(Vec2::new(0.0, 0.1), 1e-6));
        assert!(axis_delta(HandleType::X, 0.1, FRAC_PI_2).abs_diff_eq(Vec2::new(0.0, -0.1), 1e-6));
        assert_eq!(axis_delta(HandleType::Center, 0.1, 1.0), Vec2::ZERO);
    }

    #[test]
    fn x_handle_slides_along_u_and_clamps() {
        let geometry = quad();
        let surface = SurfaceRef::new(&geometry, Affine3A::IDENTITY);
        let view = front_view(Vec3::new(0.5, 0.5, 3.0), Vec3::new(0.5, 0.5, 0.0));
        let config = EditorConfig::default();
        let mut session = session_with_stamp(surface, Vec2::splat(0.5), Some(WidgetKind::Move));
        let mut ctx = ToolContext::new(&mut session, Some(surface), view, &config, Duration::ZERO);

        let mut tool = MoveTool::new(HandleType::X);
        ctx.pointer = sample_ndc(&view, Vec2::ZERO);
        tool.on_pointer_down(&mut ctx).unwrap();

        ctx.pointer = sample_ndc(&view, Vec2::new(0.2, 0.3));
        tool.on_pointer_move(&mut ctx).unwrap();
        let uv = ctx.session.stamp().unwrap().uv;
        assert!(uv.abs_diff_eq(Vec2::new(0.52, 0.5), 1e-4), "{uv}");
        let widget = ctx.session.widget().unwrap().position;
        assert!(widget.abs_diff_eq(Vec3::new(0.52, 0.5, 0.0), 1e-4), "{widget}");
        let anchor = ctx.session.anchor_handle().unwrap().position;
        assert!(anchor.abs_diff_eq(widget, 1e-6));

        // Deltas are measured from the armed position, not accumulated.
        ctx.pointer = sample_ndc(&view, Vec2::new(0.9, 0.0));
        tool.on_pointer_move(&mut ctx).unwrap();
        ctx.pointer = sample_ndc(&view, Vec2::new(0.9, 0.0));
        tool.on_pointer_move(&mut ctx).unwrap();
        assert!((ctx.session.stamp().unwrap().uv.x - 0.59).abs() < 1e-4);

        let mut session = session_with_stamp(surface, Vec2::new(0.95, 0.5), Some(WidgetKind::Move));
        let mut ctx = ToolContext::new(&mut session, Some(surface), view, &config, Duration::ZERO);
        let mut tool = MoveTool::new(HandleType::X);
        ctx.pointer = sample_ndc(&view, Vec2::new(-0.9, 0.0));
        tool.on_pointer_down(&mut ctx).unwrap();
        ctx.pointer = sample_ndc(&view, Vec2::new(0.9, 0.0));
        tool.on_pointer_move(&mut ctx).unwrap();
        assert_eq!(ctx.session.stamp().unwrap().uv.x, 1.0);
    }

    #[test]
    fn y_handle_slides_along_v() {
        let geometry = quad();
        let surface = SurfaceRef::new(&geometry, Affine3A::IDENTITY);
        let view = front_view(Vec3::new(0.5, 0.5, 3.0), Vec3::new(0.5, 0.5, 0.0));
        let config = EditorConfig::default();
        let mut session = session_with_stamp(surface, Vec2::splat(0.5), Some(WidgetKind::Move));
        let mut ctx = ToolContext::new(&mut session, Some(surface), view, &config, Duration::ZERO);

        let mut tool = MoveTool::new(HandleType::Y);
        ctx.pointer = sample_ndc(&view, Vec2::ZERO);
        tool.on_pointer_down(&mut ctx).unwrap();
        ctx.pointer = sample_ndc(&view, Vec2::new(0.4, -0.3));
        tool.on_pointer_move(&mut ctx).unwrap();
        let uv = ctx.session.stamp().unwrap().uv;
        assert!(uv.abs_diff_eq(Vec2::new(0.5, 0.47), 1e-4), "{uv}");
    }

    #[test]
    fn centre_handle_snaps_to_surface_hit() {
        let geometry = quad();
        let surface = SurfaceRef::new(&geometry, Affine3A::IDENTITY);
        let view = front_view(Vec3::new(0.5, 0.5, 3.0), Vec3::new(0.5, 0.5, 0.0));
        let config = EditorConfig::default();
        let mut session = session_with_stamp(surface, Vec2::splat(0.5), Some(WidgetKind::Move));
        let mut ctx = ToolContext::new(&mut session, Some(surface), view, &config, Duration::ZERO);

        let mut tool = MoveTool::new(HandleType::Center);
        ctx.pointer = sample_at(&view, Vec3::new(0.5, 0.5, 0.0));
        tool.on_pointer_down(&mut ctx).unwrap();
        assert!(!ctx.session.orbit_enabled);

        ctx.pointer = sample_at(&view, Vec3::new(0.25, 0.75, 0.0));
        tool.on_pointer_move(&mut ctx).unwrap();
        let uv = ctx.session.stamp().unwrap().uv;
        assert!(uv.abs_diff_eq(Vec2::new(0.25, 0.75), 1e-3), "{uv}");
        let widget = ctx.session.widget().unwrap().position;
        assert!(widget.abs_diff_eq(Vec3::new(0.25, 0.75, 0.0), 1e-3));

        // Off the surface nothing changes and the tool stays armed.
        ctx.pointer = sample_at(&view, Vec3::new(1.5, 1.5, 0.0));
        tool.on_pointer_move(&mut ctx).unwrap();
        assert!(ctx.session.stamp().unwrap().uv.abs_diff_eq(uv, 1e-6));

        ctx.pointer = sample_at(&view, Vec3::new(0.6, 0.4, 0.0));
        tool.on_pointer_move(&mut ctx).unwrap();
        assert!(ctx.session.stamp().unwrap().uv.abs_diff_eq(Vec2::new(0.6, 0.4), 1e-3));
    }

    #[test]
    fn centre_handle_without_surface_is_an_error() {
        let geometry = quad();
        let surface = SurfaceRef::new(&geometry, Affine3A::IDENTITY);
        let view = front_view(Vec3::new(0.5, 0.5, 3.0), Vec3::new(0.5, 0.5, 0.0));
        let config = EditorConfig::default();
        let mut session = session_with_stamp(surface, Vec2::splat(0.5), Some(WidgetKind::Move));
        let mut ctx = ToolContext::new(&mut session, None, view, &config, Duration::ZERO);

        let mut tool = MoveTool::new(HandleType::Center);
        ctx.pointer = sample_ndc(&view, Vec2::ZERO);
        tool.on_pointer_down(&mut ctx).unwrap();
        assert_eq!(tool.on_pointer_move(&mut ctx), Err(ToolError::MissingSurface));
    }
}
