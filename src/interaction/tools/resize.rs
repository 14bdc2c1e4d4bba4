use bevy::prelude::*;

use super::{stamp_and_widget, widget_screen_axes};
use crate::{
    interaction::{Tool, ToolContext, ToolError},
    widget::HandleType,
};

/// Scales the stamp from a scale-widget handle.
pub struct ResizeTool {
    handle: HandleType,
    armed: Option<ResizeGesture>,
}

#[derive(Clone, Copy)]
struct ResizeGesture {
    start_ndc: Vec2,
    initial_size: Vec2,
}

impl ResizeTool {
    pub fn new(handle: HandleType) -> Self {
        Self {
            handle,
            armed: None,
        }
    }
}

/// New stamp size for a drag whose NDC delta projects to `u`/`v` along the
/// widget axes. X and Y handles scale one dimension, the centre both by the
/// mean of the two components. Each dimension is clamped to `[min, 1]`.
pub fn resized(
    initial: Vec2,
    handle: HandleType,
    u: f32,
    v: f32,
    scaling_factor: f32,
    min: f32,
) -> Vec2 {
    let factor = |component: f32| 1.0 + component * scaling_factor;
    let size = match handle {
        HandleType::X => Vec2::new(initial.x * factor(u), initial.y),
        HandleType::Y => Vec2::new(initial.x, initial.y * factor(v)),
        HandleType::Center => initial * factor((u + v) * 0.5),
    };
    size.clamp(Vec2::splat(min), Vec2::ONE)
}

impl Tool for ResizeTool {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext) -> Result<(), ToolError> {
        let (stamp, _) = stamp_and_widget(ctx)?;
        self.armed = Some(ResizeGesture {
            start_ndc: ctx.pointer.ndc,
            initial_size: stamp.size,
        });
        ctx.session.orbit_enabled = false;
        Ok(())
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext) -> Result<(), ToolError> {
        let Some(gesture) = self.armed else {
            return Ok(());
        };
        let (mut stamp, widget) = stamp_and_widget(ctx)?;

        let delta = ctx.pointer.ndc - gesture.start_ndc;
        let (screen_u, screen_v) = widget_screen_axes(&ctx.view, &widget);
        stamp.size = resized(
            gesture.initial_size,
            self.handle,
            delta.dot(screen_u),
            delta.dot(screen_v),
            ctx.config.resize_scaling_factor,
            ctx.config.min_size_uv,
        );
        ctx.session.update_stamp(stamp, None, ctx.surface);
        Ok(())
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext) {
        self.armed = None;
        ctx.session.orbit_enabled = true;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bevy::math::Affine3A;

    use super::*;
    use crate::{
        config::EditorConfig,
        session::EditorSession,
        surface::SurfaceRef,
        test_support::{front_view, quad, sample_ndc, session_with_stamp},
        widget::WidgetKind,
    };

    #[test]
    fn centre_handle_scales_both_axes() {
        let geometry = quad();
        let surface = SurfaceRef::new(&geometry, Affine3A::IDENTITY);
        let view = front_view(Vec3::new(0.5, 0.5, 3.0), Vec3::new(0.5, 0.5, 0.0));
        let config = EditorConfig::default();
        let mut session = session_with_stamp(surface, Vec2::splat(0.5), Some(WidgetKind::Scale));
        let mut ctx = ToolContext::new(&mut session, Some(surface), view, &config, Duration::ZERO);

        let mut tool = ResizeTool::new(HandleType::Center);
        ctx.pointer = sample_ndc(&view, Vec2::ZERO);
        tool.on_pointer_down(&mut ctx).unwrap();
        assert!(!ctx.session.orbit_enabled);

        ctx.pointer = sample_ndc(&view, Vec2::new(0.1, 0.1));
        tool.on_pointer_move(&mut ctx).unwrap();
        let size = ctx.session.stamp().unwrap().size;
        assert!(size.abs_diff_eq(Vec2::splat(0.52), 1e-4), "{size}");

        tool.on_pointer_up(&mut ctx);
        assert!(ctx.session.orbit_enabled);
    }

    #[test]
    fn resize_after_drag_snaps_widget_back_to_anchor() {
        let geometry = quad();
        let surface = SurfaceRef::new(&geometry, Affine3A::IDENTITY);
        let view = front_view(Vec3::new(0.5, 0.5, 3.0), Vec3::new(0.5, 0.5, 0.0));
        let config = EditorConfig::default();
        let mut session = session_with_stamp(surface, Vec2::splat(0.5), Some(WidgetKind::Scale));
        let mut ctx = ToolContext::new(&mut session, Some(surface), view, &config, Duration::ZERO);

        let mut drag = super::super::DragTool::default();
        ctx.pointer = sample_ndc(&view, Vec2::ZERO);
        drag.on_pointer_down(&mut ctx).unwrap();
        ctx.pointer = sample_ndc(&view, Vec2::new(0.1, 0.1));
        drag.on_pointer_move(&mut ctx).unwrap();
        drag.on_pointer_up(&mut ctx);
        assert!(ctx.session.widget().unwrap().position.distance(Vec3::new(0.5, 0.5, 0.0)) > 0.1);

        let mut tool = ResizeTool::new(HandleType::Center);
        ctx.pointer = sample_ndc(&view, Vec2::ZERO);
        tool.on_pointer_down(&mut ctx).unwrap();
        ctx.pointer = sample_ndc(&view, Vec2::new(0.05, 0.05));
        tool.on_pointer_move(&mut ctx).unwrap();

        let stamp = ctx.session.stamp().unwrap();
        let on_surface = surface.position_from_uv(stamp.uv).unwrap();
        let anchor = ctx.session.anchor_handle().unwrap().position;
        assert!(anchor.abs_diff_eq(on_surface, 1e-5), "{anchor}");
        assert!(ctx.session.widget().unwrap().position.abs_diff_eq(on_surface, 1e-5));
    }

    #[test]
    fn axis_handles_scale_one_dimension() {
        let x = resized(Vec2::splat(0.4), HandleType::X, 0.1, 0.5, 3.0, 0.01);
        assert!(x.abs_diff_eq(Vec2::new(0.52, 0.4), 1e-6));
        let y = resized(Vec2::splat(0.4), HandleType::Y, 0.5, -0.1, 3.0, 0.01);
        assert!(y.abs_diff_eq(Vec2::new(0.4, 0.28), 1e-6));
    }

    #[test]
    fn size_stays_clamped() {
        for handle in [HandleType::X, HandleType::Y, HandleType::Center] {
            for component in [-100.0, -1.0, -0.3, 0.0, 0.2, 5.0, 1e6] {
                let size = resized(Vec2::new(0.4, 0.7), handle, component, -component, 3.0, 0.01);
                assert!(size.cmpge(Vec2::splat(0.01)).all() && size.cmple(Vec2::ONE).all());
            }
        }
    }

    #[test]
    fn arming_without_widget_is_an_error() {
        let geometry = quad();
        let surface = SurfaceRef::new(&geometry, Affine3A::IDENTITY);
        let view = front_view(Vec3::new(0.5, 0.5, 3.0), Vec3::new(0.5, 0.5, 0.0));
        let config = EditorConfig::default();

        let mut session = EditorSession::default();
        let mut ctx = ToolContext::new(&mut session, Some(surface), view, &config, Duration::ZERO);
        let mut tool = ResizeTool::new(HandleType::X);
        assert_eq!(tool.on_pointer_down(&mut ctx), Err(ToolError::MissingStamp));

        let mut session = session_with_stamp(surface, Vec2::splat(0.5), None);
        let mut ctx = ToolContext::new(&mut session, Some(surface), view, &config, Duration::ZERO);
        assert_eq!(tool.on_pointer_down(&mut ctx), Err(ToolError::MissingWidget));
    }
}
