use bevy::prelude::*;

use crate::interaction::{Tool, ToolContext, ToolError};

/// Drags the widget root in the camera plane. Only the widget moves; the
/// next stamp change snaps it back onto the anchor.
#[derive(Default)]
pub struct DragTool {
    armed: Option<DragGesture>,
}

#[derive(Clone, Copy)]
struct DragGesture {
    start_ndc: Vec2,
    initial_position: Vec3,
}

impl Tool for DragTool {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext) -> Result<(), ToolError> {
        let Some(widget) = ctx.session.widget() else {
            return Ok(());
        };
        self.armed = Some(DragGesture {
            start_ndc: ctx.pointer.ndc,
            initial_position: widget.position,
        });
        ctx.session.orbit_enabled = false;
        Ok(())
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext) -> Result<(), ToolError> {
        let Some(gesture) = self.armed else {
            return Ok(());
        };
        let delta = (ctx.pointer.ndc - gesture.start_ndc) * 2.0;
        let offset = ctx.view.right() * delta.x + ctx.view.up() * delta.y;
        if let Some(widget) = ctx.session.widget_mut() {
            widget.position = gesture.initial_position + offset;
        }
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
    fn drags_widget_in_camera_plane_only() {
        let geometry = quad();
        let surface = SurfaceRef::new(&geometry, Affine3A::IDENTITY);
        let view = front_view(Vec3::new(0.5, 0.5, 3.0), Vec3::new(0.5, 0.5, 0.0));
        let config = EditorConfig::default();
        let mut session = session_with_stamp(surface, Vec2::splat(0.5), Some(WidgetKind::Move));
        let mut ctx = ToolContext::new(&mut session, Some(surface), view, &config, Duration::ZERO);

        let mut tool = DragTool::default();
        ctx.pointer = sample_ndc(&view, Vec2::ZERO);
        tool.on_pointer_down(&mut ctx).unwrap();
        assert!(!ctx.session.orbit_enabled);

        ctx.pointer = sample_ndc(&view, Vec2::new(0.1, -0.05));
        tool.on_pointer_move(&mut ctx).unwrap();
        let widget = ctx.session.widget().unwrap().position;
        assert!(widget.abs_diff_eq(Vec3::new(0.7, 0.4, 0.0), 1e-4), "{widget}");
        assert!(ctx.session.stamp().unwrap().uv.abs_diff_eq(Vec2::splat(0.5), 1e-6));

        tool.on_pointer_up(&mut ctx);
        assert!(ctx.session.orbit_enabled);
    }

    #[test]
    fn without_widget_is_a_no_op() {
        let view = front_view(Vec3::new(0.5, 0.5, 3.0), Vec3::new(0.5, 0.5, 0.0));
        let config = EditorConfig::default();
        let mut session = EditorSession::default();
        let mut ctx = ToolContext::new(&mut session, None, view, &config, Duration::ZERO);
        let mut tool = DragTool::default();
        tool.on_pointer_down(&mut ctx).unwrap();
        assert!(ctx.session.orbit_enabled);
        tool.on_pointer_move(&mut ctx).unwrap();
    }
}
