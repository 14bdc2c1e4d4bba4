use bevy::prelude::*;

use super::stamp_and_widget;
use crate::{
    interaction::{Tool, ToolContext, ToolError},
    stamp::wrap_angle,
};

/// Spins the stamp around its anchor by the screen-space angle the cursor
/// sweeps around the widget centre.
#[derive(Default)]
pub struct RotateTool {
    armed: Option<RotateGesture>,
}

#[derive(Clone, Copy)]
struct RotateGesture {
    start_ndc: Vec2,
    center_ndc: Vec2,
    initial_rotation: f32,
}

/// Rotation after sweeping from `start` to `current` around `center`, all in
/// NDC. Screen Y runs opposite to texture V, hence the negated sweep.
pub fn rotated(initial: f32, center: Vec2, start: Vec2, current: Vec2) -> f32 {
    let angle_of = |p: Vec2| (p.y - center.y).atan2(p.x - center.x);
    let delta = -(angle_of(current) - angle_of(start));
    wrap_angle(initial + delta)
}

impl Tool for RotateTool {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext) -> Result<(), ToolError> {
        let (stamp, widget) = stamp_and_widget(ctx)?;
        self.armed = Some(RotateGesture {
            start_ndc: ctx.pointer.ndc,
            center_ndc: ctx.view.project(widget.position).truncate(),
            initial_rotation: stamp.rotation,
        });
        ctx.session.orbit_enabled = false;
        Ok(())
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext) -> Result<(), ToolError> {
        let Some(gesture) = self.armed else {
            return Ok(());
        };
        let (mut stamp, _) = stamp_and_widget(ctx)?;

        stamp.rotation = rotated(
            gesture.initial_rotation,
            gesture.center_ndc,
            gesture.start_ndc,
            ctx.pointer.ndc,
        );
        ctx.session.update_stamp(stamp, None, ctx.surface);
        Ok(())
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext) {
        self.armed = None;
        ctx.session.orbit_enabled = true;
    }
}
