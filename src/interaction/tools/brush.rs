use bevy::prelude::*;

use crate::{
    config::EditorConfig,
    interaction::{RateLimiter, Tool, ToolContext, ToolError},
    viewport_util::CameraView,
};

/// Warps the lattice by dragging across the stamp.
///
/// The anchor UV and the tangent axes are captured once on arm, so the
/// influence field stays centred and the frame cannot rotate underfoot.
/// Moves are throttled; each applied sample measures its screen delta from
/// the previous applied sample, so dropped events lose no motion.
pub struct BrushTool {
    limiter: RateLimiter,
    armed: Option<BrushStroke>,
}

#[derive(Clone, Copy)]
struct BrushStroke {
    anchor_uv: Vec2,
    anchor_point: Vec3,
    u_axis: Vec3,
    v_axis: Vec3,
    previous_ndc: Vec2,
}

impl BrushTool {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            limiter: RateLimiter::new(config.brush_interval()),
            armed: None,
        }
    }
}

/// Screen direction of a world axis at `origin`, with X stretched by the
/// aspect ratio so both screen components share a unit.
fn aspect_axis(view: &CameraView, origin: Vec3, axis: Vec3) -> Vec2 {
    let projected = view.project(origin + axis).truncate() - view.project(origin).truncate();
    Vec2::new(projected.x * view.aspect_ratio(), projected.y).normalize_or_zero()
}

impl Tool for BrushTool {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext) -> Result<(), ToolError> {
        if !ctx.session.has_stamp() {
            return Err(ToolError::MissingStamp);
        }
        if ctx.session.lattice().is_none() {
            return Err(ToolError::MissingLattice);
        }
        let surface = ctx.surface()?;
        let hit = ctx
            .pointer
            .ray
            .and_then(|ray| surface.raycast(ray))
            .ok_or(ToolError::MissingUv)?;
        let uv = hit.uv.ok_or(ToolError::MissingUv)?;
        let basis = surface.basis_at(hit.face_index, hit.normal);

        self.armed = Some(BrushStroke {
            anchor_uv: uv,
            anchor_point: hit.point,
            u_axis: basis.u_axis,
            v_axis: basis.v_axis,
            previous_ndc: ctx.pointer.ndc,
        });
        self.limiter.reset();
        if ctx.config.show_brush_strokes {
            ctx.session.start_brush_stroke();
            ctx.session.record_brush_point(uv);
        }
        ctx.session.orbit_enabled = false;
        Ok(())
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext) -> Result<(), ToolError> {
        let Some(stroke) = &mut self.armed else {
            return Ok(());
        };
        if !self.limiter.try_fire(ctx.now) {
            return Ok(());
        }
        if !ctx.session.has_stamp() {
            return Err(ToolError::MissingStamp);
        }

        let aspect = ctx.view.aspect_ratio();
        let delta = ctx.pointer.ndc - stroke.previous_ndc;
        let delta = Vec2::new(delta.x * aspect, delta.y);
        let screen_u = aspect_axis(&ctx.view, stroke.anchor_point, stroke.u_axis);
        let screen_v = aspect_axis(&ctx.view, stroke.anchor_point, stroke.v_axis);
        let direction =
            Vec2::new(delta.dot(screen_u), delta.dot(screen_v)) * ctx.config.brush_strength;

        ctx.session
            .deform_lattice(stroke.anchor_uv, direction, ctx.config.brush_radius)
            .ok_or(ToolError::MissingLattice)?;

        if ctx.config.show_brush_strokes
            && let Some(surface) = ctx.surface
            && let Some(uv) = ctx
                .pointer
                .ray
                .and_then(|ray| surface.raycast(ray))
                .and_then(|hit| hit.uv)
        {
            ctx.session.record_brush_point(uv);
        }
        stroke.previous_ndc = ctx.pointer.ndc;
        Ok(())
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext) {
        self.armed = None;
        ctx.session.orbit_enabled = true;
    }
}
