use crate::interaction::{Tool, ToolContext, ToolError};

/// Leaves the gesture to the orbit camera.
pub struct OrbitTool;

impl Tool for OrbitTool {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext) -> Result<(), ToolError> {
        ctx.session.orbit_enabled = true;
        Ok(())
    }

    fn on_pointer_move(&mut self, _ctx: &mut ToolContext) -> Result<(), ToolError> {
        Ok(())
    }

    fn on_pointer_up(&mut self, _ctx: &mut ToolContext) {}
}
