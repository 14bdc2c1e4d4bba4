use decal_geometry::SurfaceHit;

use crate::interaction::{Tool, ToolContext, ToolError};

/// Surface click with the image ready. Places the stamp when none exists;
/// selecting an existing stamp already happened during dispatch.
pub struct SelectionTool {
    hit: Option<SurfaceHit>,
}

impl SelectionTool {
    pub fn new(hit: Option<SurfaceHit>) -> Self {
        Self { hit }
    }
}

impl Tool for SelectionTool {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext) -> Result<(), ToolError> {
        if ctx.session.has_stamp() {
            return Ok(());
        }
        if let (Some(hit), Some(surface)) = (&self.hit, ctx.surface) {
            ctx.session.place_stamp(hit, surface, ctx.config);
        }
        Ok(())
    }

    fn on_pointer_move(&mut self, _ctx: &mut ToolContext) -> Result<(), ToolError> {
        Ok(())
    }

    fn on_pointer_up(&mut self, _ctx: &mut ToolContext) {}
}
