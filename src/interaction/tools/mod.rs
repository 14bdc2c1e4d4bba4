mod brush;
mod drag;
mod move_tool;
mod orbit;
mod resize;
mod rotate;
mod selection;

pub use brush::BrushTool;
pub use drag::DragTool;
pub use move_tool::MoveTool;
pub use orbit::OrbitTool;
pub use resize::{ResizeTool, resized};
pub use rotate::{RotateTool, rotated};
pub use selection::SelectionTool;

use bevy::prelude::*;

use super::{ToolContext, ToolError};
use crate::{stamp::StampInfo, viewport_util::CameraView, widget::WidgetState};

/// Stamp and widget a widget-driven tool needs on every event.
fn stamp_and_widget(ctx: &ToolContext) -> Result<(StampInfo, WidgetState), ToolError> {
    let stamp = *ctx.session.stamp().ok_or(ToolError::MissingStamp)?;
    let widget = *ctx.session.widget().ok_or(ToolError::MissingWidget)?;
    Ok((stamp, widget))
}

/// The widget's X and Y axes as unit directions in NDC, reprojected with
/// the current camera.
fn widget_screen_axes(view: &CameraView, widget: &WidgetState) -> (Vec2, Vec2) {
    (
        view.project_axis(widget.position, widget.x_axis()),
        view.project_axis(widget.position, widget.y_axis()),
    )
}
