use crate::{
    config::EditorConfig,
    hit_test::{HitKind, HitResult},
    session::EditorSession,
    widget::HandleType,
};

use super::{
    InteractionState, Tool,
    tools::{BrushTool, DragTool, MoveTool, OrbitTool, ResizeTool, RotateTool, SelectionTool},
};

/// Session facts the strategy predicates look at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StrategyState {
    pub brush_mode: bool,
    pub has_stamp: bool,
    pub has_lattice: bool,
    pub image_ready: bool,
}

impl StrategyState {
    pub fn from_session(session: &EditorSession) -> Self {
        Self {
            brush_mode: session.brush_mode,
            has_stamp: session.has_stamp(),
            has_lattice: session.lattice().is_some(),
            image_ready: session.image_ready,
        }
    }
}

/// One entry of the dispatch table: a predicate, a constructor and the
/// interaction state the constructed tool puts the manager in.
pub struct ToolStrategy {
    pub state: InteractionState,
    pub can_handle: fn(&HitResult, &StrategyState) -> bool,
    pub create: fn(&HitResult, &EditorConfig) -> Box<dyn Tool>,
}

/// Checked before [`TOOL_STRATEGIES`]; only eligible in brush mode, and only
/// with a UV under the pointer to anchor the stroke on.
pub static BRUSH_STRATEGY: ToolStrategy = ToolStrategy {
    state: InteractionState::Brush,
    can_handle: |hit, state| {
        state.brush_mode
            && state.has_stamp
            && state.has_lattice
            && matches!(hit.kind, HitKind::SelectableObject | HitKind::ImageHandle)
            && hit.surface_hit.is_some_and(|surface_hit| surface_hit.uv.is_some())
    },
    create: |_, config| Box::new(BrushTool::new(config)),
};

/// Scanned top to bottom, first match wins. The order is the precedence.
pub static TOOL_STRATEGIES: [ToolStrategy; 6] = [
    ToolStrategy {
        state: InteractionState::Resize,
        can_handle: |hit, _| hit.kind == HitKind::ResizeHandle,
        create: |hit, _| Box::new(ResizeTool::new(handle_or_center(hit))),
    },
    ToolStrategy {
        state: InteractionState::Rotate,
        can_handle: |hit, _| hit.kind == HitKind::RotateHandle,
        create: |_, _| Box::new(RotateTool::default()),
    },
    ToolStrategy {
        state: InteractionState::Move,
        can_handle: |hit, _| hit.kind == HitKind::MoveHandle,
        create: |hit, _| Box::new(MoveTool::new(handle_or_center(hit))),
    },
    ToolStrategy {
        state: InteractionState::Drag,
        can_handle: |hit, _| hit.kind == HitKind::WidgetBody,
        create: |_, _| Box::new(DragTool::default()),
    },
    ToolStrategy {
        state: InteractionState::Idle,
        can_handle: |hit, state| hit.kind == HitKind::SelectableObject && state.image_ready,
        create: |hit, _| Box::new(SelectionTool::new(hit.surface_hit)),
    },
    ToolStrategy {
        state: InteractionState::Orbit,
        can_handle: |hit, state| {
            hit.kind == HitKind::Empty
                || (hit.kind == HitKind::SelectableObject && !state.image_ready)
        },
        create: |_, _| Box::new(OrbitTool),
    },
];

fn handle_or_center(hit: &HitResult) -> HandleType {
    hit.handle_type.unwrap_or(HandleType::Center)
}

/// The strategy for a pointer-down, or `None` when nothing should activate
/// (for example the anchor handle outside brush mode).
pub fn find_strategy(hit: &HitResult, state: &StrategyState) -> Option<&'static ToolStrategy> {
    if (BRUSH_STRATEGY.can_handle)(hit, state) {
        return Some(&BRUSH_STRATEGY);
    }
    TOOL_STRATEGIES
        .iter()
        .find(|strategy| (strategy.can_handle)(hit, state))
}
