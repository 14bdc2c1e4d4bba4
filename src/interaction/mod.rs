//! Pointer-driven tool state machine.
//!
//! Each pointer-down is hit-tested, resolved to a tool by the ordered
//! strategy list, and the tool then owns the gesture until pointer-up.

pub mod error;
pub mod strategy;
pub mod throttle;
pub mod tools;

use std::time::Duration;

use bevy::prelude::*;

pub use error::ToolError;
pub use strategy::{StrategyState, ToolStrategy};
pub use throttle::RateLimiter;

use crate::{
    config::EditorConfig,
    hit_test::{HitKind, HitResult, hit_test},
    hover::HoverStateManager,
    session::EditorSession,
    stamp::StampId,
    surface::SurfaceRef,
    viewport_util::CameraView,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InteractionState {
    #[default]
    Idle,
    Orbit,
    Drag,
    Resize,
    Move,
    Rotate,
    Brush,
}

impl InteractionState {
    /// Whether a manipulation tool owns the gesture.
    pub fn is_manipulating(self) -> bool {
        !matches!(self, InteractionState::Idle | InteractionState::Orbit)
    }
}

/// Device-independent pointer event, `position` in viewport logical pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub position: Vec2,
    pub button: MouseButton,
    pub pointer_id: u64,
}

impl PointerEvent {
    pub fn primary(position: Vec2) -> Self {
        Self {
            position,
            button: MouseButton::Left,
            pointer_id: 0,
        }
    }
}

/// Pointer position and pick ray computed once per event and shared by
/// hover tracking and the active tool.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerSample {
    pub position: Vec2,
    pub ndc: Vec2,
    pub ray: Option<Ray3d>,
}

impl PointerSample {
    pub fn new(event: &PointerEvent, view: &CameraView) -> Self {
        let ndc = view.viewport_to_ndc(event.position);
        Self {
            position: event.position,
            ndc,
            ray: view.ndc_ray(ndc),
        }
    }
}

/// Everything a tool may read or mutate while handling one event.
pub struct ToolContext<'a> {
    pub session: &'a mut EditorSession,
    pub surface: Option<SurfaceRef<'a>>,
    pub view: CameraView,
    pub config: &'a EditorConfig,
    /// Monotonic time of the event.
    pub now: Duration,
    pub pointer: PointerSample,
}

impl<'a> ToolContext<'a> {
    pub fn new(
        session: &'a mut EditorSession,
        surface: Option<SurfaceRef<'a>>,
        view: CameraView,
        config: &'a EditorConfig,
        now: Duration,
    ) -> Self {
        Self {
            session,
            surface,
            view,
            config,
            now,
            pointer: PointerSample::default(),
        }
    }

    pub fn surface(&self) -> Result<SurfaceRef<'a>, ToolError> {
        self.surface.ok_or(ToolError::MissingSurface)
    }
}

/// One gesture handler. `on_pointer_up` must always disarm, whatever
/// happened earlier in the gesture.
pub trait Tool: Send + Sync {
    fn on_pointer_down(&mut self, ctx: &mut ToolContext) -> Result<(), ToolError>;
    fn on_pointer_move(&mut self, ctx: &mut ToolContext) -> Result<(), ToolError>;
    fn on_pointer_up(&mut self, ctx: &mut ToolContext);
}

/// Owns the active tool and the hover tracker. At most one tool is active.
#[derive(Resource, Default)]
pub struct InteractionManager {
    state: InteractionState,
    active_tool: Option<Box<dyn Tool>>,
    hover: HoverStateManager,
}

impl InteractionManager {
    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn has_active_tool(&self) -> bool {
        self.active_tool.is_some()
    }

    pub fn handle_pointer_down(
        &mut self,
        event: &PointerEvent,
        ctx: &mut ToolContext,
    ) -> Result<(), ToolError> {
        if event.button != MouseButton::Left {
            return Ok(());
        }
        ctx.pointer = PointerSample::new(event, &ctx.view);

        let hit = match ctx.pointer.ray {
            Some(ray) => hit_test(
                ray,
                ctx.session.widget(),
                ctx.surface,
                ctx.session.anchor_handle(),
            ),
            None => HitResult::empty(),
        };
        apply_selection(&hit, ctx.session);

        let state = StrategyState::from_session(ctx.session);
        let Some(strategy) = strategy::find_strategy(&hit, &state) else {
            return Ok(());
        };

        self.deactivate(ctx);
        debug!("Pointer down on {:?}, activating {:?}", hit.kind, strategy.state);
        let mut tool = (strategy.create)(&hit, ctx.config);
        self.state = strategy.state;
        let result = tool.on_pointer_down(ctx);
        self.active_tool = Some(tool);
        result
    }

    pub fn handle_pointer_move(
        &mut self,
        event: &PointerEvent,
        ctx: &mut ToolContext,
    ) -> Result<(), ToolError> {
        ctx.pointer = PointerSample::new(event, &ctx.view);
        self.hover.update(ctx.pointer.ray, ctx.session);

        match &mut self.active_tool {
            Some(tool) => tool.on_pointer_move(ctx),
            None => Ok(()),
        }
    }

    pub fn handle_pointer_up(&mut self, event: &PointerEvent, ctx: &mut ToolContext) {
        ctx.pointer = PointerSample::new(event, &ctx.view);
        self.deactivate(ctx);
    }

    /// Disarm and drop the active tool, if any, and give the camera back.
    fn deactivate(&mut self, ctx: &mut ToolContext) {
        if let Some(mut tool) = self.active_tool.take() {
            tool.on_pointer_up(ctx);
        }
        self.state = InteractionState::Idle;
        ctx.session.orbit_enabled = true;
    }
}

/// Selection changes a pointer-down causes regardless of which tool runs.
fn apply_selection(hit: &HitResult, session: &mut EditorSession) {
    match hit.kind {
        HitKind::ImageHandle => session.select(StampId::PRIMARY),
        HitKind::SelectableObject if session.has_stamp() => session.select(StampId::PRIMARY),
        HitKind::Empty
            if !session.selection.is_empty()
                && session.widget().is_none()
                && !session.brush_mode =>
        {
            session.clear_selection();
        }
        _ => {}
    }
}
