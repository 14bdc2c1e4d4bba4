use bevy::prelude::*;

use crate::{session::EditorSession, widget::WidgetHandle};

/// Hover classification of one pointer sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HoverState {
    pub widget: Option<WidgetHandle>,
    pub anchor: bool,
}

/// Tracks which widget handle and whether the anchor handle are under the
/// pointer. Only colliders are tested, never visible geometry or the surface.
#[derive(Debug, Default)]
pub struct HoverStateManager {
    last: HoverState,
}

impl HoverStateManager {
    pub fn current(&self) -> HoverState {
        self.last
    }

    /// Classify `ray` and write the result into the session only when it
    /// differs from what is already shown. Returns whether anything changed.
    pub fn update(&mut self, ray: Option<Ray3d>, session: &mut EditorSession) -> bool {
        let state = match ray {
            Some(ray) => HoverState {
                widget: session
                    .widget()
                    .and_then(|widget| widget.pick_collider(ray))
                    .map(|(collider, _)| collider.handle),
                anchor: session
                    .anchor_handle()
                    .is_some_and(|anchor| anchor.pick(ray).is_some()),
            },
            None => HoverState::default(),
        };

        if state == self.last && Self::shown(session) == state {
            return false;
        }
        self.last = state;

        if let Some(widget) = session.widget_mut() {
            widget.hovered = state.widget;
        }
        if let Some(anchor) = session.anchor_handle_mut() {
            anchor.hovered = state.anchor;
        }
        session.mark_hover_changed();
        true
    }

    /// What the session currently displays; differs from `last` after the
    /// widget is replaced or removed.
    fn shown(session: &EditorSession) -> HoverState {
        HoverState {
            widget: session.widget().and_then(|widget| widget.hovered),
            anchor: session.anchor_handle().is_some_and(|anchor| anchor.hovered),
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::Affine3A;

    use super::*;
    use crate::{
        surface::SurfaceRef,
        test_support::{quad, ready_session},
        widget::{HandleType, WidgetKind},
    };

    fn down_at(x: f32, y: f32) -> Option<Ray3d> {
        Some(Ray3d::new(Vec3::new(x, y, 2.0), Dir3::NEG_Z))
    }

    #[test]
    fn pushes_only_on_change() {
        let geometry = quad();
        let surface = SurfaceRef::new(&geometry, Affine3A::IDENTITY);
        let mut session = ready_session();
        let hit = surface.raycast(down_at(0.5, 0.5).unwrap()).unwrap();
        session.place_stamp(&hit, surface, &default());
        session.open_widget(WidgetKind::Move, Some(surface));

        let mut hover = HoverStateManager::default();
        let start = session.hover_revision();

        assert!(hover.update(down_at(0.86, 0.5), &mut session));
        assert_eq!(
            session.widget().unwrap().hovered,
            Some(WidgetHandle::Axis(HandleType::X))
        );
        assert!(!hover.update(down_at(0.87, 0.5), &mut session));
        assert_eq!(session.hover_revision(), start + 1);

        // Centre: both the centre collider and the anchor collider.
        assert!(hover.update(down_at(0.5, 0.5), &mut session));
        assert!(hover.current().anchor);
        assert_eq!(
            hover.current().widget,
            Some(WidgetHandle::Axis(HandleType::Center))
        );

        assert!(hover.update(None, &mut session));
        assert_eq!(hover.current(), HoverState::default());
        assert!(!session.anchor_handle().unwrap().hovered);
    }

    #[test]
    fn replaced_widget_gets_current_hover() {
        let geometry = quad();
        let surface = SurfaceRef::new(&geometry, Affine3A::IDENTITY);
        let mut session = ready_session();
        let hit = surface.raycast(down_at(0.5, 0.5).unwrap()).unwrap();
        session.place_stamp(&hit, surface, &default());

        let mut hover = HoverStateManager::default();
        assert!(hover.update(down_at(0.5, 0.5), &mut session));

        session.open_widget(WidgetKind::Scale, Some(surface));
        assert!(hover.update(down_at(0.5, 0.5), &mut session));
        assert_eq!(
            session.widget().unwrap().hovered,
            Some(WidgetHandle::Axis(HandleType::Center))
        );
    }
}
