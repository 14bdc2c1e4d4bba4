use bevy::{
    prelude::*,
    window::{CursorIcon, PrimaryWindow, SystemCursorIcon},
};

use crate::{EditorSystems, interaction::InteractionManager, session::EditorSession};

pub struct CursorPlugin;

impl Plugin for CursorPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, update_cursor.in_set(EditorSystems::Commit));
    }
}

/// Grabbing while a tool owns the gesture, crosshair when a click would
/// place or select, the default arrow otherwise.
fn cursor_for(manipulating: bool, image_ready: bool) -> SystemCursorIcon {
    if manipulating {
        SystemCursorIcon::Grabbing
    } else if image_ready {
        SystemCursorIcon::Crosshair
    } else {
        SystemCursorIcon::Default
    }
}

fn update_cursor(
    mut commands: Commands,
    manager: Res<InteractionManager>,
    session: Res<EditorSession>,
    window: Single<(Entity, Option<&CursorIcon>), With<PrimaryWindow>>,
) {
    let (window, current) = *window;
    let wanted = CursorIcon::System(cursor_for(
        manager.state().is_manipulating(),
        session.image_ready,
    ));
    if current != Some(&wanted) {
        commands.entity(window).insert(wanted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manipulation_wins_over_readiness() {
        assert_eq!(cursor_for(true, true), SystemCursorIcon::Grabbing);
        assert_eq!(cursor_for(true, false), SystemCursorIcon::Grabbing);
        assert_eq!(cursor_for(false, true), SystemCursorIcon::Crosshair);
        assert_eq!(cursor_for(false, false), SystemCursorIcon::Default);
    }
}
