use bevy::prelude::*;

use crate::{
    EditorSystems,
    interaction::InteractionManager,
    session::EditorSession,
    surface::{DecalSurface, SurfaceRef},
    widget::WidgetKind,
};

/// Keyboard commands for the stamp.
///
/// - W / E / R: open the move, rotate or scale widget on the selected stamp
/// - Escape: close the widget
/// - B: toggle brush mode
/// - X: reset the brush warp
/// - Delete / Backspace: delete the stamp
pub struct ShortcutsPlugin;

impl Plugin for ShortcutsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            handle_stamp_keys
                .after(EditorSystems::Input)
                .before(EditorSystems::Commit),
        );
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StampCommand {
    OpenWidget(WidgetKind),
    ExitWidget,
    ToggleBrush,
    ResetWarp,
    Delete,
}

fn command_for(keyboard: &ButtonInput<KeyCode>) -> Option<StampCommand> {
    let ctrl = keyboard.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]);
    if ctrl {
        return None;
    }
    [
        (KeyCode::KeyW, StampCommand::OpenWidget(WidgetKind::Move)),
        (KeyCode::KeyE, StampCommand::OpenWidget(WidgetKind::Rotate)),
        (KeyCode::KeyR, StampCommand::OpenWidget(WidgetKind::Scale)),
        (KeyCode::Escape, StampCommand::ExitWidget),
        (KeyCode::KeyB, StampCommand::ToggleBrush),
        (KeyCode::KeyX, StampCommand::ResetWarp),
        (KeyCode::Delete, StampCommand::Delete),
        (KeyCode::Backspace, StampCommand::Delete),
    ]
    .into_iter()
    .find_map(|(key, command)| keyboard.just_pressed(key).then_some(command))
}

fn handle_stamp_keys(
    keyboard: Res<ButtonInput<KeyCode>>,
    manager: Res<InteractionManager>,
    surfaces: Query<(&DecalSurface, &GlobalTransform)>,
    mut session: ResMut<EditorSession>,
) {
    // Commands would pull state out from under an active gesture.
    if manager.has_active_tool() && manager.state().is_manipulating() {
        return;
    }
    let Some(command) = command_for(&keyboard) else {
        return;
    };
    let surface = surfaces
        .iter()
        .next()
        .map(|(surface, transform)| SurfaceRef::from_entity(surface, transform));

    match command {
        StampCommand::OpenWidget(kind) => {
            if session.is_stamp_selected() {
                session.open_widget(kind, surface);
            }
        }
        StampCommand::ExitWidget => {
            session.exit_widget();
        }
        StampCommand::ToggleBrush => {
            session.toggle_brush_mode();
        }
        StampCommand::ResetWarp => {
            session.reset_lattice();
        }
        StampCommand::Delete => {
            session.delete_stamp();
        }
    }
}
