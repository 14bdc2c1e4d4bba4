pub mod anchor_handle;
pub mod brush_overlay;
pub mod config;
pub mod cursor;
pub mod hover;
pub mod image_source;
pub mod interaction;
pub mod lattice_render;
pub mod selection;
pub mod session;
pub mod shortcuts;
pub mod stamp;
pub mod surface;
pub mod viewport;
pub mod viewport_util;
pub mod widget;

#[cfg(test)]
mod test_support;

use bevy::prelude::*;
use decal_camera::OrbitCameraSystems;

pub use config::EditorConfig;
pub use interaction::{InteractionManager, InteractionState};
pub use session::EditorSession;

/// Frame phases of the editor. Pointer input runs the tools against the
/// session during `Input`; `Commit` writes the session into the scene.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum EditorSystems {
    Input,
    Commit,
}

pub struct EditorPlugin;

impl Plugin for EditorPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EditorConfig>()
            .init_resource::<EditorSession>()
            .init_resource::<InteractionManager>()
            .configure_sets(
                Update,
                (
                    EditorSystems::Input.before(OrbitCameraSystems),
                    EditorSystems::Commit.after(EditorSystems::Input),
                ),
            )
            .add_plugins((
                viewport::ViewportPlugin,
                image_source::ImageSourcePlugin,
                anchor_handle::AnchorHandlePlugin,
                widget::WidgetSpawnPlugin,
                lattice_render::LatticeRenderPlugin,
                shortcuts::ShortcutsPlugin,
                cursor::CursorPlugin,
                brush_overlay::BrushOverlayPlugin,
            ));
    }
}
