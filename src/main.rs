use bevy::{asset::UnapprovedPathMode, prelude::*};
use decal_editor::{EditorConfig, EditorPlugin};

fn main() -> AppExit {
    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Decal Editor".into(),
                        ..default()
                    }),
                    ..default()
                })
                // Dropped images live anywhere on disk.
                .set(AssetPlugin {
                    unapproved_path_mode: UnapprovedPathMode::Allow,
                    ..default()
                }),
        )
        // Loaded after DefaultPlugins so the log subscriber is installed.
        .insert_resource(EditorConfig::load_or_default())
        .add_plugins(EditorPlugin)
        .run()
}
