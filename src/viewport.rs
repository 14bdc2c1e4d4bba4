use bevy::{prelude::*, window::PrimaryWindow};
use bevy_infinite_grid::{InfiniteGrid, InfiniteGridPlugin};
use decal_camera::{OrbitCameraPlugin, OrbitCameraSettings};
use decal_geometry::{BentTube, SurfaceGeometry, bent_tube_mesh};

use crate::{
    EditorSystems,
    config::EditorConfig,
    interaction::{InteractionManager, PointerEvent, ToolContext, ToolError},
    session::EditorSession,
    surface::{DecalSurface, SurfaceRef},
    viewport_util::{CameraView, window_to_viewport_cursor},
};

/// Marker on the camera the editor is viewed and picked through.
#[derive(Component)]
pub struct EditorCamera;

pub struct ViewportPlugin;

impl Plugin for ViewportPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((OrbitCameraPlugin, InfiniteGridPlugin))
            .add_systems(Startup, setup_viewport)
            .add_systems(
                Update,
                (handle_pointer_input, sync_orbit_enabled)
                    .chain()
                    .in_set(EditorSystems::Input),
            );
    }
}

fn setup_viewport(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let tube = BentTube::default();
    let mesh = bent_tube_mesh(&tube);
    match SurfaceGeometry::from_mesh(&mesh) {
        Ok(geometry) => {
            commands.spawn((
                Name::new("Decal Surface"),
                DecalSurface { geometry },
                Mesh3d(meshes.add(mesh)),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::WHITE,
                    perceptual_roughness: 0.6,
                    ..default()
                })),
                Transform::default(),
            ));
        }
        Err(err) => error!("Failed to build decal surface: {err}"),
    }

    let orbit = OrbitCameraSettings {
        focus: Vec3::Y * tube.height * 0.5,
        radius: 5.0,
        ..default()
    };
    commands.spawn((
        Name::new("Editor Camera"),
        EditorCamera,
        Camera3d::default(),
        orbit.transform(),
        orbit,
    ));

    commands.spawn((
        Name::new("Key Light"),
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 8.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        Name::new("Fill Light"),
        DirectionalLight {
            illuminance: 2_000.0,
            ..default()
        },
        Transform::from_xyz(-4.0, 3.0, -6.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn(InfiniteGrid);
}

/// Feeds the left mouse button and cursor into the interaction manager as
/// viewport-space pointer events.
fn handle_pointer_input(
    mouse: Res<ButtonInput<MouseButton>>,
    window: Single<&Window, With<PrimaryWindow>>,
    camera: Single<(&Camera, &GlobalTransform), With<EditorCamera>>,
    surfaces: Query<(&DecalSurface, &GlobalTransform)>,
    time: Res<Time<Real>>,
    config: Res<EditorConfig>,
    mut session: ResMut<EditorSession>,
    mut manager: ResMut<InteractionManager>,
    mut last_position: Local<Option<Vec2>>,
) {
    let (camera, camera_transform) = *camera;
    let Some(view) = CameraView::from_camera(camera, camera_transform) else {
        return;
    };
    let position = window
        .cursor_position()
        .and_then(|cursor| window_to_viewport_cursor(cursor, camera));

    let surface = surfaces
        .iter()
        .next()
        .map(|(surface, transform)| SurfaceRef::from_entity(surface, transform));
    let mut ctx = ToolContext::new(&mut session, surface, view, &config, time.elapsed());

    if mouse.just_pressed(MouseButton::Left)
        && let Some(position) = position
    {
        report(manager.handle_pointer_down(&PointerEvent::primary(position), &mut ctx));
    }

    if let Some(position) = position
        && *last_position != Some(position)
    {
        report(manager.handle_pointer_move(&PointerEvent::primary(position), &mut ctx));
    }

    if mouse.just_released(MouseButton::Left) {
        let released_at = position.or(*last_position).unwrap_or(view.viewport_size() * 0.5);
        manager.handle_pointer_up(&PointerEvent::primary(released_at), &mut ctx);
    }

    if position.is_some() {
        *last_position = position;
    }
}

/// A tool reaching one of these means dispatch let through a hit it should
/// have rejected.
fn report(result: Result<(), ToolError>) {
    if let Err(err) = result {
        error!("Tool failed: {err}");
        debug_assert!(false, "tool precondition violated: {err}");
    }
}

fn sync_orbit_enabled(
    session: Res<EditorSession>,
    mut cameras: Query<&mut OrbitCameraSettings, With<EditorCamera>>,
) {
    for mut settings in &mut cameras {
        if settings.enabled != session.orbit_enabled {
            settings.enabled = session.orbit_enabled;
        }
    }
}
