use std::path::PathBuf;

use bevy::{asset::LoadState, prelude::*, window::PrimaryWindow};

use crate::{
    EditorSystems,
    config::EditorConfig,
    session::EditorSession,
    surface::{DecalSurface, SurfaceRef},
    viewport::EditorCamera,
    viewport_util::{CameraView, window_to_viewport_cursor},
};

/// Loads the image that gets stamped and keeps `EditorSession::image_ready`
/// in step with its load state.
pub struct ImageSourcePlugin;

impl Plugin for ImageSourcePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ImageSource>()
            .add_systems(Startup, load_startup_image)
            .add_systems(
                Update,
                (handle_file_drop, track_image_readiness, place_dropped_image)
                    .chain()
                    .before(EditorSystems::Input),
            );
    }
}

#[derive(Resource, Default)]
pub struct ImageSource {
    pub handle: Option<Handle<Image>>,
    pub path: Option<PathBuf>,
    /// A drop asked for a stamp as soon as the image is ready.
    place_when_ready: bool,
    /// Last readiness reported to the log, so it is logged once per change.
    reported: Option<bool>,
}

impl ImageSource {
    pub fn load(&mut self, asset_server: &AssetServer, path: PathBuf) {
        info!("Loading image {}", path.display());
        self.handle = Some(asset_server.load(path.clone()));
        self.path = Some(path);
        self.reported = None;
    }
}

fn load_startup_image(
    config: Res<EditorConfig>,
    asset_server: Res<AssetServer>,
    mut source: ResMut<ImageSource>,
) {
    if let Some(path) = &config.image_path {
        source.load(&asset_server, PathBuf::from(path));
    }
}

fn handle_file_drop(
    mut drops: MessageReader<FileDragAndDrop>,
    asset_server: Res<AssetServer>,
    mut source: ResMut<ImageSource>,
    mut session: ResMut<EditorSession>,
) {
    for drop in drops.read() {
        if let FileDragAndDrop::DroppedFile { path_buf, .. } = drop {
            source.load(&asset_server, path_buf.clone());
            source.place_when_ready = !session.has_stamp();
            session.image_ready = false;
        }
    }
}

fn track_image_readiness(
    asset_server: Res<AssetServer>,
    mut source: ResMut<ImageSource>,
    mut session: ResMut<EditorSession>,
) {
    let Some(state) = source.handle.as_ref().map(|handle| asset_server.load_state(handle)) else {
        return;
    };
    let ready = match state {
        LoadState::Loaded => {
            if source.reported != Some(true) {
                info!("Image ready");
                source.reported = Some(true);
            }
            true
        }
        LoadState::Failed(err) => {
            if source.reported != Some(false) {
                error!("Failed to load image: {err}");
                source.reported = Some(false);
            }
            false
        }
        _ => false,
    };
    if session.image_ready != ready {
        session.image_ready = ready;
    }
}

/// Places the stamp for a dropped image where the cursor points at the
/// surface, or through the viewport centre without a cursor.
fn place_dropped_image(
    window: Single<&Window, With<PrimaryWindow>>,
    camera: Single<(&Camera, &GlobalTransform), With<EditorCamera>>,
    surfaces: Query<(&DecalSurface, &GlobalTransform)>,
    config: Res<EditorConfig>,
    mut source: ResMut<ImageSource>,
    mut session: ResMut<EditorSession>,
) {
    if !source.place_when_ready || !session.image_ready {
        return;
    }
    source.place_when_ready = false;
    if session.has_stamp() {
        return;
    }

    let (camera, camera_transform) = *camera;
    let Some(view) = CameraView::from_camera(camera, camera_transform) else {
        return;
    };
    let ndc = window
        .cursor_position()
        .and_then(|cursor| window_to_viewport_cursor(cursor, camera))
        .map_or(Vec2::ZERO, |position| view.viewport_to_ndc(position));
    let Some(ray) = view.ndc_ray(ndc) else {
        return;
    };

    let hit = surfaces.iter().find_map(|(surface, transform)| {
        let surface = SurfaceRef::from_entity(surface, transform);
        surface.raycast(ray).map(|hit| (hit, surface))
    });
    match hit {
        Some((hit, surface)) => {
            session.place_stamp(&hit, surface, &config);
        }
        None => info!("Dropped image is ready; click the surface to place it"),
    }
}
