//! Rasterizes the deformed lattice into the texture shown on the surface.
//!
//! A private orthographic camera looks at the unit square of the texture
//! plane and renders the lattice, textured with the source image, into an
//! offscreen image. It only runs for a few frames after something changed.

use bevy::{
    camera::{RenderTarget, ScalingMode, visibility::RenderLayers},
    core_pipeline::tonemapping::Tonemapping,
    image::ImageSampler,
    prelude::*,
    render::render_resource::{Extent3d, TextureDimension, TextureFormat, TextureUsages},
};

use crate::{
    EditorSystems, config::EditorConfig, image_source::ImageSource, session::EditorSession,
    surface::DecalSurface,
};

/// Render layer reserved for the lattice scene.
pub const LATTICE_LAYER: usize = 7;

/// Frames the lattice camera stays active after a change. Covers the frame
/// in which a freshly spawned mesh has no pipeline yet.
const DIRTY_FRAMES: u8 = 3;

pub struct LatticeRenderPlugin;

impl Plugin for LatticeRenderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LatticeRenderState>()
            .add_systems(Startup, setup_lattice_target)
            .add_systems(
                Update,
                (
                    refresh_on_image_load,
                    sync_lattice,
                    swap_surface_texture,
                    update_lattice_camera,
                )
                    .chain()
                    .in_set(EditorSystems::Commit),
            );
    }
}

/// The offscreen image the lattice is drawn into, and the plain texture the
/// surface falls back to without a stamp.
#[derive(Resource)]
pub struct LatticeRenderTarget {
    pub image: Handle<Image>,
    pub base: Handle<Image>,
}

#[derive(Component)]
struct LatticeCamera;

/// One rendered copy of the lattice, shifted by `offset` in U.
#[derive(Component)]
struct LatticeCopy {
    offset: f32,
}

#[derive(Resource, Default)]
struct LatticeRenderState {
    mesh: Option<Handle<Mesh>>,
    material: Option<Handle<StandardMaterial>>,
    source: Option<Handle<Image>>,
    revision: Option<u64>,
    generation: Option<u64>,
    frames_remaining: u8,
}

/// Horizontal shifts at which the lattice has to be drawn so that content
/// crossing the left or right edge of the unit square wraps around.
pub fn wrap_offsets(bounds: Rect) -> Vec<f32> {
    let mut offsets = vec![0.0];
    if bounds.min.x < 0.0 {
        offsets.push(1.0);
    }
    if bounds.max.x > 1.0 {
        offsets.push(-1.0);
    }
    offsets
}

fn setup_lattice_target(
    mut commands: Commands,
    mut images: ResMut<Assets<Image>>,
    config: Res<EditorConfig>,
) {
    let size = Extent3d {
        width: config.texture_size,
        height: config.texture_size,
        depth_or_array_layers: 1,
    };
    let mut image = Image::new_fill(
        size,
        TextureDimension::D2,
        &[255, 255, 255, 255],
        TextureFormat::Rgba8UnormSrgb,
        default(),
    );
    image.texture_descriptor.usage =
        TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST | TextureUsages::RENDER_ATTACHMENT;
    image.sampler = ImageSampler::linear();
    let image = images.add(image);

    let base = images.add(Image::new_fill(
        Extent3d::default(),
        TextureDimension::D2,
        &[255, 255, 255, 255],
        TextureFormat::Rgba8UnormSrgb,
        default(),
    ));

    commands.spawn((
        Name::new("Lattice Camera"),
        LatticeCamera,
        Camera3d::default(),
        Camera {
            order: -1,
            is_active: false,
            clear_color: ClearColorConfig::Custom(Color::WHITE),
            ..default()
        },
        RenderTarget::Image(image.clone().into()),
        Projection::Orthographic(OrthographicProjection {
            scaling_mode: ScalingMode::Fixed {
                width: 1.0,
                height: 1.0,
            },
            viewport_origin: Vec2::ZERO,
            near: 0.0,
            far: 2.0,
            ..OrthographicProjection::default_3d()
        }),
        Tonemapping::None,
        Transform::from_xyz(0.0, 0.0, 1.0),
        RenderLayers::layer(LATTICE_LAYER),
    ));

    commands.insert_resource(LatticeRenderTarget { image, base });
}

fn sync_lattice(
    mut commands: Commands,
    session: Res<EditorSession>,
    source: Res<ImageSource>,
    mut state: ResMut<LatticeRenderState>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut copies: Query<(Entity, &LatticeCopy, &mut Transform)>,
) {
    let (Some(stamp), Some(lattice)) = (session.stamp(), session.lattice()) else {
        if state.mesh.take().is_some() {
            for (entity, ..) in &copies {
                commands.entity(entity).despawn();
            }
            state.material = None;
            state.revision = None;
            state.generation = None;
        }
        return;
    };

    let source_changed = state.source != source.handle;
    if state.revision == Some(session.revision())
        && state.generation == Some(lattice.generation())
        && !source_changed
    {
        return;
    }

    let mesh = match &state.mesh {
        Some(mesh) => {
            if state.generation != Some(lattice.generation())
                && let Some(mut existing) = meshes.get_mut(mesh)
            {
                lattice.write_positions(&mut existing);
            }
            mesh.clone()
        }
        None => meshes.add(lattice.build_mesh()),
    };
    let material = match &state.material {
        Some(material) if !source_changed => material.clone(),
        _ => materials.add(StandardMaterial {
            base_color_texture: source.handle.clone(),
            unlit: true,
            alpha_mode: AlphaMode::Blend,
            cull_mode: None,
            ..default()
        }),
    };

    let lattice_transform = stamp.lattice_transform();
    let transform = lattice_transform.to_transform();
    let offsets = wrap_offsets(lattice.plane_bounds(&lattice_transform));

    let mut existing: Vec<f32> = copies.iter().map(|(_, copy, _)| copy.offset).collect();
    existing.sort_by(f32::total_cmp);
    let mut wanted = offsets.clone();
    wanted.sort_by(f32::total_cmp);
    let respawn = existing != wanted
        || state.mesh.as_ref() != Some(&mesh)
        || state.material.as_ref() != Some(&material);

    if respawn {
        for (entity, ..) in &copies {
            commands.entity(entity).despawn();
        }
        for offset in offsets {
            let mut shifted = transform;
            shifted.translation.x += offset;
            commands.spawn((
                Name::new("Lattice"),
                LatticeCopy { offset },
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                shifted,
                RenderLayers::layer(LATTICE_LAYER),
            ));
        }
    } else {
        for (_, copy, mut copy_transform) in &mut copies {
            let mut shifted = transform;
            shifted.translation.x += copy.offset;
            *copy_transform = shifted;
        }
    }

    state.mesh = Some(mesh);
    state.material = Some(material);
    state.source.clone_from(&source.handle);
    state.revision = Some(session.revision());
    state.generation = Some(lattice.generation());
    state.frames_remaining = DIRTY_FRAMES;
}

/// A material made while its image was still loading draws nothing, so the
/// lattice is rasterized again once the source image is available.
fn refresh_on_image_load(
    mut events: MessageReader<AssetEvent<Image>>,
    source: Res<ImageSource>,
    session: Res<EditorSession>,
    mut state: ResMut<LatticeRenderState>,
) {
    let Some(source) = &source.handle else {
        events.clear();
        return;
    };
    let loaded = events.read().any(|event| {
        matches!(event, AssetEvent::LoadedWithDependencies { id } if *id == source.id())
    });
    if loaded && session.has_stamp() {
        debug!("Source image loaded, re-rendering lattice");
        state.frames_remaining = DIRTY_FRAMES;
    }
}

fn swap_surface_texture(
    session: Res<EditorSession>,
    target: Option<Res<LatticeRenderTarget>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    surfaces: Query<&MeshMaterial3d<StandardMaterial>, With<DecalSurface>>,
) {
    let Some(target) = target else {
        return;
    };
    let wanted = if session.has_stamp() {
        &target.image
    } else {
        &target.base
    };
    for material in &surfaces {
        let current = materials
            .get(&material.0)
            .and_then(|material| material.base_color_texture.as_ref());
        if current == Some(wanted) {
            continue;
        }
        if let Some(mut material) = materials.get_mut(&material.0) {
            material.base_color_texture = Some(wanted.clone());
        }
    }
}

fn update_lattice_camera(
    mut state: ResMut<LatticeRenderState>,
    mut cameras: Query<&mut Camera, With<LatticeCamera>>,
) {
    let active = state.frames_remaining > 0;
    for mut camera in &mut cameras {
        if camera.is_active != active {
            camera.is_active = active;
        }
    }
    state.frames_remaining = state.frames_remaining.saturating_sub(1);
}

#[cfg(test)]
mod tests {
    use bevy::math::Affine3A;

    use super::*;
    use crate::{
        surface::SurfaceRef,
        test_support::{quad, session_with_stamp},
    };

    fn place_stamp(app: &mut App) {
        let geometry = quad();
        let surface = SurfaceRef::new(&geometry, Affine3A::IDENTITY);
        *app.world_mut().resource_mut::<EditorSession>() =
            session_with_stamp(surface, Vec2::splat(0.5), None);
    }

    fn bounds(min_x: f32, max_x: f32) -> Rect {
        Rect::new(min_x, 0.3, max_x, 0.7)
    }

    #[test]
    fn wraps_only_across_crossed_edges() {
        assert_eq!(wrap_offsets(bounds(0.2, 0.6)), vec![0.0]);
        assert_eq!(wrap_offsets(bounds(-0.1, 0.3)), vec![0.0, 1.0]);
        assert_eq!(wrap_offsets(bounds(0.8, 1.2)), vec![0.0, -1.0]);
        assert_eq!(wrap_offsets(bounds(-0.2, 1.2)), vec![0.0, 1.0, -1.0]);
        assert_eq!(wrap_offsets(bounds(0.0, 1.0)), vec![0.0]);
    }

    #[test]
    fn stamp_near_seam_gets_a_wrapped_copy() {
        let stamp = crate::stamp::StampInfo::new(
            Vec2::new(0.05, 0.5),
            0.4,
            decal_geometry::fallback_basis(Vec3::Z),
        );
        let lattice = decal_geometry::DeformationLattice::new(10);
        let offsets = wrap_offsets(lattice.plane_bounds(&stamp.lattice_transform()));
        assert_eq!(offsets, vec![0.0, 1.0]);
    }

    #[test]
    fn surface_texture_follows_stamp_lifecycle() {
        let mut app = App::new();
        app.init_resource::<Assets<Image>>()
            .init_resource::<Assets<StandardMaterial>>()
            .init_resource::<EditorSession>()
            .add_systems(Update, swap_surface_texture);

        let (image, base) = {
            let mut images = app.world_mut().resource_mut::<Assets<Image>>();
            (images.add(Image::default()), images.add(Image::default()))
        };
        app.insert_resource(LatticeRenderTarget {
            image: image.clone(),
            base: base.clone(),
        });
        let material = app
            .world_mut()
            .resource_mut::<Assets<StandardMaterial>>()
            .add(StandardMaterial::default());
        app.world_mut().spawn((
            DecalSurface { geometry: quad() },
            MeshMaterial3d(material.clone()),
        ));
        let texture = |app: &App| {
            app.world()
                .resource::<Assets<StandardMaterial>>()
                .get(&material)
                .unwrap()
                .base_color_texture
                .clone()
        };

        app.update();
        assert_eq!(texture(&app), Some(base.clone()));

        place_stamp(&mut app);
        app.update();
        assert_eq!(texture(&app), Some(image));

        assert!(app.world_mut().resource_mut::<EditorSession>().delete_stamp());
        app.update();
        assert_eq!(texture(&app), Some(base));
    }

    #[test]
    fn source_image_load_re_renders_lattice() {
        let mut app = App::new();
        app.add_message::<AssetEvent<Image>>()
            .init_resource::<ImageSource>()
            .init_resource::<LatticeRenderState>()
            .init_resource::<EditorSession>()
            .add_systems(Update, refresh_on_image_load);

        let handle = Handle::<Image>::default();
        app.world_mut().resource_mut::<ImageSource>().handle = Some(handle.clone());
        place_stamp(&mut app);

        app.world_mut()
            .write_message(AssetEvent::<Image>::LoadedWithDependencies { id: AssetId::invalid() });
        app.update();
        assert_eq!(app.world().resource::<LatticeRenderState>().frames_remaining, 0);

        app.world_mut()
            .write_message(AssetEvent::LoadedWithDependencies { id: handle.id() });
        app.update();
        assert_eq!(
            app.world().resource::<LatticeRenderState>().frames_remaining,
            DIRTY_FRAMES
        );
    }
}
