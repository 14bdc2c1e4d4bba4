use bevy::{
    math::bounding::{BoundingSphere, RayCast3d},
    prelude::*,
};

use crate::{EditorSystems, session::EditorSession};

pub const ANCHOR_VISUAL_RADIUS: f32 = 0.02;
pub const ANCHOR_COLLIDER_RADIUS: f32 = 0.08;
pub const COLOR_ANCHOR: Color = Color::srgb(0.29, 0.565, 0.886);
pub const COLOR_ANCHOR_HOVERED: Color = Color::WHITE;

/// The small marker at the stamp's anchor point. Hidden while a widget is
/// shown, but still pickable.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnchorHandle {
    pub position: Vec3,
    pub hovered: bool,
}

impl AnchorHandle {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            hovered: false,
        }
    }

    /// Distance along `ray` to the pick sphere.
    pub fn pick(&self, ray: Ray3d) -> Option<f32> {
        RayCast3d::from_ray(ray, f32::MAX)
            .sphere_intersection_at(&BoundingSphere::new(self.position, ANCHOR_COLLIDER_RADIUS))
    }
}

pub struct AnchorHandlePlugin;

impl Plugin for AnchorHandlePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_anchor_assets)
            .add_systems(Update, sync_anchor_handle.in_set(EditorSystems::Commit));
    }
}

#[derive(Component)]
struct AnchorHandleVisual;

#[derive(Resource)]
struct AnchorHandleAssets {
    mesh: Handle<Mesh>,
    idle: Handle<StandardMaterial>,
    hovered: Handle<StandardMaterial>,
}

fn setup_anchor_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let unlit = |color: Color| StandardMaterial {
        base_color: color,
        unlit: true,
        ..default()
    };
    commands.insert_resource(AnchorHandleAssets {
        mesh: meshes.add(Sphere::new(ANCHOR_VISUAL_RADIUS)),
        idle: materials.add(unlit(COLOR_ANCHOR)),
        hovered: materials.add(unlit(COLOR_ANCHOR_HOVERED)),
    });
}

fn sync_anchor_handle(
    mut commands: Commands,
    session: Res<EditorSession>,
    assets: Option<Res<AnchorHandleAssets>>,
    mut visuals: Query<
        (
            Entity,
            &mut Transform,
            &mut Visibility,
            &mut MeshMaterial3d<StandardMaterial>,
        ),
        With<AnchorHandleVisual>,
    >,
) {
    let Some(assets) = assets else {
        return;
    };
    let visuals = visuals.single_mut();

    let Some(anchor) = session.anchor_handle() else {
        if let Ok((entity, ..)) = visuals {
            commands.entity(entity).despawn();
        }
        return;
    };

    let wanted_visibility = if session.widget().is_some() {
        Visibility::Hidden
    } else {
        Visibility::Visible
    };
    let wanted_material = if anchor.hovered {
        &assets.hovered
    } else {
        &assets.idle
    };

    match visuals {
        Ok((_, mut transform, mut visibility, mut material)) => {
            if transform.translation != anchor.position {
                transform.translation = anchor.position;
            }
            visibility.set_if_neq(wanted_visibility);
            if material.0 != *wanted_material {
                material.0 = wanted_material.clone();
            }
        }
        Err(_) => {
            commands.spawn((
                Name::new("Anchor Handle"),
                AnchorHandleVisual,
                Mesh3d(assets.mesh.clone()),
                MeshMaterial3d(wanted_material.clone()),
                Transform::from_translation(anchor.position),
                wanted_visibility,
            ));
        }
    }
}
