use bevy::prelude::*;

use super::{COLOR_HOVERED, HandleType, PartShape, WidgetHandle, WidgetKind, WidgetPart};
use crate::{EditorSystems, session::EditorSession};

/// Mirrors the session's widget into a root entity with one child per part.
pub struct WidgetSpawnPlugin;

impl Plugin for WidgetSpawnPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_widget_materials)
            .add_systems(Update, sync_widget.in_set(EditorSystems::Commit));
    }
}

#[derive(Component)]
pub struct WidgetRoot {
    pub kind: WidgetKind,
}

#[derive(Component)]
pub struct WidgetPartVisual(pub WidgetHandle);

#[derive(Resource)]
struct WidgetMaterials {
    x: Handle<StandardMaterial>,
    y: Handle<StandardMaterial>,
    center: Handle<StandardMaterial>,
    rotate: Handle<StandardMaterial>,
    hovered: Handle<StandardMaterial>,
}

impl WidgetMaterials {
    fn get(&self, handle: WidgetHandle, hovered: bool) -> &Handle<StandardMaterial> {
        if hovered {
            return &self.hovered;
        }
        match handle {
            WidgetHandle::Axis(HandleType::X) => &self.x,
            WidgetHandle::Axis(HandleType::Y) => &self.y,
            WidgetHandle::Axis(HandleType::Center) => &self.center,
            WidgetHandle::Rotate => &self.rotate,
        }
    }
}

fn setup_widget_materials(mut commands: Commands, mut materials: ResMut<Assets<StandardMaterial>>) {
    let mut unlit = |handle: Option<WidgetHandle>| {
        materials.add(StandardMaterial {
            base_color: handle.map_or(COLOR_HOVERED, WidgetHandle::color),
            unlit: true,
            cull_mode: None,
            ..default()
        })
    };
    commands.insert_resource(WidgetMaterials {
        x: unlit(Some(WidgetHandle::Axis(HandleType::X))),
        y: unlit(Some(WidgetHandle::Axis(HandleType::Y))),
        center: unlit(Some(WidgetHandle::Axis(HandleType::Center))),
        rotate: unlit(Some(WidgetHandle::Rotate)),
        hovered: unlit(None),
    });
}

fn part_mesh(shape: PartShape) -> Mesh {
    match shape {
        PartShape::Shaft { length, radius } => Cylinder::new(radius, length).into(),
        PartShape::Cone { length, radius } => Cone {
            radius,
            height: length,
        }
        .into(),
        PartShape::Sphere { radius } => Sphere::new(radius).into(),
        PartShape::Ring { radius, half_width } => {
            Annulus::new(radius - half_width, radius + half_width).into()
        }
    }
}

fn spawn_widget(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &WidgetMaterials,
    kind: WidgetKind,
    transform: Transform,
    hovered: Option<WidgetHandle>,
) {
    let root = commands
        .spawn((
            Name::new(format!("Widget ({})", kind.label())),
            WidgetRoot { kind },
            transform,
            Visibility::default(),
        ))
        .id();

    for WidgetPart {
        handle,
        shape,
        transform,
    } in kind.parts()
    {
        commands.spawn((
            WidgetPartVisual(handle),
            Mesh3d(meshes.add(part_mesh(shape))),
            MeshMaterial3d(materials.get(handle, hovered == Some(handle)).clone()),
            transform,
            ChildOf(root),
        ));
    }
}

fn sync_widget(
    mut commands: Commands,
    session: Res<EditorSession>,
    materials: Option<Res<WidgetMaterials>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut roots: Query<(Entity, &WidgetRoot, &mut Transform)>,
    mut parts: Query<(&WidgetPartVisual, &mut MeshMaterial3d<StandardMaterial>)>,
    mut committed_hover: Local<Option<u64>>,
) {
    let Some(materials) = materials else {
        return;
    };

    let Some(widget) = session.widget() else {
        for (entity, ..) in &roots {
            commands.entity(entity).despawn();
        }
        return;
    };

    let mut current = None;
    for (entity, root, transform) in &mut roots {
        if current.is_none() && root.kind == widget.kind {
            current = Some(transform);
        } else {
            commands.entity(entity).despawn();
        }
    }

    let Some(mut transform) = current else {
        *committed_hover = Some(session.hover_revision());
        spawn_widget(
            &mut commands,
            &mut meshes,
            &materials,
            widget.kind,
            widget.transform(),
            widget.hovered,
        );
        return;
    };

    let wanted = widget.transform();
    if *transform != wanted {
        *transform = wanted;
    }
    if *committed_hover == Some(session.hover_revision()) {
        return;
    }
    *committed_hover = Some(session.hover_revision());
    for (part, mut material) in &mut parts {
        let wanted = materials.get(part.0, widget.hovered == Some(part.0));
        if material.0 != *wanted {
            material.0 = wanted.clone();
        }
    }
}
