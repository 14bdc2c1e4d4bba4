use bevy::prelude::*;

use crate::{
    config::EditorConfig,
    session::EditorSession,
    surface::{DecalSurface, SurfaceRef},
};

const STROKE_COLOR: Color = Color::srgb(1.0, 0.0, 1.0);
/// Lift off the surface so the line is not z-fighting with it.
const SURFACE_OFFSET: f32 = 0.002;

/// Draws recorded brush strokes on the surface.
pub struct BrushOverlayPlugin;

impl Plugin for BrushOverlayPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            draw_brush_strokes.run_if(|config: Res<EditorConfig>| config.show_brush_strokes),
        );
    }
}

fn draw_brush_strokes(
    mut gizmos: Gizmos,
    session: Res<EditorSession>,
    surfaces: Query<(&DecalSurface, &GlobalTransform)>,
) {
    let Some((surface, transform)) = surfaces.iter().next() else {
        return;
    };
    let surface = SurfaceRef::from_entity(surface, transform);

    for stroke in session.brush_strokes() {
        let points = stroke.iter().filter_map(|&uv| {
            let position = surface.position_from_uv(uv)?;
            let normal = surface
                .face_index_from_uv(uv)
                .and_then(|face| surface.face_normal(face))
                .unwrap_or(Vec3::ZERO);
            Some(position + normal * SURFACE_OFFSET)
        });
        gizmos.linestrip(points, STROKE_COLOR);
    }
}
