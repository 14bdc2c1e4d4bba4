//! Shared fixtures for unit tests.

use std::f32::consts::FRAC_PI_4;

use bevy::prelude::*;
use decal_geometry::SurfaceGeometry;

use crate::{
    config::EditorConfig,
    interaction::PointerSample,
    session::EditorSession,
    surface::SurfaceRef,
    viewport_util::CameraView,
    widget::WidgetKind,
};

pub const VIEWPORT: Vec2 = Vec2::splat(800.0);

/// Unit quad in the XY plane facing +Z, UVs equal to XY.
pub fn quad() -> SurfaceGeometry {
    SurfaceGeometry::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ],
        Some(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ]),
        Some(vec![0, 1, 2, 0, 2, 3]),
    )
    .unwrap()
}

/// Square perspective view from `eye` towards `target` with +Y up.
pub fn front_view(eye: Vec3, target: Vec3) -> CameraView {
    let clip_from_view = Mat4::perspective_infinite_reverse_rh(FRAC_PI_4, 1.0, 0.1);
    let world_from_view = Transform::from_translation(eye)
        .looking_at(target, Vec3::Y)
        .compute_affine();
    CameraView::new(clip_from_view, world_from_view, VIEWPORT)
}

/// Viewport pixel position of a world point in `view`.
pub fn pixel_of(view: &CameraView, world: Vec3) -> Vec2 {
    let ndc = view.project(world).truncate();
    Vec2::new((ndc.x + 1.0) * 0.5, (1.0 - ndc.y) * 0.5) * view.viewport_size()
}

/// Pointer sample at an NDC position.
pub fn sample_ndc(view: &CameraView, ndc: Vec2) -> PointerSample {
    let size = view.viewport_size();
    PointerSample {
        position: Vec2::new((ndc.x + 1.0) * 0.5, (1.0 - ndc.y) * 0.5) * size,
        ndc,
        ray: view.ndc_ray(ndc),
    }
}

/// Pointer sample over a world point.
pub fn sample_at(view: &CameraView, world: Vec3) -> PointerSample {
    sample_ndc(view, view.project(world).truncate())
}

/// Empty session whose source image is ready.
pub fn ready_session() -> EditorSession {
    let mut session = EditorSession::default();
    session.image_ready = true;
    session
}

/// Session with the image ready and a stamp placed at `uv` on an XY-aligned
/// surface, showing `widget` (or none).
pub fn session_with_stamp(
    surface: SurfaceRef,
    uv: Vec2,
    widget: Option<WidgetKind>,
) -> EditorSession {
    let mut session = ready_session();
    let ray = Ray3d::new(uv.extend(1.0), Dir3::NEG_Z);
    let hit = surface.raycast(ray).unwrap();
    assert!(session.place_stamp(&hit, surface, &EditorConfig::default()));
    match widget {
        Some(kind) => {
            session.open_widget(kind, Some(surface));
        }
        None => {
            session.exit_widget();
        }
    }
    session
}
