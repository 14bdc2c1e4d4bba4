use bevy::prelude::*;
use decal_geometry::{DeformationLattice, SurfaceHit};

use crate::{
    anchor_handle::AnchorHandle,
    config::EditorConfig,
    selection::StampSelection,
    stamp::{StampId, StampInfo, wrap_angle},
    surface::SurfaceRef,
    widget::{WidgetKind, WidgetState, widget_orientation},
};

/// Recorded brush stroke, as UV samples in application order.
pub type BrushStroke = Vec<Vec2>;

/// Editing state shared by the interaction layer and the commit systems.
///
/// Tools mutate it synchronously through these methods; systems that mirror
/// it into the scene graph compare [`EditorSession::revision`] and the
/// lattice generation against what they last committed.
#[derive(Resource)]
pub struct EditorSession {
    stamp: Option<StampInfo>,
    lattice: Option<DeformationLattice>,
    widget: Option<WidgetState>,
    anchor_handle: Option<AnchorHandle>,
    pub selection: StampSelection,
    pub brush_mode: bool,
    pub image_ready: bool,
    /// Whether the orbit camera may respond to the current gesture.
    pub orbit_enabled: bool,
    brush_strokes: Vec<BrushStroke>,
    revision: u64,
    hover_revision: u64,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self {
            stamp: None,
            lattice: None,
            widget: None,
            anchor_handle: None,
            selection: StampSelection::default(),
            brush_mode: false,
            image_ready: false,
            orbit_enabled: true,
            brush_strokes: Vec::new(),
            revision: 0,
            hover_revision: 0,
        }
    }
}

impl EditorSession {
    pub fn stamp(&self) -> Option<&StampInfo> {
        self.stamp.as_ref()
    }

    pub fn lattice(&self) -> Option<&DeformationLattice> {
        self.lattice.as_ref()
    }

    pub fn widget(&self) -> Option<&WidgetState> {
        self.widget.as_ref()
    }

    pub fn widget_mut(&mut self) -> Option<&mut WidgetState> {
        self.widget.as_mut()
    }

    pub fn anchor_handle(&self) -> Option<&AnchorHandle> {
        self.anchor_handle.as_ref()
    }

    pub fn anchor_handle_mut(&mut self) -> Option<&mut AnchorHandle> {
        self.anchor_handle.as_mut()
    }

    pub fn brush_strokes(&self) -> &[BrushStroke] {
        &self.brush_strokes
    }

    /// Bumped on every stamp or lattice change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Bumped whenever the hovered widget handle or anchor hover flag changes.
    pub fn hover_revision(&self) -> u64 {
        self.hover_revision
    }

    pub(crate) fn mark_hover_changed(&mut self) {
        self.hover_revision += 1;
    }

    pub fn has_stamp(&self) -> bool {
        self.stamp.is_some()
    }

    pub fn is_stamp_selected(&self) -> bool {
        self.selection.is_selected(StampId::PRIMARY)
    }

    // -----------------------------------------------------------------------
    // Stamp lifecycle
    // -----------------------------------------------------------------------

    /// Create the stamp at a surface hit. No-op (returns `false`) when a stamp
    /// already exists, the source image is not ready, or the hit has no UV.
    pub fn place_stamp(
        &mut self,
        hit: &SurfaceHit,
        surface: SurfaceRef,
        config: &EditorConfig,
    ) -> bool {
        if self.stamp.is_some() || !self.image_ready {
            return false;
        }
        let Some(uv) = hit.uv else {
            return false;
        };

        let basis = surface.basis_at(hit.face_index, hit.normal);
        let stamp = StampInfo::new(uv, config.stamp_size, basis);
        self.stamp = Some(stamp);
        self.lattice = Some(DeformationLattice::new(config.lattice_segments));
        self.anchor_handle = Some(AnchorHandle::new(hit.point));
        self.selection.select_single(StampId::PRIMARY);
        self.revision += 1;
        info!("Placed {} at uv ({:.3}, {:.3})", StampId::PRIMARY, uv.x, uv.y);

        self.open_widget(config.default_widget, Some(surface));
        true
    }

    /// Remove the stamp together with its lattice, widget and anchor handle.
    pub fn delete_stamp(&mut self) -> bool {
        if self.stamp.is_none() {
            return false;
        }
        self.stamp = None;
        self.lattice = None;
        self.widget = None;
        self.anchor_handle = None;
        self.selection.clear();
        self.brush_strokes.clear();
        self.revision += 1;
        info!("Deleted {}", StampId::PRIMARY);
        true
    }

    /// Replace the stamp placement, keeping the widget and anchor handle on it.
    ///
    /// `anchor_point` is the exact surface point of the new anchor when the
    /// caller has one; otherwise it is looked up from the UV on `surface`,
    /// and the anchor handle keeps its position if that fails. The widget
    /// always returns to the anchor, undoing any drag offset.
    pub fn update_stamp(
        &mut self,
        mut stamp: StampInfo,
        anchor_point: Option<Vec3>,
        surface: Option<SurfaceRef>,
    ) -> bool {
        if self.stamp.is_none() {
            return false;
        }
        stamp.rotation = wrap_angle(stamp.rotation);
        self.stamp = Some(stamp);
        self.revision += 1;

        let anchor_point = anchor_point
            .or_else(|| surface.and_then(|surface| surface.position_from_uv(stamp.uv)))
            .or_else(|| self.anchor_handle.map(|anchor| anchor.position));
        if let Some(point) = anchor_point
            && let Some(anchor) = &mut self.anchor_handle
        {
            anchor.position = point;
        }
        if let Some(widget) = &mut self.widget {
            if let Some(point) = anchor_point {
                widget.position = point;
            }
            widget.rotation = orientation_for(widget.kind, &stamp);
        }
        true
    }

    /// Apply one brush sample to the lattice around `anchor_uv`.
    /// Returns the number of moved vertices, or `None` without a stamp and lattice.
    pub fn deform_lattice(
        &mut self,
        anchor_uv: Vec2,
        direction_uv: Vec2,
        radius: f32,
    ) -> Option<usize> {
        let transform = self.stamp.as_ref()?.lattice_transform();
        let lattice = self.lattice.as_mut()?;
        let moved = lattice.deform(&transform, anchor_uv, direction_uv, radius);
        self.revision += 1;
        Some(moved)
    }

    pub fn reset_lattice(&mut self) -> bool {
        let Some(lattice) = &mut self.lattice else {
            return false;
        };
        lattice.reset();
        self.brush_strokes.clear();
        self.revision += 1;
        info!("Reset stamp warp");
        true
    }

    // -----------------------------------------------------------------------
    // Widget
    // -----------------------------------------------------------------------

    /// Show `kind` at the stamp anchor, replacing any current widget.
    pub fn open_widget(&mut self, kind: WidgetKind, surface: Option<SurfaceRef>) -> bool {
        let Some(stamp) = self.stamp else {
            return false;
        };
        let position = surface
            .and_then(|surface| surface.position_from_uv(stamp.uv))
            .or_else(|| self.anchor_handle.map(|anchor| anchor.position));
        let Some(position) = position else {
            warn!("Failed to open {} widget: stamp anchor not found on surface", kind.label());
            return false;
        };

        self.widget = Some(WidgetState::new(kind, position, orientation_for(kind, &stamp)));
        self.mark_hover_changed();
        info!("Opened {} widget", kind.label());
        true
    }

    /// Dispose only the widget; the stamp and anchor handle stay.
    pub fn exit_widget(&mut self) -> bool {
        if self.widget.take().is_none() {
            return false;
        }
        self.mark_hover_changed();
        true
    }

    // -----------------------------------------------------------------------
    // Selection and modes
    // -----------------------------------------------------------------------

    pub fn select(&mut self, id: StampId) {
        self.selection.select_single(id);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn toggle_brush_mode(&mut self) -> bool {
        self.brush_mode = !self.brush_mode;
        info!("Brush mode {}", if self.brush_mode { "on" } else { "off" });
        self.brush_mode
    }

    pub fn start_brush_stroke(&mut self) {
        self.brush_strokes.push(BrushStroke::new());
    }

    pub fn record_brush_point(&mut self, uv: Vec2) {
        match self.brush_strokes.last_mut() {
            Some(stroke) => stroke.push(uv),
            None => self.brush_strokes.push(vec![uv]),
        }
    }
}

/// The rotate widget stays aligned with the stamp frame; the others follow
/// the stamp rotation.
fn orientation_for(kind: WidgetKind, stamp: &StampInfo) -> Quat {
    let rotation = match kind {
        WidgetKind::Rotate => 0.0,
        WidgetKind::Scale | WidgetKind::Move => stamp.rotation,
    };
    widget_orientation(&stamp.basis, rotation)
}
