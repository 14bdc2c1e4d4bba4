use crate::stamp::StampId;

/// Which stamp, if any, is selected. With a single active stamp this is
/// effectively a flag, but the id keeps call sites explicit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StampSelection {
    selected: Option<StampId>,
}

impl StampSelection {
    /// Select a single stamp, replacing any previous selection.
    pub fn select_single(&mut self, id: StampId) {
        self.selected = Some(id);
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    pub fn primary(&self) -> Option<StampId> {
        self.selected
    }

    pub fn is_selected(&self, id: StampId) -> bool {
        self.selected == Some(id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_none()
    }
}
