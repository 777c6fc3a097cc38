//! Floating inline toolbar driven by selection tracking.
//!
//! Shown above the bounding box of a non-collapsed selection inside the
//! surface, hidden otherwise. The surface batches updates through its frame
//! pump so bursts of selection-change events cost one recomputation.

use crate::caret::{Selection, caret_after, caret_before, position_path};
use crate::dom::{Dom, NodeId};
use crate::layout::{Layout, Rect};

/// Vertical gap between the selection box and the toolbar anchor.
pub const TOOLBAR_GAP: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    Bold,
    Italic,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Toolbar {
    visible: bool,
    anchor: (f32, f32),
}

impl Toolbar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Anchor point (centered above the selection) while visible.
    pub fn anchor(&self) -> Option<(f32, f32)> {
        self.visible.then_some(self.anchor)
    }

    pub fn dismiss(&mut self) {
        self.visible = false;
    }

    /// Recomputes visibility and anchor from the current selection. Hidden
    /// for collapsed, stale, or out-of-surface selections and for
    /// selections without a measurable box.
    pub fn update(
        &mut self,
        dom: &Dom,
        root: NodeId,
        selection: &Selection,
        layout: &dyn Layout,
    ) {
        if selection.is_collapsed() {
            self.visible = false;
            return;
        }
        let inside = position_path(dom, root, &selection.anchor).is_some()
            && position_path(dom, root, &selection.focus).is_some();
        if !inside {
            self.visible = false;
            return;
        }
        match selection_rect(dom, root, selection, layout) {
            Some(rect) if rect.width > 0.0 && rect.height > 0.0 => {
                self.anchor = (rect.center_x(), rect.y - TOOLBAR_GAP);
                self.visible = true;
            }
            _ => self.visible = false,
        }
    }
}

/// Union of the boxes of every text node the selection touches.
pub fn selection_rect(
    dom: &Dom,
    root: NodeId,
    selection: &Selection,
    layout: &dyn Layout,
) -> Option<Rect> {
    let (start, end) = selection.ordered(dom, root);
    let start_path = position_path(dom, root, &start)?;
    let end_path = position_path(dom, root, &end)?;

    let mut rect: Option<Rect> = None;
    for node in dom.descendants(root) {
        if !dom.is_text(node) {
            continue;
        }
        let Some(node_start) =
            caret_before(dom, node).and_then(|caret| position_path(dom, root, &caret))
        else {
            continue;
        };
        let Some(node_end) =
            caret_after(dom, node).and_then(|caret| position_path(dom, root, &caret))
        else {
            continue;
        };
        // Any overlap with the range counts, partial coverage included.
        if node_end <= start_path || end_path <= node_start {
            continue;
        }
        if let Some(node_rect) = layout.node_rect(dom, node) {
            rect = Some(match rect {
                Some(acc) => acc.union(&node_rect),
                None => node_rect,
            });
        }
    }
    rect
}
