//! Geometry seam between the document model and the host surface.
//!
//! The engine never measures pixels itself; drop-point resolution and the
//! toolbar anchor both go through [`Layout`], which the embedding platform
//! (or a test fixture) implements.

use crate::dom::{Dom, NodeId};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Rect::new(x, y, right - x, bottom - y)
    }
}

/// Host-provided hit testing and node geometry.
pub trait Layout {
    /// Deepest node rendered under the given surface coordinate.
    fn node_at_point(&self, dom: &Dom, x: f32, y: f32) -> Option<NodeId>;

    /// Bounding box of a rendered node, `None` when it has no box.
    fn node_rect(&self, dom: &Dom, node: NodeId) -> Option<Rect>;
}
