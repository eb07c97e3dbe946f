use crate::model::{Frame, Rect};

pub mod maxrects;

pub use maxrects::{Heuristic, MaxRectsPacker};

/// Bounds and spacing for a single page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub width: u32,
    pub height: u32,
    /// Gap kept between neighbouring sprites.
    pub padding: u32,
    pub allow_rotation: bool,
}

/// Places rectangles onto one page.
///
/// Placed frames never overlap, including their padding and extrusion.
/// `pack` returns `None` when the rectangle does not fit in what is left.
pub trait Packer {
    fn can_pack(&self, rect: &Rect, extrude: u32) -> bool;
    fn pack(&mut self, key: &str, rect: &Rect, extrude: u32) -> Option<Frame>;
}
