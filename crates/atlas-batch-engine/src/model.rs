use serde::Serialize;

/// Pixel rectangle; `x,y` is the top-left corner.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.w
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.h
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn contains(&self, r: &Rect) -> bool {
        r.x >= self.x && r.y >= self.y && r.right() <= self.right() && r.bottom() <= self.bottom()
    }

    pub fn intersects(&self, r: &Rect) -> bool {
        self.x < r.right() && r.x < self.right() && self.y < r.bottom() && r.y < self.bottom()
    }
}

/// A sprite placed on a page.
#[derive(Debug, Clone, Serialize)]
pub struct Frame {
    /// Sprite name as written to the descriptor (file name within the folder).
    pub key: String,
    /// Content rectangle on the page, in stored orientation.
    pub frame: Rect,
    /// Stored rotated 90° clockwise.
    pub rotated: bool,
    pub trimmed: bool,
    /// Kept region within the scaled source image.
    pub source: Rect,
    /// Scaled source size before trimming.
    pub source_size: (u32, u32),
    /// Edge pixels repeated around the content.
    pub extrude: u32,
}

impl Frame {
    /// Right/bottom extent of the frame including its extrusion.
    pub fn outer_extent(&self) -> (u32, u32) {
        (
            self.frame.right() + self.extrude,
            self.frame.bottom() + self.extrude,
        )
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub id: usize,
    pub width: u32,
    pub height: u32,
    pub frames: Vec<Frame>,
}

impl Page {
    /// Share of the page covered by sprite content, 0.0 to 1.0.
    pub fn occupancy(&self) -> f64 {
        let page = self.width as u64 * self.height as u64;
        if page == 0 {
            return 0.0;
        }
        let used: u64 = self.frames.iter().map(|f| f.frame.area()).sum();
        used as f64 / page as f64
    }
}

/// Settings echoed into the JSON hash descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct Meta {
    pub app: String,
    pub version: String,
    pub format: String,
    pub scale: f64,
    pub power_of_two: bool,
    pub padding: u32,
    pub extrude: u32,
    pub allow_rotation: bool,
    pub trim: bool,
}
