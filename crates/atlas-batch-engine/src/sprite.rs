//! Turning decoded images into packable sprites: scale, size limits, trim.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::error::Result;
use crate::model::Rect;

/// Per-sprite size caps. `None` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpriteLimits {
    /// Cap on the longer side.
    pub max_size: Option<f64>,
    pub max_width: Option<f64>,
    pub max_height: Option<f64>,
}

impl SpriteLimits {
    /// Treats zero, negative and non-finite caps as unlimited.
    pub fn new(max_size: Option<f64>, max_width: Option<f64>, max_height: Option<f64>) -> Self {
        let keep = |v: Option<f64>| v.filter(|v| v.is_finite() && *v > 0.0);
        Self {
            max_size: keep(max_size),
            max_width: keep(max_width),
            max_height: keep(max_height),
        }
    }

    /// Uniform factor (at most 1) that brings `w`x`h` within every cap.
    pub fn factor(&self, w: u32, h: u32) -> f64 {
        let (w, h) = (w.max(1) as f64, h.max(1) as f64);
        let mut factor: f64 = 1.0;
        if let Some(m) = self.max_size {
            factor = factor.min(m / w.max(h));
        }
        if let Some(m) = self.max_width {
            factor = factor.min(m / w);
        }
        if let Some(m) = self.max_height {
            factor = factor.min(m / h);
        }
        factor
    }
}

/// A sprite ready for placement.
#[derive(Debug, Clone)]
pub struct Sprite {
    pub key: String,
    /// Scaled, untrimmed pixels.
    pub rgba: RgbaImage,
    pub trimmed: bool,
    /// Region of `rgba` that goes onto the page.
    pub source: Rect,
    pub extrude: u32,
}

impl Sprite {
    /// Size reserved on the page, before padding and extrusion.
    pub fn packed_size(&self) -> Rect {
        Rect::new(0, 0, self.source.w, self.source.h)
    }

    pub fn source_size(&self) -> (u32, u32) {
        self.rgba.dimensions()
    }
}

pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    Ok(image::load_from_memory(bytes)?.to_rgba8())
}

fn scaled_dims(w: u32, h: u32, factor: f64) -> (u32, u32) {
    let scale = |v: u32| ((v as f64 * factor).round() as u32).max(1);
    (scale(w), scale(h))
}

/// Resizes by `factor` with Lanczos3; factor 1 leaves the image untouched.
pub fn resize(rgba: RgbaImage, factor: f64) -> RgbaImage {
    let (w, h) = rgba.dimensions();
    let (nw, nh) = scaled_dims(w, h, factor);
    if (nw, nh) == (w, h) {
        return rgba;
    }
    imageops::resize(&rgba, nw, nh, FilterType::Lanczos3)
}

/// Bounding box of pixels with alpha above `threshold`, or `None` when the
/// whole image is at or below it.
pub fn opaque_bounds(rgba: &RgbaImage, threshold: u8) -> Option<Rect> {
    let (w, h) = rgba.dimensions();
    let (mut x1, mut y1, mut x2, mut y2) = (u32::MAX, u32::MAX, 0u32, 0u32);
    for (x, y, px) in rgba.enumerate_pixels() {
        if px[3] > threshold {
            x1 = x1.min(x);
            y1 = y1.min(y);
            x2 = x2.max(x);
            y2 = y2.max(y);
        }
    }
    if x1 == u32::MAX || w == 0 || h == 0 {
        return None;
    }
    Some(Rect::new(x1, y1, x2 - x1 + 1, y2 - y1 + 1))
}

/// Scale, then size limits, then trim.
pub fn prepare(
    key: String,
    rgba: RgbaImage,
    scale: f64,
    limits: &SpriteLimits,
    trim: bool,
    extrude: u32,
) -> Sprite {
    let rgba = resize(rgba, scale);
    let (w, h) = rgba.dimensions();
    let factor = limits.factor(w, h);
    let rgba = if factor < 1.0 { resize(rgba, factor) } else { rgba };
    let (w, h) = rgba.dimensions();
    let full = Rect::new(0, 0, w, h);
    let (source, trimmed) = match trim.then(|| opaque_bounds(&rgba, 0)).flatten() {
        Some(bounds) if bounds != full => (bounds, true),
        _ => (full, false),
    };
    Sprite {
        key,
        rgba,
        trimmed,
        source,
        extrude,
    }
}
