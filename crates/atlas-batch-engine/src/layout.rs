use tracing::debug;

use crate::error::{EngineError, Result};
use crate::model::{Frame, Page};
use crate::packer::{Heuristic, MaxRectsPacker, Packer, PageLimits};
use crate::sprite::Sprite;

/// Result of one layout attempt.
#[derive(Debug, Clone)]
pub struct Layout {
    pub heuristic: Heuristic,
    pub pages: Vec<Page>,
}

impl Layout {
    pub fn total_area(&self) -> u64 {
        self.pages
            .iter()
            .map(|p| p.width as u64 * p.height as u64)
            .sum()
    }
}

pub fn next_pow2(v: u32) -> u32 {
    v.max(1).checked_next_power_of_two().unwrap_or(1 << 31)
}

/// Tight bounds of the placed frames plus trailing padding, rounded up to
/// powers of two when asked, and never larger than the configured page.
pub fn page_size(frames: &[Frame], limits: &PageLimits, power_of_two: bool) -> (u32, u32) {
    let trailing = limits.padding - limits.padding / 2;
    let (mut w, mut h) = frames.iter().fold((1u32, 1u32), |(w, h), f| {
        let (r, b) = f.outer_extent();
        (w.max(r + trailing), h.max(b + trailing))
    });
    if power_of_two {
        w = next_pow2(w);
        h = next_pow2(h);
    }
    (w.min(limits.width.max(1)), h.min(limits.height.max(1)))
}

/// Larger sprites first; names break ties so layouts are reproducible.
pub fn placement_order(sprites: &[Sprite]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..sprites.len()).collect();
    order.sort_by(|&a, &b| {
        let (sa, sb) = (&sprites[a], &sprites[b]);
        sb.packed_size()
            .area()
            .cmp(&sa.packed_size().area())
            .then_with(|| sa.key.cmp(&sb.key))
    });
    order
}

/// Fills pages one after another with a single heuristic.
pub fn pack_pages(
    sprites: &[Sprite],
    limits: PageLimits,
    heuristic: Heuristic,
    power_of_two: bool,
) -> Result<Layout> {
    let mut remaining = placement_order(sprites);
    let mut pages = Vec::new();
    while !remaining.is_empty() {
        let mut packer = MaxRectsPacker::new(limits, heuristic);
        let mut frames = Vec::new();
        let mut deferred = Vec::new();
        for idx in remaining {
            let sprite = &sprites[idx];
            match packer.pack(&sprite.key, &sprite.packed_size(), sprite.extrude) {
                Some(mut frame) => {
                    frame.trimmed = sprite.trimmed;
                    frame.source = sprite.source;
                    frame.source_size = sprite.source_size();
                    frames.push(frame);
                }
                None => deferred.push(idx),
            }
        }
        if frames.is_empty() {
            let sprite = &sprites[deferred[0]];
            return Err(EngineError::OutOfSpace {
                key: sprite.key.clone(),
                width: sprite.source.w,
                height: sprite.source.h,
            });
        }
        let (width, height) = page_size(&frames, &limits, power_of_two);
        pages.push(Page {
            id: pages.len(),
            width,
            height,
            frames,
        });
        remaining = deferred;
    }
    Ok(Layout { heuristic, pages })
}

/// Tries every heuristic and keeps the layout with the fewest pages, then the
/// smallest total page area. Earlier heuristics win exact ties.
pub fn pack_smart(sprites: &[Sprite], limits: PageLimits, power_of_two: bool) -> Result<Layout> {
    #[cfg(feature = "parallel")]
    let attempts: Vec<Result<Layout>> = {
        use rayon::prelude::*;
        Heuristic::ALL
            .par_iter()
            .map(|&h| pack_pages(sprites, limits, h, power_of_two))
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let attempts: Vec<Result<Layout>> = Heuristic::ALL
        .iter()
        .map(|&h| pack_pages(sprites, limits, h, power_of_two))
        .collect();

    let mut best: Option<Layout> = None;
    let mut first_err = None;
    for attempt in attempts {
        match attempt {
            Ok(layout) => {
                debug!(
                    heuristic = layout.heuristic.as_str(),
                    pages = layout.pages.len(),
                    area = layout.total_area(),
                    "candidate layout"
                );
                let better = best.as_ref().is_none_or(|b| {
                    (layout.pages.len(), layout.total_area()) < (b.pages.len(), b.total_area())
                });
                if better {
                    best = Some(layout);
                }
            }
            Err(e) => {
                first_err.get_or_insert(e);
            }
        }
    }
    match (best, first_err) {
        (Some(layout), _) => Ok(layout),
        (None, Some(e)) => Err(e),
        (None, None) => Ok(Layout {
            heuristic: Heuristic::BestShortSideFit,
            pages: Vec::new(),
        }),
    }
}
