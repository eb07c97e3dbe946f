use std::str::FromStr;

use super::{Packer, PageLimits};
use crate::model::{Frame, Rect};

/// Free-rectangle choice rule for [`MaxRectsPacker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heuristic {
    BestShortSideFit,
    BestLongSideFit,
    BestAreaFit,
    BottomLeft,
    ContactPoint,
}

impl Heuristic {
    pub const ALL: [Heuristic; 5] = [
        Heuristic::BestShortSideFit,
        Heuristic::BestLongSideFit,
        Heuristic::BestAreaFit,
        Heuristic::BottomLeft,
        Heuristic::ContactPoint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Heuristic::BestShortSideFit => "bssf",
            Heuristic::BestLongSideFit => "blsf",
            Heuristic::BestAreaFit => "baf",
            Heuristic::BottomLeft => "bl",
            Heuristic::ContactPoint => "cp",
        }
    }
}

impl FromStr for Heuristic {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bssf" | "bestshortsidefit" => Ok(Heuristic::BestShortSideFit),
            "blsf" | "bestlongsidefit" => Ok(Heuristic::BestLongSideFit),
            "baf" | "bestareafit" => Ok(Heuristic::BestAreaFit),
            "bl" | "bottomleft" => Ok(Heuristic::BottomLeft),
            "cp" | "contactpoint" => Ok(Heuristic::ContactPoint),
            _ => Err(()),
        }
    }
}

/// Candidate placement; lower scores win, ties go to the upper-left one.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    slot: Rect,
    rotated: bool,
    score: (i64, i64),
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        (self.score, self.slot.bottom(), self.slot.x)
            < (other.score, other.slot.bottom(), other.slot.x)
    }
}

/// MaxRects bin packer over a single page.
pub struct MaxRectsPacker {
    limits: PageLimits,
    bounds: Rect,
    free: Vec<Rect>,
    used: Vec<Rect>,
    heuristic: Heuristic,
}

impl MaxRectsPacker {
    pub fn new(limits: PageLimits, heuristic: Heuristic) -> Self {
        let bounds = Rect::new(0, 0, limits.width, limits.height);
        Self {
            limits,
            bounds,
            free: vec![bounds],
            used: Vec::new(),
            heuristic,
        }
    }

    pub fn heuristic(&self) -> Heuristic {
        self.heuristic
    }

    fn slot_size(&self, rect: &Rect, extrude: u32) -> (u32, u32) {
        let grow = self.limits.padding + extrude * 2;
        (rect.w + grow, rect.h + grow)
    }

    fn score(&self, free: &Rect, w: u32, h: u32) -> (i64, i64) {
        let dw = (free.w as i64 - w as i64).abs();
        let dh = (free.h as i64 - h as i64).abs();
        let short = dw.min(dh);
        let long = dw.max(dh);
        let area = free.area() as i64 - (w as i64 * h as i64);
        match self.heuristic {
            Heuristic::BestShortSideFit => (short, long),
            Heuristic::BestLongSideFit => (long, short),
            Heuristic::BestAreaFit => (area, short),
            Heuristic::BottomLeft => ((free.y + h) as i64, free.x as i64),
            Heuristic::ContactPoint => {
                let contact = self.contact_score(&Rect::new(free.x, free.y, w, h));
                (-(contact as i64), area)
            }
        }
    }

    fn find_position(&self, w: u32, h: u32) -> Option<Candidate> {
        let mut best: Option<Candidate> = None;
        let mut consider = |cand: Candidate| {
            if best.as_ref().is_none_or(|b| cand.beats(b)) {
                best = Some(cand);
            }
        };
        for free in &self.free {
            if free.w >= w && free.h >= h {
                consider(Candidate {
                    slot: Rect::new(free.x, free.y, w, h),
                    rotated: false,
                    score: self.score(free, w, h),
                });
            }
            if self.limits.allow_rotation && w != h && free.w >= h && free.h >= w {
                consider(Candidate {
                    slot: Rect::new(free.x, free.y, h, w),
                    rotated: true,
                    score: self.score(free, h, w),
                });
            }
        }
        best
    }

    /// Length of `node`'s perimeter touching the page edge or placed slots.
    fn contact_score(&self, node: &Rect) -> u64 {
        let mut score = 0u64;
        if node.x == self.bounds.x || node.right() == self.bounds.right() {
            score += node.h as u64;
        }
        if node.y == self.bounds.y || node.bottom() == self.bounds.bottom() {
            score += node.w as u64;
        }
        for used in &self.used {
            if node.x == used.right() || used.x == node.right() {
                score += overlap(node.y, node.bottom(), used.y, used.bottom()) as u64;
            }
            if node.y == used.bottom() || used.y == node.bottom() {
                score += overlap(node.x, node.right(), used.x, used.right()) as u64;
            }
        }
        score
    }

    /// Carves `node` out of every free rectangle it touches.
    fn place(&mut self, node: Rect) {
        let mut next = Vec::with_capacity(self.free.len() + 4);
        for free in &self.free {
            if !free.intersects(&node) {
                next.push(*free);
                continue;
            }
            if node.x > free.x {
                next.push(Rect::new(free.x, free.y, node.x - free.x, free.h));
            }
            if node.right() < free.right() {
                next.push(Rect::new(node.right(), free.y, free.right() - node.right(), free.h));
            }
            if node.y > free.y {
                next.push(Rect::new(free.x, free.y, free.w, node.y - free.y));
            }
            if node.bottom() < free.bottom() {
                next.push(Rect::new(free.x, node.bottom(), free.w, free.bottom() - node.bottom()));
            }
        }
        self.free = next;
        self.prune();
        self.used.push(node);
    }

    /// Drops free rectangles contained in another one.
    fn prune(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let a = self.free[i];
            let mut dominated = false;
            let mut j = i + 1;
            while j < self.free.len() {
                let b = self.free[j];
                if b.contains(&a) {
                    dominated = true;
                    break;
                }
                if a.contains(&b) {
                    self.free.swap_remove(j);
                } else {
                    j += 1;
                }
            }
            if dominated {
                self.free.swap_remove(i);
            } else {
                i += 1;
            }
        }
    }
}

fn overlap(a1: u32, a2: u32, b1: u32, b2: u32) -> u32 {
    a2.min(b2).saturating_sub(a1.max(b1))
}

impl Packer for MaxRectsPacker {
    fn can_pack(&self, rect: &Rect, extrude: u32) -> bool {
        let (w, h) = self.slot_size(rect, extrude);
        self.find_position(w, h).is_some()
    }

    fn pack(&mut self, key: &str, rect: &Rect, extrude: u32) -> Option<Frame> {
        let (w, h) = self.slot_size(rect, extrude);
        let Candidate { slot, rotated, .. } = self.find_position(w, h)?;
        self.place(slot);
        let (fw, fh) = if rotated { (rect.h, rect.w) } else { (rect.w, rect.h) };
        let offset = extrude + self.limits.padding / 2;
        Some(Frame {
            key: key.to_string(),
            frame: Rect::new(slot.x + offset, slot.y + offset, fw, fh),
            rotated,
            trimmed: false,
            source: Rect::new(0, 0, rect.w, rect.h),
            source_size: (rect.w, rect.h),
            extrude,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(w: u32, h: u32, padding: u32, rotate: bool) -> PageLimits {
        PageLimits {
            width: w,
            height: h,
            padding,
            allow_rotation: rotate,
        }
    }

    #[test]
    fn fills_page_without_overlap() {
        for heuristic in Heuristic::ALL {
            let mut p = MaxRectsPacker::new(limits(64, 64, 0, false), heuristic);
            let mut frames = Vec::new();
            for i in 0..16 {
                let f = p
                    .pack(&format!("s{i}"), &Rect::new(0, 0, 16, 16), 0)
                    .unwrap_or_else(|| panic!("{} failed at {i}", heuristic.as_str()));
                frames.push(f.frame);
            }
            assert!(p.pack("extra", &Rect::new(0, 0, 1, 1), 0).is_none());
            for (i, a) in frames.iter().enumerate() {
                assert!(Rect::new(0, 0, 64, 64).contains(a));
                for b in &frames[i + 1..] {
                    assert!(!a.intersects(b));
                }
            }
        }
    }

    #[test]
    fn rotates_only_when_allowed() {
        let mut fixed = MaxRectsPacker::new(limits(10, 40, 0, false), Heuristic::BestAreaFit);
        assert!(!fixed.can_pack(&Rect::new(0, 0, 30, 8), 0));
        let mut rotating = MaxRectsPacker::new(limits(10, 40, 0, true), Heuristic::BestAreaFit);
        let frame = rotating.pack("wide", &Rect::new(0, 0, 30, 8), 0).expect("rotated fit");
        assert!(frame.rotated);
        assert_eq!((frame.frame.w, frame.frame.h), (8, 30));
        assert!(fixed.pack("wide", &Rect::new(0, 0, 30, 8), 0).is_none());
    }

    #[test]
    fn padding_and_extrusion_reserve_space() {
        let mut p = MaxRectsPacker::new(limits(20, 10, 2, false), Heuristic::BottomLeft);
        let a = p.pack("a", &Rect::new(0, 0, 6, 6), 1).expect("a");
        // slot is 6 + 2 + 2 = 10 wide, content offset by extrude + padding / 2
        assert_eq!((a.frame.x, a.frame.y), (2, 2));
        let b = p.pack("b", &Rect::new(0, 0, 6, 6), 1).expect("b");
        assert_eq!(b.frame.x, 12);
        assert!(p.pack("c", &Rect::new(0, 0, 6, 6), 1).is_none());
    }

    #[test]
    fn parses_short_and_long_names() {
        assert_eq!("bssf".parse(), Ok(Heuristic::BestShortSideFit));
        assert_eq!("ContactPoint".parse(), Ok(Heuristic::ContactPoint));
        assert!("skyline".parse::<Heuristic>().is_err());
    }
}
