use std::collections::HashMap;

use image::RgbaImage;

use crate::model::{Page, Rect};
use crate::sprite::Sprite;

/// Copies `src_rect` of `src` onto `canvas` with its top-left at `(dx, dy)`,
/// rotated 90° clockwise when `rotated` is set. Pixels falling outside the
/// canvas are dropped.
pub fn blit(
    src: &RgbaImage,
    src_rect: Rect,
    canvas: &mut RgbaImage,
    dx: u32,
    dy: u32,
    rotated: bool,
) {
    let (cw, ch) = canvas.dimensions();
    let (rw, rh) = if rotated {
        (src_rect.h, src_rect.w)
    } else {
        (src_rect.w, src_rect.h)
    };
    for y in 0..rh {
        for x in 0..rw {
            let (tx, ty) = (dx + x, dy + y);
            if tx >= cw || ty >= ch {
                continue;
            }
            let (sx, sy) = if rotated {
                (src_rect.x + y, src_rect.y + src_rect.h - 1 - x)
            } else {
                (src_rect.x + x, src_rect.y + y)
            };
            canvas.put_pixel(tx, ty, *src.get_pixel(sx, sy));
        }
    }
}

/// Repeats the border pixels of `content` outward by `extrude` pixels,
/// corners included. Must run after the content has been blitted.
pub fn extrude_edges(canvas: &mut RgbaImage, content: Rect, extrude: u32) {
    if extrude == 0 || content.w == 0 || content.h == 0 {
        return;
    }
    let (cw, ch) = canvas.dimensions();
    let e = extrude as i64;
    let (x0, y0) = (content.x as i64, content.y as i64);
    let (w, h) = (content.w as i64, content.h as i64);
    for y in -e..h + e {
        for x in -e..w + e {
            if (0..w).contains(&x) && (0..h).contains(&y) {
                continue;
            }
            let (tx, ty) = (x0 + x, y0 + y);
            if tx < 0 || ty < 0 || tx >= cw as i64 || ty >= ch as i64 {
                continue;
            }
            let sx = (x0 + x.clamp(0, w - 1)) as u32;
            let sy = (y0 + y.clamp(0, h - 1)) as u32;
            if sx >= cw || sy >= ch {
                continue;
            }
            let px = *canvas.get_pixel(sx, sy);
            canvas.put_pixel(tx as u32, ty as u32, px);
        }
    }
}

/// Renders every frame of `page` from the prepared sprites.
pub fn compose_page(page: &Page, sprites: &[Sprite]) -> RgbaImage {
    let by_key: HashMap<&str, &Sprite> = sprites.iter().map(|s| (s.key.as_str(), s)).collect();
    let mut canvas = RgbaImage::new(page.width.max(1), page.height.max(1));
    for frame in &page.frames {
        let Some(sprite) = by_key.get(frame.key.as_str()) else {
            continue;
        };
        blit(
            &sprite.rgba,
            frame.source,
            &mut canvas,
            frame.frame.x,
            frame.frame.y,
            frame.rotated,
        );
        extrude_edges(&mut canvas, frame.frame, frame.extrude);
    }
    canvas
}
