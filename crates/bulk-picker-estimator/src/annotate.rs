//! Debug overlay for ranked candidates.

use crate::PickCandidate;
use bulk_picker_core::ColorImage;

const STAR_RADIUS: i64 = 7;
const LABEL_SCALE: i64 = 2;
const STAR_COLOR: [u8; 3] = [255, 0, 0];
const LABEL_COLOR: [u8; 3] = [255, 255, 0];

/// 3×5 digit glyphs, one row per entry, most significant bit on the left.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

fn put_clipped(img: &mut ColorImage, x: i64, y: i64, rgb: [u8; 3]) {
    if x >= 0 && y >= 0 && (x as usize) < img.width && (y as usize) < img.height {
        img.put_pixel(x as usize, y as usize, rgb);
    }
}

fn draw_star(img: &mut ColorImage, cx: i64, cy: i64) {
    for t in -STAR_RADIUS..=STAR_RADIUS {
        put_clipped(img, cx + t, cy, STAR_COLOR);
        put_clipped(img, cx, cy + t, STAR_COLOR);
        let d = t * 5 / 7;
        put_clipped(img, cx + d, cy + d, STAR_COLOR);
        put_clipped(img, cx + d, cy - d, STAR_COLOR);
    }
}

fn draw_number(img: &mut ColorImage, x0: i64, y0: i64, value: usize) {
    let text = value.to_string();
    for (k, ch) in text.bytes().enumerate() {
        let glyph = DIGITS[(ch - b'0') as usize];
        let gx = x0 + k as i64 * 4 * LABEL_SCALE;
        for (row, bits) in glyph.iter().enumerate() {
            for col in 0..3 {
                if bits & (0b100 >> col) == 0 {
                    continue;
                }
                for sy in 0..LABEL_SCALE {
                    for sx in 0..LABEL_SCALE {
                        put_clipped(
                            img,
                            gx + col * LABEL_SCALE + sx,
                            y0 + row as i64 * LABEL_SCALE + sy,
                            LABEL_COLOR,
                        );
                    }
                }
            }
        }
    }
}

/// Copy of `image` with a star and its 1-based rank drawn at each of the
/// first `limit` candidates.
pub fn annotate_candidates(
    image: &ColorImage,
    candidates: &[PickCandidate],
    limit: usize,
) -> ColorImage {
    let mut out = image.clone();
    for (rank, c) in candidates.iter().take(limit).enumerate() {
        let cx = c.point.x.round() as i64;
        let cy = c.point.y.round() as i64;
        draw_star(&mut out, cx, cy);
        draw_number(&mut out, cx + STAR_RADIUS + 2, cy - STAR_RADIUS, rank + 1);
    }
    out
}
