// Minimal raster primitives for chart drawing; everything clips to the image
use crate::palette::Rgb;
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::RgbImage;

/// Glyph cell size of the bitmap font, in pixels.
pub const GLYPH_SIZE: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

pub fn fill(canvas: &mut RgbImage, color: Rgb) {
    let px = color.to_pixel();
    for pixel in canvas.pixels_mut() {
        *pixel = px;
    }
}

pub fn put(canvas: &mut RgbImage, x: i32, y: i32, color: Rgb) {
    if x < 0 || y < 0 || x as u32 >= canvas.width() || y as u32 >= canvas.height() {
        return;
    }
    canvas.put_pixel(x as u32, y as u32, color.to_pixel());
}

/// Filled rectangle covering `[x, x + w) × [y, y + h)`. Zero height still paints one row.
pub fn fill_rect(canvas: &mut RgbImage, x: i32, y: i32, w: i32, h: i32, color: Rgb) {
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + w.max(1)).min(canvas.width() as i32);
    let y1 = (y + h.max(1)).min(canvas.height() as i32);
    let px = color.to_pixel();
    for yy in y0..y1 {
        for xx in x0..x1 {
            canvas.put_pixel(xx as u32, yy as u32, px);
        }
    }
}

/// Straight line with a square brush of `thickness` pixels. The segment is clipped to
/// the canvas (widened by the brush) before it is rasterized.
pub fn line(canvas: &mut RgbImage, from: Point, to: Point, color: Rgb, thickness: i32) {
    let thickness = thickness.max(1);
    let lead = (thickness - 1) / 2;

    let Some((from, to)) = clip_segment(canvas, from, to, lead) else {
        return;
    };

    let (mut x, mut y) = (from.x, from.y);
    let dx = (to.x - from.x).abs();
    let dy = -(to.y - from.y).abs();
    let sx = if from.x < to.x { 1 } else { -1 };
    let sy = if from.y < to.y { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if thickness == 1 {
            put(canvas, x, y, color);
        } else {
            fill_rect(canvas, x - lead, y - lead, thickness, thickness, color);
        }
        if x == to.x && y == to.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Liang-Barsky clip against the canvas grown by `margin` on every side.
fn clip_segment(canvas: &RgbImage, from: Point, to: Point, margin: i32) -> Option<(Point, Point)> {
    if canvas.width() == 0 || canvas.height() == 0 {
        return None;
    }

    let (min_x, min_y) = (-margin as f64, -margin as f64);
    let max_x = (canvas.width() as i64 - 1 + margin as i64) as f64;
    let max_y = (canvas.height() as i64 - 1 + margin as i64) as f64;

    let (x0, y0) = (from.x as f64, from.y as f64);
    let (dx, dy) = (to.x as f64 - x0, to.y as f64 - y0);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);

    for (p, q) in [(-dx, x0 - min_x), (dx, max_x - x0), (-dy, y0 - min_y), (dy, max_y - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let at = |t: f64| Point::new((x0 + t * dx).round() as i32, (y0 + t * dy).round() as i32);
    Some((at(t0), at(t1)))
}

pub fn polyline(canvas: &mut RgbImage, points: &[Point], color: Rgb, thickness: i32) {
    match points {
        [] => {}
        [only] => line(canvas, *only, *only, color, thickness),
        _ => {
            for pair in points.windows(2) {
                line(canvas, pair[0], pair[1], color, thickness);
            }
        }
    }
}

/// Draws `text` with its top-left corner at `(x, y)`, one 8x8 glyph per character
/// scaled by `scale`. Characters outside the basic set render as `?`.
pub fn text(canvas: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb, scale: i32) {
    let scale = scale.max(1);
    let mut cursor_x = x;
    for ch in text.chars() {
        if let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) {
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if (bits >> col) & 1 == 1 {
                        let px = cursor_x + col * scale;
                        let py = y + row as i32 * scale;
                        fill_rect(canvas, px, py, scale, scale, color);
                    }
                }
            }
        }
        cursor_x += GLYPH_SIZE * scale;
    }
}
