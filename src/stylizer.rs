use crate::edges::{self, Hysteresis, Mask};
use crate::palette::Palette;
use image::RgbImage;

/// Luminance at or above this value is "bright".
pub const BINARY_THRESHOLD: u8 = 128;

/// Pixels the grid scrolls per wall-clock second.
const GRID_SCROLL_PER_SECOND: u64 = 10;

/// Recolors decoded frames into the host's chart idiom.
#[derive(Debug, Clone, Default)]
pub struct FrameStylizer {
    hysteresis: Hysteresis,
}

impl FrameStylizer {
    pub fn new(hysteresis: Hysteresis) -> Self {
        Self { hysteresis }
    }

    /// Stylizes `frame` in place. The output depends only on the frame, the palette,
    /// `draw_grid` and `time_offset_secs` (which sets the grid phase).
    pub fn stylize(&self, frame: &mut RgbImage, palette: &Palette, draw_grid: bool, time_offset_secs: f64) {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return;
        }

        let bright = binarize(frame);
        // Edges come from the thresholded mask, not from the colour frame
        let edge_mask = edges::dilate(&edges::detect_edges(&bright, self.hysteresis));

        let grid = GridLayout::new(width, height, time_offset_secs);

        let bright_px = palette.bright.to_pixel();
        let dark_px = palette.dark.to_pixel();
        let grid_px = palette.grid.to_pixel();
        let edge_px = palette.edge.to_pixel();

        for (x, y, pixel) in frame.enumerate_pixels_mut() {
            *pixel = if edge_mask.get(x, y) {
                edge_px
            } else if draw_grid && grid.covers(x, y) {
                grid_px
            } else if bright.get(x, y) {
                bright_px
            } else {
                dark_px
            };
        }

        draw_border(frame, palette);
    }
}

/// ITU-R BT.601 luma in 14-bit fixed point, rounded.
pub fn luminance(pixel: &image::Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    ((r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + (1 << 13)) >> 14) as u8
}

pub fn binarize(frame: &RgbImage) -> Mask {
    Mask::from_fn(frame.width(), frame.height(), |x, y| {
        luminance(frame.get_pixel(x, y)) >= BINARY_THRESHOLD
    })
}

/// Scrolling grid: horizontal lines every `width / 10` rows, vertical lines every
/// `height / 8` columns shifted by the time-derived phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub row_spacing: u32,
    pub col_spacing: u32,
    pub phase: u32,
}

impl GridLayout {
    pub fn new(width: u32, height: u32, time_offset_secs: f64) -> Self {
        let row_spacing = (width / 10).max(1);
        let col_spacing = (height / 8).max(1);
        Self {
            row_spacing,
            col_spacing,
            phase: grid_phase(time_offset_secs, col_spacing),
        }
    }

    pub fn covers(&self, x: u32, y: u32) -> bool {
        y % self.row_spacing == 0 || (x + self.phase) % self.col_spacing == 0
    }
}

pub fn grid_phase(time_offset_secs: f64, col_spacing: u32) -> u32 {
    let whole_secs = if time_offset_secs.is_finite() && time_offset_secs > 0.0 {
        time_offset_secs.floor() as u64
    } else {
        0
    };
    (whole_secs.wrapping_mul(GRID_SCROLL_PER_SECOND) % col_spacing.max(1) as u64) as u32
}

fn draw_border(frame: &mut RgbImage, palette: &Palette) {
    let (width, height) = frame.dimensions();
    let px = palette.frame.to_pixel();
    for x in 0..width {
        frame.put_pixel(x, 0, px);
        frame.put_pixel(x, height - 1, px);
    }
    for y in 0..height {
        frame.put_pixel(0, y, px);
        frame.put_pixel(width - 1, y, px);
    }
}
