use std::collections::VecDeque;

/// Row-major boolean mask with the dimensions of the frame it was derived from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl Mask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![false; width as usize * height as usize],
        }
    }

    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self { width, height, data }
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        let idx = self.index(x, y);
        self.data[idx] = value;
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&v| v).count()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Hysteresis thresholds applied to the L1 gradient magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hysteresis {
    pub low: f32,
    pub high: f32,
}

impl Default for Hysteresis {
    fn default() -> Self {
        Self { low: 50.0, high: 150.0 }
    }
}

// tan(22.5°) and tan(67.5°)
const TAN_22_5: f32 = 0.414_213_57;
const TAN_67_5: f32 = 2.414_213_6;

/// Canny edges of a binary mask (set = 255, clear = 0) using 3x3 Sobel gradients.
pub fn detect_edges(mask: &Mask, thresholds: Hysteresis) -> Mask {
    let (w, h) = (mask.width as i64, mask.height as i64);
    let mut edges = Mask::new(mask.width, mask.height);
    if w == 0 || h == 0 {
        return edges;
    }

    let sample = |x: i64, y: i64| -> f32 {
        let x = x.clamp(0, w - 1) as u32;
        let y = y.clamp(0, h - 1) as u32;
        if mask.get(x, y) { 255.0 } else { 0.0 }
    };

    let len = (w * h) as usize;
    let mut gx = vec![0f32; len];
    let mut gy = vec![0f32; len];
    let mut mag = vec![0f32; len];

    for y in 0..h {
        for x in 0..w {
            let dx = (sample(x + 1, y - 1) + 2.0 * sample(x + 1, y) + sample(x + 1, y + 1))
                - (sample(x - 1, y - 1) + 2.0 * sample(x - 1, y) + sample(x - 1, y + 1));
            let dy = (sample(x - 1, y + 1) + 2.0 * sample(x, y + 1) + sample(x + 1, y + 1))
                - (sample(x - 1, y - 1) + 2.0 * sample(x, y - 1) + sample(x + 1, y - 1));
            let i = (y * w + x) as usize;
            gx[i] = dx;
            gy[i] = dy;
            mag[i] = dx.abs() + dy.abs();
        }
    }

    let mag_at = |x: i64, y: i64| -> f32 {
        if x < 0 || y < 0 || x >= w || y >= h {
            0.0
        } else {
            mag[(y * w + x) as usize]
        }
    };

    // Non-maximum suppression along the quantized gradient direction
    let mut strong: VecDeque<(i64, i64)> = VecDeque::new();
    let mut weak = vec![false; len];
    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) as usize;
            let m = mag[i];
            if m <= thresholds.low {
                continue;
            }

            let (ax, ay) = (gx[i].abs(), gy[i].abs());
            let is_peak = if ay < ax * TAN_22_5 {
                m > mag_at(x - 1, y) && m >= mag_at(x + 1, y)
            } else if ay > ax * TAN_67_5 {
                m > mag_at(x, y - 1) && m >= mag_at(x, y + 1)
            } else {
                let s = if (gx[i] < 0.0) != (gy[i] < 0.0) { -1 } else { 1 };
                m > mag_at(x - s, y - 1) && m > mag_at(x + s, y + 1)
            };

            if !is_peak {
                continue;
            }
            if m > thresholds.high {
                edges.set(x as u32, y as u32, true);
                strong.push_back((x, y));
            } else {
                weak[i] = true;
            }
        }
    }

    // Grow strong edges through 8-connected weak candidates
    while let Some((x, y)) = strong.pop_front() {
        for ny in (y - 1)..=(y + 1) {
            for nx in (x - 1)..=(x + 1) {
                if nx < 0 || ny < 0 || nx >= w || ny >= h {
                    continue;
                }
                let i = (ny * w + nx) as usize;
                if weak[i] {
                    weak[i] = false;
                    edges.set(nx as u32, ny as u32, true);
                    strong.push_back((nx, ny));
                }
            }
        }
    }

    edges
}

/// One pass of 3x3 rectangular dilation; pixels outside the mask are ignored.
pub fn dilate(mask: &Mask) -> Mask {
    let (w, h) = (mask.width, mask.height);
    Mask::from_fn(w, h, |x, y| {
        let x0 = x.saturating_sub(1);
        let y0 = y.saturating_sub(1);
        let x1 = (x + 1).min(w - 1);
        let y1 = (y + 1).min(h - 1);
        (y0..=y1).any(|ny| (x0..=x1).any(|nx| mask.get(nx, ny)))
    })
}
