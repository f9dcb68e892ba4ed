use crate::canvas::{self, Point};
use crate::metrics::Usage;
use crate::palette::{Palette, Rgb};
use crate::series::{IndicatorSeries, KLine};
use image::RgbImage;

const MAIN_PANE_RATIO: f64 = 0.7;
const SCALE_EPSILON: f64 = 1e-5;
const BAR_WIDTH: i32 = 5;
const BAR_SPACING: i32 = 2;
const MACD_BAR_WIDTH: i32 = 3;
const MACD_SPACING: i32 = 1;
const MA_THICKNESS: i32 = 2;
const HORIZONTAL_DIVISIONS: i32 = 5;
const VERTICAL_DIVISIONS: i32 = 10;
const READOUT_X: i32 = 10;
const READOUT_LINES: [i32; 2] = [10, 30];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartStyle {
    pub background: Rgb,
    pub grid: Rgb,
    pub wick: Rgb,
    pub rising: Rgb,
    pub falling: Rgb,
    pub ma5: Rgb,
    pub ma10: Rgb,
    pub readout: Rgb,
}

impl ChartStyle {
    pub fn from_palette(palette: &Palette) -> Self {
        Self {
            background: palette.bright,
            grid: palette.grid,
            ..Self::default()
        }
    }
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            background: Rgb(25, 25, 25),
            grid: Rgb(50, 50, 50),
            wick: Rgb(200, 200, 200),
            rising: Rgb(200, 0, 0),
            falling: Rgb(0, 200, 0),
            ma5: Rgb(255, 255, 0),
            ma10: Rgb(255, 0, 255),
            readout: Rgb(200, 200, 200),
        }
    }
}

/// Vertical mapping from values to rows inside one pane.
#[derive(Debug, Clone, Copy)]
struct Scale {
    top: i32,
    height: i32,
    min: f64,
    per_unit: f64,
}

impl Scale {
    fn fit(top: i32, height: i32, min: f64, max: f64) -> Self {
        Self {
            top,
            height,
            min,
            per_unit: height as f64 / (max - min + SCALE_EPSILON),
        }
    }

    fn y(&self, value: f64) -> i32 {
        self.top + (self.height as f64 - (value - self.min) * self.per_unit) as i32
    }
}

/// Right-aligned x of the `i`-th of `len` items, one `step` apart.
fn slot_x(width: i32, len: usize, i: usize, step: i32) -> i32 {
    width - ((len - i) as i32) * step
}

/// How many of `len` items of `step` pixels fit on screen, counting a partly visible one.
fn visible_count(width: i32, len: usize, step: i32) -> usize {
    let fit = ((width + step - 1) / step).max(0) as usize;
    len.min(fit)
}

#[derive(Debug, Clone, Default)]
pub struct ChartRenderer {
    style: ChartStyle,
}

impl ChartRenderer {
    pub fn new(style: ChartStyle) -> Self {
        Self { style }
    }

    /// Draws the chart, then the latest counter readings in the top-left corner.
    pub fn render(&self, canvas: &mut RgbImage, klines: &[KLine], indicators: &IndicatorSeries, readout: Option<&Usage>) {
        let width = canvas.width() as i32;
        let height = canvas.height() as i32;
        let main_height = (height as f64 * MAIN_PANE_RATIO) as i32;
        let sub_height = height - main_height;

        canvas::fill(canvas, self.style.background);

        self.draw_candles(canvas, klines, indicators, width, main_height);
        self.draw_macd(canvas, &indicators.macd, width, main_height, sub_height);
        self.draw_grid(canvas, width, height, main_height);

        if let Some(usage) = readout {
            self.draw_readout(canvas, usage);
        }
    }

    fn draw_readout(&self, canvas: &mut RgbImage, usage: &Usage) {
        let lines = [format!("CPU: {:.1}%", usage.cpu), format!("Memory: {:.1}%", usage.memory)];
        for (y, line) in READOUT_LINES.iter().zip(&lines) {
            canvas::text(canvas, READOUT_X, *y, line, self.style.readout, 1);
        }
    }

    fn draw_candles(&self, canvas: &mut RgbImage, klines: &[KLine], indicators: &IndicatorSeries, width: i32, main_height: i32) {
        if klines.is_empty() || main_height <= 0 {
            return;
        }

        let step = BAR_WIDTH + BAR_SPACING;
        let first_visible = klines.len() - visible_count(width, klines.len(), step);
        let visible = &klines[first_visible..];
        if visible.is_empty() {
            return;
        }
        let max = visible.iter().map(|k| k.high).fold(f64::MIN, f64::max);
        let min = visible.iter().map(|k| k.low).fold(f64::MAX, f64::min);
        let scale = Scale::fit(0, main_height, min, max);

        for (i, k) in klines.iter().enumerate().skip(first_visible) {
            let x = slot_x(width, klines.len(), i, step);
            let center = x + BAR_WIDTH / 2;

            canvas::line(
                canvas,
                Point::new(center, scale.y(k.high)),
                Point::new(center, scale.y(k.low)),
                self.style.wick,
                1,
            );

            let body_top = scale.y(k.close);
            let body_bottom = scale.y(k.open);
            let color = if k.is_rising() { self.style.rising } else { self.style.falling };
            canvas::fill_rect(
                canvas,
                x,
                body_top.min(body_bottom),
                BAR_WIDTH,
                (body_top - body_bottom).abs(),
                color,
            );
        }

        for (series, color) in [(&indicators.ma5, self.style.ma5), (&indicators.ma10, self.style.ma10)] {
            if series.is_empty() {
                continue;
            }
            let points: Vec<Point> = series
                .iter()
                .enumerate()
                .skip(series.len() - visible_count(width, series.len(), step))
                .map(|(i, v)| Point::new(slot_x(width, series.len(), i, step) + BAR_WIDTH / 2, scale.y(*v)))
                .collect();
            canvas::polyline(canvas, &points, color, MA_THICKNESS);
        }
    }

    fn draw_macd(&self, canvas: &mut RgbImage, macd: &[f64], width: i32, top: i32, sub_height: i32) {
        if macd.is_empty() || sub_height <= 0 {
            return;
        }

        let step = MACD_BAR_WIDTH + MACD_SPACING;
        let first_visible = macd.len() - visible_count(width, macd.len(), step);
        let visible = &macd[first_visible..];
        if visible.is_empty() {
            return;
        }
        let max = visible.iter().copied().fold(f64::MIN, f64::max);
        let min = visible.iter().copied().fold(f64::MAX, f64::min);
        let scale = Scale::fit(top, sub_height, min, max);
        let zero_y = scale.y(0.0).clamp(top, top + sub_height - 1);

        for (i, value) in macd.iter().enumerate().skip(first_visible) {
            let x = slot_x(width, macd.len(), i, step);
            let color = if *value > 0.0 { self.style.rising } else { self.style.falling };
            canvas::line(
                canvas,
                Point::new(x, scale.y(*value)),
                Point::new(x, zero_y),
                color,
                MACD_BAR_WIDTH,
            );
        }
    }

    fn draw_grid(&self, canvas: &mut RgbImage, width: i32, height: i32, main_height: i32) {
        for i in 0..=HORIZONTAL_DIVISIONS {
            let y = i * main_height / HORIZONTAL_DIVISIONS;
            canvas::line(canvas, Point::new(0, y), Point::new(width, y), self.style.grid, 1);
        }
        for i in 0..=VERTICAL_DIVISIONS {
            let x = i * width / VERTICAL_DIVISIONS;
            canvas::line(canvas, Point::new(x, 0), Point::new(x, height), self.style.grid, 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_count_includes_partial_slot() {
        assert_eq!(visible_count(70, 100, 7), 10);
        assert_eq!(visible_count(71, 100, 7), 11);
        assert_eq!(visible_count(70, 3, 7), 3);
    }

    #[test]
    fn scale_maps_extremes_to_pane_edges() {
        let scale = Scale::fit(100, 50, 10.0, 20.0);
        assert_eq!(scale.y(10.0), 150);
        assert_eq!(scale.y(20.0), 100);
    }

    #[test]
    fn flat_range_does_not_divide_by_zero() {
        let scale = Scale::fit(0, 70, 42.0, 42.0);
        assert_eq!(scale.y(42.0), 70);
    }
}
