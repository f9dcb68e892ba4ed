use image::RgbImage;
use mirage::chart::{ChartRenderer, ChartStyle};
use mirage::metrics::Usage;
use mirage::palette::Palette;
use mirage::series::SeriesAggregator;
use std::time::{Duration, Instant};

fn rising_history(samples: usize) -> SeriesAggregator {
    let mut agg = SeriesAggregator::new(Duration::from_secs(1));
    for i in 0..samples {
        agg.ingest(i as f64 * 1.5, i as f64 * 0.5);
    }
    agg
}

#[test]
fn empty_history_draws_background_and_grid_only() {
    let style = ChartStyle::from_palette(&Palette::DARK);
    let renderer = ChartRenderer::new(style);
    let agg = SeriesAggregator::new(Duration::from_secs(1));
    let mut canvas = RgbImage::new(200, 100);
    renderer.render(&mut canvas, agg.klines(), agg.indicators(), None);

    let background = style.background.to_pixel();
    let grid = style.grid.to_pixel();
    assert!(canvas.pixels().all(|p| *p == background || *p == grid));
    assert_eq!(*canvas.get_pixel(0, 0), grid);
    assert_eq!(*canvas.get_pixel(5, 50), background);
}

#[test]
fn history_shows_candles_and_indicators() {
    let style = ChartStyle::default();
    let renderer = ChartRenderer::new(style);
    let agg = rising_history(80);
    assert!(agg.indicators().macd.len() > 5);

    let mut canvas = RgbImage::new(320, 200);
    renderer.render(&mut canvas, agg.klines(), agg.indicators(), None);

    for color in [style.rising, style.ma5, style.ma10, style.wick] {
        let px = color.to_pixel();
        assert!(canvas.pixels().any(|p| *p == px), "missing {:?}", color);
    }
}

#[test]
fn tiny_canvas_does_not_panic() {
    let renderer = ChartRenderer::new(ChartStyle::default());
    let agg = rising_history(80);
    for (w, h) in [(1, 1), (3, 2), (0, 0)] {
        let mut canvas = RgbImage::new(w, h);
        renderer.render(&mut canvas, agg.klines(), agg.indicators(), None);
    }
}

#[test]
fn flat_visible_range_after_varied_history_renders_quickly() {
    let mut agg = SeriesAggregator::new(Duration::from_secs(1));
    let mut t = 0.0;
    for i in 0..20 {
        agg.ingest(10.0 + (i * 37 % 80) as f64, t);
        t += 0.5;
    }
    // CPU pegged: the sampler clamps to exactly 100.0
    for _ in 0..101 {
        agg.ingest(100.0, t);
        t += 1.0;
    }

    let style = ChartStyle::default();
    let renderer = ChartRenderer::new(style);
    let mut canvas = RgbImage::new(700, 700);
    let started = Instant::now();
    renderer.render(&mut canvas, agg.klines(), agg.indicators(), None);

    assert!(started.elapsed() < Duration::from_secs(5), "render took {:?}", started.elapsed());
    assert!(canvas.pixels().any(|p| *p == style.rising.to_pixel() || *p == style.falling.to_pixel()));
}

#[test]
fn readout_is_drawn_top_left() {
    let style = ChartStyle::from_palette(&Palette::DARK);
    let renderer = ChartRenderer::new(style);
    let agg = SeriesAggregator::new(Duration::from_secs(1));
    let usage = Usage { cpu: 42.5, memory: 63.0 };

    let mut canvas = RgbImage::new(300, 200);
    renderer.render(&mut canvas, agg.klines(), agg.indicators(), Some(&usage));

    let readout = style.readout.to_pixel();
    let lit = |y0: u32, y1: u32| (10..160).flat_map(|x| (y0..y1).map(move |y| (x, y))).filter(|&(x, y)| *canvas.get_pixel(x, y) == readout).count();
    assert!(lit(10, 18) > 20, "CPU line missing");
    assert!(lit(30, 38) > 20, "Memory line missing");
    assert!(canvas.enumerate_pixels().filter(|(_, y, _)| *y >= 40).all(|(_, _, p)| *p != readout));
}
