use crate::chart::ChartRenderer;
use crate::metrics::{MetricSource, Usage};
use crate::overlay::OverlaySurface;
use crate::palette::Palette;
use crate::series::SeriesAggregator;
use crate::stylizer::FrameStylizer;
use crate::video::FrameSource;
use crate::{log_info, log_warn};
use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use std::time::{Duration, Instant};

/// Metrics variant polling period.
pub const METRICS_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub index: u64,
    /// Source timestamp of the frame in seconds.
    pub presented_at: f64,
    pub width: u32,
    pub height: u32,
    pub cost: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub usage: Option<Usage>,
    pub bars: usize,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackSummary {
    pub frames: u64,
    pub elapsed: Duration,
}

pub fn frame_duration(fps: f64) -> Duration {
    if fps.is_finite() && fps > 0.0 {
        Duration::from_secs_f64(1.0 / fps)
    } else {
        Duration::ZERO
    }
}

/// When frame `index` is due, measured from the playback start.
pub fn presentation_deadline(start: Instant, index: u64, frame_time: Duration) -> Instant {
    start + frame_time.mul_f64(index as f64)
}

/// Sleeps once until `deadline`; returns immediately when it already passed.
fn wait_until(deadline: Instant) {
    let now = Instant::now();
    if deadline > now {
        spin_sleep::sleep(deadline - now);
    }
}

pub struct VideoPacer<'a> {
    stylizer: &'a FrameStylizer,
    palette: Palette,
    draw_grid: bool,
}

impl<'a> VideoPacer<'a> {
    pub fn new(stylizer: &'a FrameStylizer, palette: Palette, draw_grid: bool) -> Self {
        Self {
            stylizer,
            palette,
            draw_grid,
        }
    }

    /// Plays `source` into `overlay` until the source is exhausted. Frame `i` stays on
    /// screen until `i + 1` frame times have passed since the start.
    pub fn run<S, O, F>(&self, source: &mut S, overlay: &mut O, mut on_frame: F) -> Result<PlaybackSummary>
    where
        S: FrameSource,
        O: OverlaySurface,
        F: FnMut(&FrameReport),
    {
        let frame_time = frame_duration(source.fps());
        let start = Instant::now();
        let mut index: u64 = 0;

        while let Some(frame) = source.next_frame().context("Failed to decode frame")? {
            let begun = Instant::now();

            let (width, height) = overlay.track_host()?;
            let mut frame = fit(frame, width, height);
            self.stylizer
                .stylize(&mut frame, &self.palette, self.draw_grid, start.elapsed().as_secs_f64());

            if let Err(e) = overlay.present(&frame) {
                log_warn!("Frame {} not presented: {}", index, e);
            }

            on_frame(&FrameReport {
                index,
                presented_at: frame_time.mul_f64(index as f64).as_secs_f64(),
                width,
                height,
                cost: begun.elapsed(),
            });

            index += 1;
            wait_until(presentation_deadline(start, index, frame_time));
        }

        let summary = PlaybackSummary {
            frames: index,
            elapsed: start.elapsed(),
        };
        log_info!("Playback finished: {} frames in {:.2}s", summary.frames, summary.elapsed.as_secs_f64());
        Ok(summary)
    }
}

/// Nearest-neighbour resize to the overlay size.
fn fit(frame: RgbImage, width: u32, height: u32) -> RgbImage {
    if frame.dimensions() == (width, height) {
        frame
    } else {
        imageops::resize(&frame, width, height, FilterType::Nearest)
    }
}

pub struct MetricsPacer<'a> {
    renderer: &'a ChartRenderer,
    interval: Duration,
}

impl<'a> MetricsPacer<'a> {
    pub fn new(renderer: &'a ChartRenderer, interval: Duration) -> Self {
        Self { renderer, interval }
    }

    /// Samples, aggregates, renders and blits on a fixed interval. A failed counter read or
    /// blit only costs that tick; the loop returns when the host window is lost.
    pub fn run<M, O, F>(&self, sampler: &mut M, aggregator: &mut SeriesAggregator, overlay: &mut O, mut on_tick: F) -> Result<()>
    where
        M: MetricSource,
        O: OverlaySurface,
        F: FnMut(&TickReport),
    {
        let mut latest: Option<Usage> = None;
        loop {
            let (width, height) = overlay.track_host()?;

            let usage = match sampler.sample() {
                Ok(usage) => {
                    aggregator.ingest(usage.cpu, unix_seconds());
                    latest = Some(usage);
                    Some(usage)
                }
                Err(e) => {
                    log_warn!("Counter read skipped: {}", e);
                    None
                }
            };

            let mut canvas = RgbImage::new(width, height);
            self.renderer
                .render(&mut canvas, aggregator.klines(), aggregator.indicators(), latest.as_ref());
            if let Err(e) = overlay.present(&canvas) {
                log_warn!("Chart not presented: {}", e);
            }

            on_tick(&TickReport {
                usage,
                bars: aggregator.klines().len(),
                width,
                height,
            });

            std::thread::sleep(self.interval);
        }
    }
}

fn unix_seconds() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadlines_follow_frame_index() {
        let start = Instant::now();
        let ft = frame_duration(25.0);
        assert_eq!(presentation_deadline(start, 0, ft), start);
        assert_eq!(presentation_deadline(start, 50, ft) - start, Duration::from_secs(2));
    }

    #[test]
    fn invalid_fps_never_waits() {
        assert_eq!(frame_duration(0.0), Duration::ZERO);
        assert_eq!(frame_duration(f64::NAN), Duration::ZERO);
    }

    #[test]
    fn fit_keeps_matching_frames() {
        let frame = RgbImage::new(4, 3);
        assert_eq!(fit(frame, 4, 3).dimensions(), (4, 3));
        assert_eq!(fit(RgbImage::new(4, 3), 8, 6).dimensions(), (8, 6));
    }
}
