use anyhow::Result;
use image::{Rgb, RgbImage};
use mirage::chart::{ChartRenderer, ChartStyle};
use mirage::edges::Hysteresis;
use mirage::metrics::{MetricSource, SampleError, Usage};
use mirage::overlay::OverlaySurface;
use mirage::palette::Palette;
use mirage::pacer::{MetricsPacer, VideoPacer};
use mirage::series::SeriesAggregator;
use mirage::stylizer::FrameStylizer;
use mirage::video::FrameSource;
use mirage::window::HostError;
use std::time::{Duration, Instant};

struct SolidFrames {
    remaining: u32,
    fps: f64,
}

impl FrameSource for SolidFrames {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn dimensions(&self) -> (u32, u32) {
        (32, 24)
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some(RgbImage::from_pixel(32, 24, Rgb([255, 255, 255]))))
    }
}

/// Host of fixed size that disappears after `alive_ticks` geometry reads.
struct RecordingSurface {
    size: (u32, u32),
    alive_ticks: usize,
    tracked: usize,
    presented: Vec<(u32, u32)>,
    /// Blits with these indices fail.
    failing: Vec<usize>,
    attempts: usize,
}

impl RecordingSurface {
    fn new(size: (u32, u32), alive_ticks: usize) -> Self {
        Self {
            size,
            alive_ticks,
            tracked: 0,
            presented: Vec::new(),
            failing: Vec::new(),
            attempts: 0,
        }
    }
}

impl OverlaySurface for RecordingSurface {
    fn track_host(&mut self) -> Result<(u32, u32), HostError> {
        if self.tracked >= self.alive_ticks {
            return Err(HostError::Lost("fake".to_string()));
        }
        self.tracked += 1;
        Ok(self.size)
    }

    fn present(&mut self, frame: &RgbImage) -> Result<()> {
        let attempt = self.attempts;
        self.attempts += 1;
        if self.failing.contains(&attempt) {
            anyhow::bail!("blit {} rejected", attempt);
        }
        self.presented.push(frame.dimensions());
        Ok(())
    }
}

#[test]
fn video_loop_presents_every_frame_resized_in_order() {
    let stylizer = FrameStylizer::new(Hysteresis::default());
    let pacer = VideoPacer::new(&stylizer, Palette::DARK, true);
    let mut source = SolidFrames { remaining: 5, fps: 200.0 };
    let mut surface = RecordingSurface::new((64, 48), usize::MAX);

    let mut indices = Vec::new();
    let summary = pacer
        .run(&mut source, &mut surface, |report| indices.push(report.index))
        .unwrap();

    assert_eq!(summary.frames, 5);
    assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    assert_eq!(surface.presented, vec![(64, 48); 5]);
}

#[test]
fn video_loop_tracks_wall_clock() {
    let stylizer = FrameStylizer::default();
    let pacer = VideoPacer::new(&stylizer, Palette::DARK, false);
    let mut source = SolidFrames { remaining: 4, fps: 50.0 };
    let mut surface = RecordingSurface::new((32, 24), usize::MAX);

    let started = Instant::now();
    pacer.run(&mut source, &mut surface, |_| {}).unwrap();

    // Four frames at 20 ms each stay on screen for at least 80 ms
    assert!(started.elapsed() >= Duration::from_millis(80));
}

#[test]
fn video_loop_stops_when_host_is_lost() {
    let stylizer = FrameStylizer::default();
    let pacer = VideoPacer::new(&stylizer, Palette::DARK, true);
    let mut source = SolidFrames { remaining: 10, fps: 1000.0 };
    let mut surface = RecordingSurface::new((32, 24), 3);

    let err = pacer.run(&mut source, &mut surface, |_| {}).unwrap_err();
    assert!(matches!(err.downcast_ref::<HostError>(), Some(HostError::Lost(_))));
    assert_eq!(surface.presented.len(), 3);
}

struct ScriptedCounters {
    readings: Vec<Result<Usage, SampleError>>,
}

impl MetricSource for ScriptedCounters {
    fn sample(&mut self) -> Result<Usage, SampleError> {
        if self.readings.is_empty() {
            return Ok(Usage { cpu: 1.0, memory: 1.0 });
        }
        self.readings.remove(0)
    }
}

#[test]
fn metrics_loop_renders_each_tick_and_skips_failed_reads() {
    let renderer = ChartRenderer::new(ChartStyle::default());
    let pacer = MetricsPacer::new(&renderer, Duration::ZERO);
    let mut counters = ScriptedCounters {
        readings: vec![
            Ok(Usage { cpu: 12.5, memory: 40.0 }),
            Err(SampleError::Unsupported),
            Ok(Usage { cpu: 30.0, memory: 41.0 }),
        ],
    };
    let mut aggregator = SeriesAggregator::new(Duration::from_secs(1));
    let mut surface = RecordingSurface::new((120, 80), 3);

    let mut ticks = Vec::new();
    let result = pacer.run(&mut counters, &mut aggregator, &mut surface, |tick| ticks.push(tick.usage));

    assert!(result.is_err());
    assert_eq!(surface.presented, vec![(120, 80); 3]);
    assert_eq!(ticks.len(), 3);
    assert!(ticks[1].is_none());
    assert_eq!(ticks[2].map(|u| u.cpu), Some(30.0));
    assert!(aggregator.open_bar().is_some());
}

#[test]
fn metrics_loop_survives_a_failed_blit() {
    let renderer = ChartRenderer::new(ChartStyle::default());
    let pacer = MetricsPacer::new(&renderer, Duration::ZERO);
    let mut counters = ScriptedCounters { readings: Vec::new() };
    let mut aggregator = SeriesAggregator::new(Duration::from_secs(1));
    let mut surface = RecordingSurface::new((80, 60), 4);
    surface.failing = vec![1];

    let mut ticks = 0;
    let err = pacer
        .run(&mut counters, &mut aggregator, &mut surface, |_| ticks += 1)
        .unwrap_err();

    assert!(matches!(err.downcast_ref::<HostError>(), Some(HostError::Lost(_))));
    assert_eq!(ticks, 4);
    assert_eq!(surface.attempts, 4);
    assert_eq!(surface.presented.len(), 3);
}

#[test]
fn video_loop_survives_a_failed_blit() {
    let stylizer = FrameStylizer::default();
    let pacer = VideoPacer::new(&stylizer, Palette::DARK, false);
    let mut source = SolidFrames { remaining: 3, fps: 1000.0 };
    let mut surface = RecordingSurface::new((32, 24), usize::MAX);
    surface.failing = vec![0];

    let summary = pacer.run(&mut source, &mut surface, |_| {}).unwrap();
    assert_eq!(summary.frames, 3);
    assert_eq!(surface.presented.len(), 2);
}
