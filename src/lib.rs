pub mod logger;
pub mod config;
pub mod palette;
pub mod theme;
pub mod window;
pub mod edges;
pub mod stylizer;
pub mod canvas;
pub mod series;
pub mod metrics;
pub mod chart;
pub mod overlay;
pub mod video;
pub mod media;
pub mod elevation;
pub mod pacer;

pub use logger::*;
pub use config::{ConfigError, Settings};
pub use palette::{Palette, Rgb, Theme};
pub use window::{HostError, LocateError, WindowLocator, WindowRect, WindowSystem};
pub use stylizer::FrameStylizer;
pub use series::{IndicatorSeries, KLine, SeriesAggregator};
pub use metrics::{MetricSource, SampleError, Usage};
pub use chart::{ChartRenderer, ChartStyle};
pub use overlay::OverlaySurface;
pub use video::{FrameSource, MediaError};
pub use pacer::{MetricsPacer, VideoPacer};
