use anyhow::Result;
use mirage::config::{Settings, DEFAULT_CONFIG_FILE};
use mirage::elevation::{self, Elevation};
use mirage::{log_error, log_info};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Play,
    Chart,
}

#[derive(Debug)]
struct Args {
    mode: Mode,
    config: PathBuf,
    stream_logs: bool,
    elevate: bool,
    /// Arguments forwarded to an elevated relaunch.
    raw: Vec<String>,
}

fn parse_args(raw: Vec<String>) -> Result<Args> {
    let mut args = Args {
        mode: Mode::Play,
        config: PathBuf::from(DEFAULT_CONFIG_FILE),
        stream_logs: false,
        elevate: true,
        raw: raw.clone(),
    };

    let mut iter = raw.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "play" => args.mode = Mode::Play,
            "chart" => args.mode = Mode::Chart,
            "--stream-logs" => args.stream_logs = true,
            "--no-elevate" => args.elevate = false,
            "--config" => match iter.next() {
                Some(path) => args.config = PathBuf::from(path),
                None => anyhow::bail!("--config requires a path"),
            },
            other => anyhow::bail!("Unknown argument '{}'\nusage: mirage [play|chart] [--config PATH] [--stream-logs] [--no-elevate]", other),
        }
    }

    Ok(args)
}

fn main() {
    let code = match run_app() {
        Ok(code) => code,
        Err(e) => {
            log_error!("Fatal: {:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    };
    let _ = mirage::logger::finalize_logs();
    std::process::exit(code);
}

fn run_app() -> Result<i32> {
    let args = parse_args(std::env::args().skip(1).collect())?;

    mirage::logger::init_logger(
        mirage::logger::default_log_dir(),
        "mirage",
        mirage::logger::DEFAULT_RETENTION,
        args.stream_logs,
    )?;

    log_info!("=== Mirage Starting ({:?}) ===", args.mode);
    if let Some(log_path) = mirage::logger::get_log_path() {
        log_info!("Log file: {}", log_path.display());
    }

    if args.elevate {
        let elevation = elevation::ensure_elevated(&args.raw);
        if let Some(code) = elevation.exit_code() {
            log_info!("Elevation outcome {:?}, exiting", elevation);
            return Ok(code);
        }
        if elevation == Elevation::Unavailable {
            log_info!("Continuing without administrator privileges");
        }
    }

    let settings = Settings::load(&args.config)?;
    log_info!("Settings: {}", settings.to_json());

    run_mode(args.mode, &settings)
}

#[cfg(windows)]
fn run_mode(mode: Mode, settings: &Settings) -> Result<i32> {
    use mirage::window::{Win32Windows, WindowLocator};

    let windows = Win32Windows;
    let locator = WindowLocator::new(&windows);
    let target = match locator
        .locate_host(&settings.window_title, &settings.window_class_name)
        .and_then(|host| locator.locate_embed_target(host, &settings.child_class_name))
    {
        Ok(target) => target,
        Err(e) => {
            log_error!("{}", e);
            notify_fatal(&e.to_string());
            return Ok(1);
        }
    };
    log_info!("Embedding into {:?}", target);

    let overlay = mirage::overlay::Win32Overlay::attach(windows, target)?;
    match mode {
        Mode::Play => play(settings, overlay),
        Mode::Chart => chart(settings, overlay),
    }
}

#[cfg(not(windows))]
fn run_mode(_mode: Mode, _settings: &Settings) -> Result<i32> {
    anyhow::bail!("Mirage needs a Windows host window to embed into")
}

#[cfg(windows)]
fn play(settings: &Settings, mut overlay: mirage::overlay::Win32Overlay) -> Result<i32> {
    use mirage::edges::Hysteresis;
    use mirage::media::{self, AudioTrack, AUDIO_FILE};
    use mirage::palette::Palette;
    use mirage::video::{FfmpegSource, FrameSource};
    use mirage::{FrameStylizer, VideoPacer};
    use std::io::Write;

    let theme = mirage::theme::probe_theme();
    let palette = Palette::for_theme(theme, &settings.palette);
    log_info!("Host theme {:?}", theme);

    let video = media::find_video(&std::env::current_dir()?)?;
    let mut source = FfmpegSource::open(&video)?;
    let (width, height) = source.dimensions();
    println!("{} input {}x{}@{}", video.display(), width, height, source.fps());

    let mut audio = AudioTrack::extract(&video, std::path::Path::new(AUDIO_FILE));
    if audio.is_silent() {
        log_info!("No audio track, playing video only");
    }
    audio.play();

    let stylizer = FrameStylizer::new(Hysteresis::default());
    let pacer = VideoPacer::new(&stylizer, palette, settings.draw_grid);
    let summary = pacer.run(&mut source, &mut overlay, |report| {
        print!(
            "\rframe {} t={:.3}s {}x{} {:.1}ms   ",
            report.index,
            report.presented_at,
            report.width,
            report.height,
            report.cost.as_secs_f64() * 1000.0
        );
        let _ = std::io::stdout().flush();
    })?;
    println!();

    log_info!("Played {} frames", summary.frames);
    Ok(0)
}

#[cfg(windows)]
fn chart(settings: &Settings, mut overlay: mirage::overlay::Win32Overlay) -> Result<i32> {
    use mirage::metrics::PdhSampler;
    use mirage::palette::Palette;
    use mirage::pacer::METRICS_INTERVAL;
    use mirage::{ChartRenderer, ChartStyle, MetricsPacer, SeriesAggregator};
    use std::io::Write;
    use std::time::Duration;

    let palette = Palette::for_theme(mirage::theme::probe_theme(), &settings.palette);
    let mut sampler = PdhSampler::open()?;
    let mut aggregator = SeriesAggregator::new(Duration::from_secs(1));
    let renderer = ChartRenderer::new(ChartStyle::from_palette(&palette));

    MetricsPacer::new(&renderer, METRICS_INTERVAL).run(&mut sampler, &mut aggregator, &mut overlay, |tick| {
        match tick.usage {
            Some(usage) => print!("\rCPU {:5.1}%  MEM {:5.1}%  bars {}   ", usage.cpu, usage.memory, tick.bars),
            None => print!("\rCPU   n/a   MEM   n/a   bars {}   ", tick.bars),
        }
        let _ = std::io::stdout().flush();
    })?;

    Ok(0)
}

#[cfg(windows)]
fn notify_fatal(message: &str) {
    use windows::{
        core::{w, HSTRING},
        Win32::UI::WindowsAndMessaging::{MessageBoxW, MB_ICONERROR, MB_OK},
    };

    unsafe {
        MessageBoxW(None, &HSTRING::from(message), w!("Mirage"), MB_OK | MB_ICONERROR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        parse_args(list.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn defaults_to_play() {
        let parsed = args(&[]).unwrap();
        assert_eq!(parsed.mode, Mode::Play);
        assert_eq!(parsed.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert!(parsed.elevate);
    }

    #[test]
    fn chart_with_flags() {
        let parsed = args(&["chart", "--config", "alt.cfg", "--no-elevate", "--stream-logs"]).unwrap();
        assert_eq!(parsed.mode, Mode::Chart);
        assert_eq!(parsed.config, PathBuf::from("alt.cfg"));
        assert!(!parsed.elevate);
        assert!(parsed.stream_logs);
    }

    #[test]
    fn rejects_unknown_and_dangling_flags() {
        assert!(args(&["--config"]).is_err());
        assert!(args(&["--verbose"]).is_err());
    }
}
