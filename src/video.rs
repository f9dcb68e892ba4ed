use crate::log_info;
use anyhow::{Context, Result};
use image::RgbImage;
use serde::Deserialize;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

/// Sequential source of decoded frames.
pub trait FrameSource {
    fn fps(&self) -> f64;

    fn dimensions(&self) -> (u32, u32);

    /// The next decoded frame, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("no video file (flv, mp4, avi) in {0}")]
    NoVideo(PathBuf),
    #[error("'{0}' has no video stream")]
    NoVideoStream(PathBuf),
    #[error("invalid frame rate '{0}'")]
    BadFrameRate(String),
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: u32,
    height: u32,
    #[serde(default)]
    avg_frame_rate: String,
    #[serde(default)]
    r_frame_rate: String,
}

/// Parses ffprobe's `num/den` rational frame rate.
pub fn parse_frame_rate(rate: &str) -> Result<f64, MediaError> {
    let bad = || MediaError::BadFrameRate(rate.to_string());
    let fps = match rate.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().map_err(|_| bad())?;
            let den: f64 = den.trim().parse().map_err(|_| bad())?;
            if den == 0.0 {
                return Err(bad());
            }
            num / den
        }
        None => rate.trim().parse().map_err(|_| bad())?,
    };
    if !fps.is_finite() || fps <= 0.0 {
        return Err(bad());
    }
    Ok(fps)
}

fn parse_probe(json: &[u8], path: &Path) -> Result<(u32, u32, f64)> {
    let probe: ProbeOutput = serde_json::from_slice(json).context("Failed to parse ffprobe output")?;
    let stream = probe
        .streams
        .into_iter()
        .find(|s| s.width > 0 && s.height > 0)
        .ok_or_else(|| MediaError::NoVideoStream(path.to_path_buf()))?;

    let fps = parse_frame_rate(&stream.avg_frame_rate).or_else(|_| parse_frame_rate(&stream.r_frame_rate))?;
    Ok((stream.width, stream.height, fps))
}

/// Decodes through an external `ffmpeg` process emitting raw RGB24 frames on stdout.
pub struct FfmpegSource {
    child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
    fps: f64,
}

impl FfmpegSource {
    pub fn open(path: &Path) -> Result<Self> {
        let probe = Command::new("ffprobe")
            .args(["-v", "error", "-select_streams", "v:0", "-show_entries", "stream=width,height,avg_frame_rate,r_frame_rate", "-of", "json"])
            .arg(path)
            .stderr(Stdio::null())
            .output()
            .context("Failed to run ffprobe")?;
        if !probe.status.success() {
            anyhow::bail!("ffprobe exited with {} for {}", probe.status, path.display());
        }
        let (width, height, fps) = parse_probe(&probe.stdout, path)?;

        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .context("Failed to start ffmpeg decoder")?;
        let stdout = child.stdout.take().context("ffmpeg stdout unavailable")?;

        log_info!("Decoding {} ({}x{} @ {:.3} fps)", path.display(), width, height, fps);

        Ok(Self {
            child,
            stdout,
            width,
            height,
            fps,
        })
    }
}

impl FrameSource for FfmpegSource {
    fn fps(&self) -> f64 {
        self.fps
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        let mut buf = vec![0u8; self.width as usize * self.height as usize * 3];
        match self.stdout.read_exact(&mut buf) {
            Ok(()) => Ok(RgbImage::from_raw(self.width, self.height, buf)),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e).context("Failed to read decoded frame"),
        }
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
