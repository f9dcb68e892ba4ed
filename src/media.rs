use crate::video::MediaError;
use crate::{log_info, log_warn};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

pub const VIDEO_EXTENSIONS: [&str; 3] = ["flv", "mp4", "avi"];
pub const AUDIO_FILE: &str = "audio.wav";

/// First file in `dir` (by name) with one of [`VIDEO_EXTENSIONS`].
pub fn find_video(dir: &Path) -> Result<PathBuf, MediaError> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|_| MediaError::NoVideo(dir.to_path_buf()))?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_video_extension(path))
        .collect();

    candidates.sort();
    candidates.into_iter().next().ok_or_else(|| MediaError::NoVideo(dir.to_path_buf()))
}

fn has_video_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Audio demuxed next to the video. Playback stops and the file is removed on drop.
/// A track without a file plays nothing.
pub struct AudioTrack {
    path: Option<PathBuf>,
    playing: bool,
}

impl AudioTrack {
    /// Runs `ffmpeg -i <video> <out> -y`. A video without an audio stream, or a failed
    /// extraction, yields a silent track and playback goes on without sound.
    pub fn extract(video: &Path, out: &Path) -> Self {
        log_info!("Splitting audio of {} into {}", video.display(), out.display());
        match run_extraction(video, out) {
            Ok(()) if out.is_file() => Self {
                path: Some(out.to_path_buf()),
                playing: false,
            },
            Ok(()) => {
                log_warn!("ffmpeg wrote no audio for {}, playing silently", video.display());
                Self::silent()
            }
            Err(e) => {
                log_warn!("Audio extraction failed, playing silently: {:#}", e);
                remove_quietly(out);
                Self::silent()
            }
        }
    }

    pub fn silent() -> Self {
        Self {
            path: None,
            playing: false,
        }
    }

    pub fn is_silent(&self) -> bool {
        self.path.is_none()
    }

    /// Starts asynchronous playback; the video loop continues immediately.
    #[cfg(windows)]
    pub fn play(&mut self) {
        use windows::{
            core::HSTRING,
            Win32::Media::Audio::{PlaySoundW, SND_ASYNC, SND_FILENAME},
        };

        let Some(path) = &self.path else {
            return;
        };
        let wide = HSTRING::from(path.as_os_str());
        self.playing = unsafe { PlaySoundW(&wide, None, SND_FILENAME | SND_ASYNC) }.as_bool();
        if !self.playing {
            log_warn!("Could not start playback of {}", path.display());
        }
    }

    #[cfg(not(windows))]
    pub fn play(&mut self) {
        if !self.is_silent() {
            log_warn!("Audio playback unavailable on this platform");
        }
    }

    fn stop(&mut self) {
        if !self.playing {
            return;
        }
        #[cfg(windows)]
        unsafe {
            use windows::{core::PCWSTR, Win32::Media::Audio::{PlaySoundW, SND_PURGE}};
            let _ = PlaySoundW(PCWSTR::null(), None, SND_PURGE);
        }
        self.playing = false;
    }
}

fn run_extraction(video: &Path, out: &Path) -> Result<()> {
    let status = Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(video)
        .arg(out)
        .arg("-y")
        .stdin(Stdio::null())
        .status()
        .context("Failed to run ffmpeg for audio extraction")?;
    if !status.success() {
        anyhow::bail!("ffmpeg exited with {} while extracting audio", status);
    }
    Ok(())
}

fn remove_quietly(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_file(path) {
            log_warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

impl Drop for AudioTrack {
    fn drop(&mut self) {
        self.stop();
        if let Some(path) = &self.path {
            remove_quietly(path);
        }
    }
}
