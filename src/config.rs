use crate::palette::{Palette, ParseRgbError, Rgb};
use crate::{log_info, log_warn};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "config.cfg";

/// Effective configuration, built once per run and passed to each component.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub window_class_name: String,
    pub window_title: String,
    pub child_class_name: String,
    pub draw_grid: bool,
    pub palette: Palette,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_class_name: "TaskManagerWindow".to_string(),
            window_title: "任务管理器".to_string(),
            child_class_name: "CvChartWindow".to_string(),
            draw_grid: true,
            palette: Palette::DARK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("line is not valid UTF-8 ({0})")]
    NotUtf8(String),
    #[error("unknown config parameter: {0}")]
    UnknownKey(String),
    #[error("invalid colour for {key}: {source}")]
    InvalidColor {
        key: String,
        #[source]
        source: ParseRgbError,
    },
}

impl Settings {
    /// Reads `path` line by line on top of the defaults. A missing file keeps every default.
    pub fn load(path: &Path) -> Result<Self> {
        let mut settings = Self::default();

        if !path.exists() {
            log_info!("No config file at {}, using defaults", path.display());
            return Ok(settings);
        }

        let content = fs::read(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        settings.apply_bytes(&content);

        Ok(settings)
    }

    /// Applies every line of `content`; malformed lines are logged and skipped.
    pub fn apply_str(&mut self, content: &str) {
        self.apply_bytes(content.as_bytes());
    }

    /// Like [`Settings::apply_str`], but decodes each line on its own so that one line in
    /// a legacy code page does not discard the rest of the file.
    pub fn apply_bytes(&mut self, content: &[u8]) {
        let content = content.strip_prefix(b"\xEF\xBB\xBF".as_slice()).unwrap_or(content);
        for (number, raw) in content.split(|&b| b == b'\n').enumerate() {
            let line = match std::str::from_utf8(raw) {
                Ok(line) => line,
                Err(e) => {
                    log_warn!("config line {}: {}", number + 1, ConfigError::NotUtf8(e.to_string()));
                    continue;
                }
            };
            if let Err(e) = self.apply_line(line) {
                log_warn!("config line {}: {}", number + 1, e);
            }
        }
    }

    /// Applies one `key=value` line. Comments, blank lines and lines without `=` leave
    /// the settings untouched.
    pub fn apply_line(&mut self, line: &str) -> Result<(), ConfigError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        let Some((key, value)) = line.split_once('=') else {
            return Ok(());
        };
        let key = key.trim();
        let value = unquote(value.trim());

        match key {
            "WindowClassName" => self.window_class_name = value.to_string(),
            "WindowTitle" => self.window_title = value.to_string(),
            "ChildClassName" => self.child_class_name = value.to_string(),
            "DrawGrid" => self.draw_grid = value == "true",
            "ColorEdge" | "ColorDark" | "ColorBright" | "ColorGrid" | "ColorFrame" => {
                let color: Rgb = value.parse().map_err(|source| ConfigError::InvalidColor {
                    key: key.to_string(),
                    source,
                })?;
                let slot = match key {
                    "ColorEdge" => &mut self.palette.edge,
                    "ColorDark" => &mut self.palette.dark,
                    "ColorBright" => &mut self.palette.bright,
                    "ColorGrid" => &mut self.palette.grid,
                    _ => &mut self.palette.frame,
                };
                *slot = color;
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }

        Ok(())
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("<unserializable settings: {}>", e))
    }
}

fn unquote(value: &str) -> &str {
    if value.len() > 1 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_quotes_and_whitespace() {
        let mut settings = Settings::default();
        settings.apply_line("  WindowTitle =  \"Task Manager\" ").unwrap();
        assert_eq!(settings.window_title, "Task Manager");
    }

    #[test]
    fn lone_quote_is_kept() {
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote("\"\""), "");
    }

    #[test]
    fn value_may_contain_equals() {
        let mut settings = Settings::default();
        settings.apply_line("WindowTitle=a=b").unwrap();
        assert_eq!(settings.window_title, "a=b");
    }
}
